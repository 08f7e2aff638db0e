//! Users-related HTTP API.

mod get;
mod media;
mod update;

use axum::routing::{get, patch};
use axum::{Router, middleware};

use crate::middleware::authorize;
use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    let me = Router::new()
        // `GET /users/@me` and `PATCH /users/@me`. Authorization required.
        .route("/@me", get(get::me).patch(update::handler))
        // Media uploads. Authorization required.
        .route("/@me/avatar", patch(media::avatar))
        .route("/@me/cover", patch(media::cover))
        .route_layer(middleware::from_fn_with_state(state, authorize));

    Router::new()
        // `GET /users/:USERNAME` is the public profile view.
        .route("/{username}", get(get::profile))
        .merge(me)
}
