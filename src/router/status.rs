//! Instance status.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    name: String,
    version: String,
    url: String,
}

/// Handler returning instance identity.
pub async fn status(State(state): State<AppState>) -> Json<Response> {
    Json(Response {
        name: state.config.name.clone(),
        version: state.config.version().to_owned(),
        url: state.config.url.clone(),
    })
}
