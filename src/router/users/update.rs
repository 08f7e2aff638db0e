//! Update profile fields.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::router::Valid;
use crate::user::{ProfilePatch, User};
use crate::{AppState, ServerError};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(
        length(min = 2, max = 30),
        custom(
            function = "crate::router::validate_username",
            message = "Username must be alphanumeric."
        )
    )]
    username: Option<String>,
    #[validate(email(message = "Email must be formatted."))]
    email: Option<String>,
    #[validate(length(
        min = 1,
        max = 80,
        message = "Full name must be 1 to 80 characters long."
    ))]
    full_name: Option<String>,
}

/// Handler to update the authenticated account's profile.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<Body>,
) -> Result<Json<User>, ServerError> {
    let patch = ProfilePatch {
        username: body.username.map(|username| username.to_lowercase()),
        email: body.email.map(|email| email.to_lowercase()),
        full_name: body.full_name,
    };

    let user = state.store.update_profile(&user.id, &patch).await?;

    Ok(Json(user))
}
