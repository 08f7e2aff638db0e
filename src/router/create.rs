//! Account registration.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::Welcome;
use crate::router::Valid;
use crate::user::User;

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
    pub username: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(
        min = 1,
        max = 80,
        message = "Full name must be 1 to 80 characters long."
    ))]
    pub full_name: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    pub password: String,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<User>)> {
    let user = User::builder()
        .username(body.username)
        .email(body.email)
        .full_name(&body.full_name)
        .password(&body.password)
        .build();

    // Duplicate username or email surfaces as 409 from the store.
    let user = state.store.insert(&user).await?;

    state.mail.publish_event(Welcome, &user, None).await?;

    Ok((StatusCode::CREATED, Json(user)))
}
