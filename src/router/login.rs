//! Credential verification and session opening.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::User;

fn missing_identifier() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        "username",
        ValidationError::new("missing_identifier")
            .with_message("Either 'email' or 'username' is required.".into()),
    );
    errors
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    email: Option<String>,
    username: Option<String>,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Handler to login user.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<impl IntoResponse> {
    let Some(identifier) =
        body.email.as_deref().or(body.username.as_deref())
    else {
        return Err(missing_identifier().into());
    };

    let (user, pair) = state.session.login(identifier, &body.password).await?;

    let cookies = super::token_cookies(
        &pair,
        state.token.access_ttl(),
        state.token.refresh_ttl(),
    );

    Ok((
        cookies,
        Json(Response {
            user,
            expires_in: state.token.access_ttl(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }),
    ))
}
