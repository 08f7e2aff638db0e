//! Password replacement for an authenticated account.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::mail::Template::PasswordChanged;
use crate::router::{Message, Valid};
use crate::user::User;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    old_password: String,
    #[validate(length(
        min = 8,
        max = 255,
        message = "Password must contain at least 8 characters."
    ))]
    new_password: String,
    confirm_password: String,
}

/// Handler to change the current account password.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Valid(body): Valid<Body>,
) -> Result<Json<Message>> {
    state
        .session
        .change_password(
            &user,
            &body.old_password,
            &body.new_password,
            &body.confirm_password,
        )
        .await?;

    state.mail.publish_event(PasswordChanged, &user, None).await?;

    Ok(Json(Message {
        message: "password changed",
    }))
}
