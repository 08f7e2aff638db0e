//! HTTP routing: handlers and shared extractors.

pub mod change_password;
pub mod create;
pub mod login;
pub mod logout;
pub mod payment;
pub mod refresh_token;
pub mod status;
pub mod users;

use axum::Json;
use axum::extract::{FromRequest, Request};
use axum::http::header::{self, HeaderName};
use axum::response::AppendHeaders;
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::ServerError;
use crate::middleware::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::token::TokenPair;

const COOKIE_FLAGS: &str = "HttpOnly; Secure; SameSite=Strict; Path=/";

/// Json extractor that runs `validator` checks before the handler.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Body-less acknowledgment payload.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub(crate) fn validate_username(
    username: &str,
) -> Result<(), ValidationError> {
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::new("invalid_username"));
    }

    Ok(())
}

type CookieHeaders = AppendHeaders<[(HeaderName, String); 2]>;

/// `Set-Cookie` pair carrying both tokens.
///
/// HTTP-only and secure-flagged: client script never reads them.
pub(crate) fn token_cookies(
    pair: &TokenPair,
    access_ttl: u64,
    refresh_ttl: u64,
) -> CookieHeaders {
    AppendHeaders([
        (
            header::SET_COOKIE,
            format!(
                "{ACCESS_COOKIE}={}; Max-Age={access_ttl}; {COOKIE_FLAGS}",
                pair.access_token
            ),
        ),
        (
            header::SET_COOKIE,
            format!(
                "{REFRESH_COOKIE}={}; Max-Age={refresh_ttl}; {COOKIE_FLAGS}",
                pair.refresh_token
            ),
        ),
    ])
}

/// `Set-Cookie` pair expiring both token cookies.
pub(crate) fn clear_token_cookies() -> CookieHeaders {
    AppendHeaders([
        (
            header::SET_COOKIE,
            format!("{ACCESS_COOKIE}=; Max-Age=0; {COOKIE_FLAGS}"),
        ),
        (
            header::SET_COOKIE,
            format!("{REFRESH_COOKIE}=; Max-Age=0; {COOKIE_FLAGS}"),
        ),
    ])
}
