//! Session closing.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::router::Message;
use crate::user::User;

/// Handler to logout user. Requires a prior gate pass.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse> {
    state.session.logout(&user).await?;

    Ok((
        super::clear_token_cookies(),
        Json(Message {
            message: "logged out",
        }),
    ))
}

#[cfg(test)]
pub(super) mod tests {
    use crate::*;
    use axum::http::{Method, StatusCode, header};
    use serde_json::json;

    const PASSWORD: &str = "correct-horse-battery";

    #[tokio::test]
    async fn test_logout_clears_cookies_and_stored_token() {
        let (state, store) = testutil::test_state();
        let seeded = testutil::seed_user(
            &store,
            "alice",
            "alice@example.com",
            PASSWORD,
        )
        .await;
        let app = app(state.clone());

        let (_, pair) =
            state.session.login("alice", PASSWORD).await.unwrap();
        assert!(store.stored_refresh_token(&seeded.id).await.is_some());

        let response = make_request(
            app.clone(),
            Method::POST,
            "/logout",
            String::default(),
            Some(&pair.access_token),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_owned())
            .collect();
        assert!(cookies.iter().any(|c| c.starts_with("accessToken=;")));
        assert!(cookies.iter().any(|c| c.starts_with("refreshToken=;")));
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));

        assert_eq!(store.stored_refresh_token(&seeded.id).await, None);

        // Idempotent: a second logout with a still-valid access token
        // reaches the same end state without an error.
        let response = make_request(
            app,
            Method::POST,
            "/logout",
            String::default(),
            Some(&pair.access_token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.stored_refresh_token(&seeded.id).await, None);
    }

    #[tokio::test]
    async fn test_logout_requires_authorization() {
        let (state, _) = testutil::test_state();
        let app = app(state);

        let response = make_request(
            app,
            Method::POST,
            "/logout",
            json!({}).to_string(),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
