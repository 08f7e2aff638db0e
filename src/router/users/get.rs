//! Read user profiles.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::user::User;
use crate::{AppState, ServerError};

/// Handler returning the authenticated account.
pub async fn me(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// Handler returning a public profile by username.
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ServerError> {
    let user = state
        .store
        .find_by_username(&username)
        .await?
        .ok_or(ServerError::NotFound)?;

    Ok(Json(user))
}

#[cfg(test)]
pub(super) mod tests {
    use crate::*;
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;

    const PASSWORD: &str = "correct-horse-battery";

    #[tokio::test]
    async fn test_get_me_with_valid_token() {
        let (state, store) = testutil::test_state();
        testutil::seed_user(&store, "alice", "alice@example.com", PASSWORD)
            .await;
        let (_, pair) = state.session.login("alice", PASSWORD).await.unwrap();
        let app = app(state);

        let response = make_request(
            app,
            Method::GET,
            "/users/@me",
            String::default(),
            Some(&pair.access_token),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["username"], "alice");
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn test_public_profile() {
        let (state, store) = testutil::test_state();
        testutil::seed_user(&store, "alice", "alice@example.com", PASSWORD)
            .await;
        let app = app(state);

        let response = make_request(
            app.clone(),
            Method::GET,
            "/users/alice",
            String::default(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_request(
            app,
            Method::GET,
            "/users/nobody",
            String::default(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
