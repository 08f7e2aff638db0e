//! Get a new token pair with a refresh token.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::middleware::{REFRESH_COOKIE, bearer_value, cookie_value};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Handler to rotate a session's token pair.
pub async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    // The body is optional; an absent or unreadable one only means the
    // token must come from somewhere else.
    let body = serde_json::from_slice::<Body>(&body).unwrap_or_default();

    // Cookie first, then request body, then bearer header.
    let presented = cookie_value(&headers, REFRESH_COOKIE)
        .or(body.refresh_token)
        .or_else(|| bearer_value(&headers));

    let (_, pair) = state.session.refresh(presented.as_deref()).await?;

    let cookies = super::token_cookies(
        &pair,
        state.token.access_ttl(),
        state.token.refresh_ttl(),
    );

    Ok((
        cookies,
        Json(Response {
            expires_in: state.token.access_ttl(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }),
    ))
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::user::CredentialStore;
    use crate::*;
    use axum::http::{Method, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::util::ServiceExt;

    const PASSWORD: &str = "correct-horse-battery";

    async fn logged_in()
    -> (axum::Router, AppState, std::sync::Arc<testutil::MemoryCredentialStore>, token::TokenPair)
    {
        let (state, store) = testutil::test_state();
        testutil::seed_user(&store, "alice", "alice@example.com", PASSWORD)
            .await;
        let (_, pair) = state.session.login("alice", PASSWORD).await.unwrap();

        (app(state.clone()), state, store, pair)
    }

    #[tokio::test]
    async fn test_refresh_via_body_rotates_pair() {
        let (app, state, _, pair) = logged_in().await;

        let req_body = json!({ "refreshToken": pair.refresh_token });
        let response = make_request(
            app,
            Method::POST,
            "/refresh-token",
            req_body.to_string(),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_ne!(body.refresh_token, pair.refresh_token);
        assert_eq!(body.expires_in, state.token.access_ttl());

        let claims = state.token.decode_access(&body.access_token).unwrap();
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn test_refresh_via_cookie() {
        let (app, _, _, pair) = logged_in().await;

        let request = axum::extract::Request::builder()
            .method(Method::POST)
            .uri("/refresh-token")
            .header(
                header::COOKIE,
                format!("refreshToken={}", pair.refresh_token),
            )
            .body(axum::body::Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_owned())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
    }

    #[tokio::test]
    async fn test_rotated_out_token_is_unauthorized() {
        let (app, _, _, pair) = logged_in().await;

        let req_body = json!({ "refreshToken": pair.refresh_token });
        let response = make_request(
            app.clone(),
            Method::POST,
            "/refresh-token",
            req_body.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        // The superseded token was rotated out; it must never work again.
        let response = make_request(
            app,
            Method::POST,
            "/refresh-token",
            req_body.to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_mismatched_stored_value_is_unauthorized() {
        let (app, _, store, pair) = logged_in().await;

        // Subject exists, signature is valid, but the stored token differs.
        let claims =
            testutil::test_token_manager().decode_refresh(&pair.refresh_token);
        let subject = claims.unwrap().sub;
        store
            .set_refresh_token(&subject, Some("a-different-stored-string"))
            .await
            .unwrap();

        let req_body = json!({ "refreshToken": pair.refresh_token });
        let response = make_request(
            app,
            Method::POST,
            "/refresh-token",
            req_body.to_string(),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_unauthorized() {
        let (app, _, _, _) = logged_in().await;

        let response = make_request(
            app,
            Method::POST,
            "/refresh-token",
            json!({}).to_string(),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
