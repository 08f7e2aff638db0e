//! Request authorization gate.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::user::User;
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";

/// Cookie carrying the access token.
pub(crate) const ACCESS_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub(crate) const REFRESH_COOKIE: &str = "refreshToken";

/// Pull a named cookie value out of the `Cookie` header.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        pair.trim()
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::to_owned)
    })
}

/// Token from the `Authorization` header, with or without the `Bearer`
/// prefix.
pub(crate) fn bearer_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(|header| header.strip_prefix(BEARER).unwrap_or(header).to_owned())
}

/// Authorization gate for protected routes.
///
/// One signature check and one store lookup per request, nothing cached:
/// a password change or account deletion locks out the very next request.
/// The resolved sanitized account lands in the request extensions.
pub async fn authorize(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    // Cookie takes precedence over the Authorization header.
    let token = cookie_value(req.headers(), ACCESS_COOKIE)
        .or_else(|| bearer_value(req.headers()))
        .ok_or(ServerError::Unauthorized)?;

    let claims = state
        .token
        .decode_access(&token)
        .map_err(|_| ServerError::Unauthorized)?;

    let user = state
        .store
        .find_by_id(&claims.sub)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    req.extensions_mut().insert::<User>(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_cookie_value() {
        let headers =
            headers_with_cookie("theme=dark; accessToken=abc.def.ghi; x=1");
        assert_eq!(
            cookie_value(&headers, ACCESS_COOKIE),
            Some("abc.def.ghi".to_owned())
        );
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn test_cookie_name_is_not_a_prefix_match() {
        // `accessTokenOld` must not satisfy a lookup for `accessToken`.
        let headers = headers_with_cookie("accessTokenOld=stale");
        assert_eq!(cookie_value(&headers, ACCESS_COOKIE), None);
    }

    #[test]
    fn test_bearer_value() {
        let mut headers = HeaderMap::new();
        headers
            .insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_value(&headers), Some("abc.def.ghi".to_owned()));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_value(&headers), Some("abc.def.ghi".to_owned()));
    }
}
