/// Authentication middleware
///
/// Protected routes are wrapped by [`require_auth`], which accepts the
/// access token from either the `Authorization: Bearer` header or the
/// `access_token` http-only cookie (the browser frontend uses the cookie,
/// API clients the header). On success the full user row is loaded and
/// injected into request extensions as [`CurrentUser`], so handlers get
/// the actor's current role without a second lookup.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use taskdeck_shared::auth::{jwt, policy::Actor};
use taskdeck_shared::models::user::User;

use crate::{app::AppState, cookies, error::ApiError};

/// The authenticated user, available to handlers via `Extension`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// The policy actor for this user
    pub fn actor(&self) -> Actor {
        Actor::from(&self.0)
    }
}

/// Extracts a bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Middleware guarding authenticated routes
///
/// Rejects with 401 when no credential is present, the token is invalid or
/// expired, or the token's subject no longer exists.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .or_else(|| cookies::cookie_value(req.headers(), cookies::ACCESS_COOKIE))
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Unauthorized("Missing credentials".to_string()))?;

    let claims = jwt::validate_access_token(&token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwdw==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
