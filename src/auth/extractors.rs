use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::Role;
use crate::error::AuthError;

/// Name of the cookie carrying the session credential.
pub const SESSION_COOKIE: &str = "session";

/// Resolved identity of the caller, attached by the session guard before a
/// protected handler runs.
#[derive(Debug)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub role: Role,
}

/// Pull the raw credential from `Authorization: Bearer` or, failing that,
/// the session cookie.
pub(crate) fn credential_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        {
            return Some(token.to_string());
        }
    }
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
                .map(str::to_string)
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = credential_from_headers(&parts.headers).ok_or(AuthError::Unauthenticated)?;

        // Every failure mode collapses to one rejection; callers learn nothing
        // about which check failed.
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired session credential");
            AuthError::Unauthenticated
        })?;

        Ok(AuthSession {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::Request;

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, value.parse().unwrap());
        headers
    }

    #[test]
    fn bearer_header_wins() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer abc.def.ghi");
        assert_eq!(
            credential_from_headers(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn session_cookie_is_accepted() {
        let headers = headers_with(header::COOKIE, "theme=dark; session=abc.def.ghi; lang=en");
        assert_eq!(
            credential_from_headers(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn unrelated_cookie_is_ignored() {
        let headers = headers_with(header::COOKIE, "sessionish=nope; theme=dark");
        assert_eq!(credential_from_headers(&headers), None);
    }

    #[test]
    fn missing_carrier_yields_none() {
        assert_eq!(credential_from_headers(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn resolves_identity_from_signed_credential() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user_id = Uuid::new_v4();
        let token = keys.sign_session(user_id, Role::Admin).expect("sign");

        let request = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let session = AuthSession::from_request_parts(&mut parts, &state)
            .await
            .expect("guard should resolve");
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.role, Role::Admin);
    }

    #[tokio::test]
    async fn rejects_missing_and_garbage_credentials() {
        let state = AppState::fake();

        let request = Request::builder().uri("/me").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(AuthSession::from_request_parts(&mut parts, &state)
            .await
            .is_err());

        let request = Request::builder()
            .uri("/me")
            .header(header::AUTHORIZATION, "Bearer garbage")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(AuthSession::from_request_parts(&mut parts, &state)
            .await
            .is_err());
    }
}
