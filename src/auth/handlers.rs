use axum::{
    extract::{FromRef, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::dto::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, ProfileResponse,
    RegisterRequest, ResetPasswordRequest,
};
use crate::auth::extractors::{AuthSession, SESSION_COOKIE};
use crate::auth::jwt::JwtKeys;
use crate::auth::services;
use crate::error::AuthError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify/:token", get(verify))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/:token", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(profile))
}

fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age={max_age_secs}"
    )
}

fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0")
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    services::register_user(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("User registered successfully")),
    ))
}

#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AuthError> {
    services::verify_email(&state, &token).await?;
    Ok(Json(MessageResponse::ok("User verified successfully")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AuthError> {
    let (token, user) = services::authenticate(&state, payload).await?;

    let keys = JwtKeys::from_ref(&state);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(&token, keys.session_ttl.as_secs())
            .parse()
            .unwrap(),
    );

    Ok((
        headers,
        Json(AuthResponse {
            token,
            user,
            success: true,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<ProfileResponse>, AuthError> {
    let user = services::profile(&state, session.user_id).await?;
    Ok(Json(ProfileResponse {
        user,
        success: true,
    }))
}

/// Advisory logout: the credential stays valid until it expires, the client
/// is just told to discard it.
#[instrument(skip_all)]
pub async fn logout(_session: AuthSession) -> Result<(HeaderMap, Json<MessageResponse>), AuthError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, clear_session_cookie().parse().unwrap());
    Ok((headers, Json(MessageResponse::ok("Logged out successfully"))))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    services::request_password_reset(&state, &payload.email).await?;
    Ok(Json(MessageResponse::ok(
        "If that account exists, a reset link has been sent",
    )))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    services::reset_password(&state, &token, &payload.password).await?;
    Ok(Json(MessageResponse::ok("Password reset successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes_match_ttl() {
        let cookie = session_cookie("tok.en.value", 86400);
        assert!(cookie.starts_with("session=tok.en.value;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie();
        assert!(cookie.starts_with("session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
    }
}
