use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::dto::{LoginRequest, PublicUser, RegisterRequest};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::auth::token::opaque_token;
use crate::error::AuthError;
use crate::mail;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Create an unverified account and dispatch the verification link.
///
/// No session is issued here; the caller must verify or log in separately.
pub async fn register_user(state: &AppState, payload: RegisterRequest) -> Result<(), AuthError> {
    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::Validation("All fields are required"));
    }
    if !is_valid_email(&payload.email) {
        return Err(AuthError::Validation("Invalid email"));
    }

    // Pre-check; the UNIQUE constraint on email closes the race below.
    if User::find_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        return Err(AuthError::Conflict);
    }

    let hash = hash_password(&payload.password)?;
    let user = match User::create(&state.db, &payload.name, &payload.email, &hash).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AuthError::Conflict)
        }
        Err(e) => return Err(AuthError::Dependency(e)),
    };

    // If this write fails the account exists without an outstanding token;
    // recoverable by a later re-verification request.
    let token = opaque_token();
    User::set_verification_token(&state.db, user.id, &token).await?;

    let body = mail::verification_body(&state.config.base_url, &token);
    mail::send_detached(
        state.mailer.clone(),
        user.email.clone(),
        "Verify your email",
        body,
    );

    info!(user_id = %user.id, "user registered");
    Ok(())
}

/// Consume a verification token: single-use, replay fails.
pub async fn verify_email(state: &AppState, token: &str) -> Result<(), AuthError> {
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    match User::consume_verification_token(&state.db, token).await? {
        Some(user_id) => {
            info!(user_id = %user_id, "email verified");
            Ok(())
        }
        None => Err(AuthError::InvalidToken),
    }
}

/// Check credentials and issue a session credential.
///
/// Unknown email and wrong password produce the same error.
pub async fn authenticate(
    state: &AppState,
    payload: LoginRequest,
) -> Result<(String, PublicUser), AuthError> {
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        debug!(user_id = %user.id, "login password mismatch");
        return Err(AuthError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign_session(user.id, user.role)?;

    info!(user_id = %user.id, "user logged in");
    Ok((
        token,
        PublicUser {
            id: user.id,
            name: user.name,
            role: user.role,
        },
    ))
}

pub async fn profile(state: &AppState, user_id: Uuid) -> Result<PublicUser, AuthError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;
    Ok(PublicUser {
        id: user.id,
        name: user.name,
        role: user.role,
    })
}

/// Start a password reset. The outcome is identical whether or not the email
/// matches an account.
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::Validation("Email is required"));
    }

    if let Some(user) = User::find_by_email(&state.db, email).await? {
        let token = opaque_token();
        let expires =
            OffsetDateTime::now_utc() + Duration::minutes(state.config.reset_ttl_minutes);
        User::set_reset_token(&state.db, user.id, &token, expires).await?;

        let body = mail::reset_body(
            &state.config.base_url,
            &token,
            state.config.reset_ttl_minutes,
        );
        mail::send_detached(
            state.mailer.clone(),
            user.email.clone(),
            "Password reset request",
            body,
        );
        info!(user_id = %user.id, "password reset requested");
    } else {
        debug!("password reset requested for unknown email");
    }
    Ok(())
}

/// Consume a live reset token and replace the password. Expired or already
/// consumed tokens fail the same way.
pub async fn reset_password(
    state: &AppState,
    token: &str,
    password: &str,
) -> Result<(), AuthError> {
    if token.is_empty() || password.is_empty() {
        return Err(AuthError::Validation("All fields are required"));
    }

    let hash = hash_password(password)?;
    match User::consume_reset_token(&state.db, token, &hash).await? {
        Some(user_id) => {
            info!(user_id = %user_id, "password reset");
            Ok(())
        }
        None => Err(AuthError::InvalidOrExpiredToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.org"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
    }
}
