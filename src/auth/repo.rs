use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

pub use super::repo_types::{Role, User};

impl User {
    /// Find a user by email (exact match, case-sensitive as stored).
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, role, is_verified,
                   verification_token, reset_password_token, reset_password_expires, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, role, is_verified,
                   verification_token, reset_password_token, reset_password_expires, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Create a new, unverified user with a hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password_hash, role, is_verified,
                      verification_token, reset_password_token, reset_password_expires, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    pub async fn set_verification_token(db: &PgPool, id: Uuid, token: &str) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET verification_token = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Mark the matching user verified and clear the token in one statement,
    /// so the token can never be replayed. Returns the user id on a match.
    pub async fn consume_verification_token(
        db: &PgPool,
        token: &str,
    ) -> sqlx::Result<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_token = NULL
            WHERE verification_token = $1
            RETURNING id
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    /// Set (or overwrite a stale) reset token together with its expiry.
    pub async fn set_reset_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_password_token = $2, reset_password_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Replace the password hash and clear both reset fields in one statement,
    /// requiring the token to be live. Returns the user id on a match.
    pub async fn consume_reset_token(
        db: &PgPool,
        token: &str,
        new_password_hash: &str,
    ) -> sqlx::Result<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET password_hash = $2, reset_password_token = NULL, reset_password_expires = NULL
            WHERE reset_password_token = $1 AND reset_password_expires > now()
            RETURNING id
            "#,
        )
        .bind(token)
        .bind(new_password_hash)
        .fetch_optional(db)
        .await
    }
}
