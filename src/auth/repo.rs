use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{ActionToken, PermissionGrant, Role, User, UserSummary};

/// Shared projection: authentication always needs the role name alongside
/// the user row.
const USER_SELECT: &str = r#"
    SELECT u.id, u.email, u.password_hash, u.first_name, u.last_name, u.profile_image,
           u.is_email_verified, u.refresh_token, u.refresh_token_expires, u.role_id,
           r.name AS role_name, u.totp_enabled, u.totp_secret, u.totp_nonce,
           u.provider, u.is_super_admin, u.created_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.email = $1"))
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn create_local(
        db: &PgPool,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: Option<&str>,
        role_id: Uuid,
    ) -> sqlx::Result<User> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, role_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(role_id)
        .fetch_one(db)
        .await?;

        Self::find_by_id(db, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Social signups arrive with a provider-verified email, so the row is
    /// created already verified and without a password hash.
    pub async fn create_social(
        db: &PgPool,
        email: &str,
        first_name: &str,
        last_name: Option<&str>,
        profile_image: Option<&str>,
        provider: &str,
        role_id: Uuid,
    ) -> sqlx::Result<User> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO users (email, first_name, last_name, profile_image, provider,
                               is_email_verified, role_id)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(profile_image)
        .bind(provider)
        .bind(role_id)
        .fetch_one(db)
        .await?;

        Self::find_by_id(db, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn set_refresh_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"UPDATE users SET refresh_token = $2, refresh_token_expires = $3 WHERE id = $1"#,
        )
        .bind(id)
        .bind(token)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Compare-and-swap rotation: the old token is matched in the WHERE
    /// clause, so of two concurrent refreshes with the same stale token only
    /// one can win. Expired tokens never match.
    pub async fn rotate_refresh_token(
        db: &PgPool,
        old_token: &str,
        new_token: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<Option<Uuid>> {
        sqlx::query_scalar(
            r#"
            UPDATE users SET refresh_token = $2, refresh_token_expires = $3
            WHERE refresh_token = $1 AND refresh_token_expires > now()
            RETURNING id
            "#,
        )
        .bind(old_token)
        .bind(new_token)
        .bind(expires)
        .fetch_optional(db)
        .await
    }

    pub async fn mark_email_verified(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query(r#"UPDATE users SET is_email_verified = TRUE WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_password(db: &PgPool, id: Uuid, password_hash: &str) -> sqlx::Result<()> {
        sqlx::query(r#"UPDATE users SET password_hash = $2 WHERE id = $1"#)
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn set_totp(
        db: &PgPool,
        id: Uuid,
        secret_hex: &str,
        nonce_hex: &str,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET totp_enabled = TRUE, totp_secret = $2, totp_nonce = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(secret_hex)
        .bind(nonce_hex)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn clear_totp(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET totp_enabled = FALSE, totp_secret = NULL, totp_nonce = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn list(db: &PgPool) -> sqlx::Result<Vec<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, r.name AS role_name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            ORDER BY u.created_at
            "#,
        )
        .fetch_all(db)
        .await
    }
}

impl Role {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Role>> {
        sqlx::query_as::<_, Role>(r#"SELECT id, name FROM roles WHERE id = $1"#)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> sqlx::Result<Option<Role>> {
        sqlx::query_as::<_, Role>(r#"SELECT id, name FROM roles WHERE name = $1"#)
            .bind(name)
            .fetch_optional(db)
            .await
    }
}

impl PermissionGrant {
    pub async fn find_for_role(db: &PgPool, role_id: Uuid) -> sqlx::Result<Vec<PermissionGrant>> {
        sqlx::query_as::<_, PermissionGrant>(
            r#"
            SELECT p.name, p.route
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            "#,
        )
        .bind(role_id)
        .fetch_all(db)
        .await
    }
}

impl ActionToken {
    /// One live token per (user, purpose): reissuing replaces the previous
    /// token, which invalidates it.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        purpose: &str,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO action_tokens (user_id, purpose, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, purpose)
            DO UPDATE SET token_hash = $3, expires_at = $4, created_at = now()
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .bind(token_hash)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    pub async fn find_live(
        db: &PgPool,
        token_hash: &str,
        purpose: &str,
    ) -> sqlx::Result<Option<ActionToken>> {
        sqlx::query_as::<_, ActionToken>(
            r#"
            SELECT user_id, purpose, token_hash, expires_at
            FROM action_tokens
            WHERE token_hash = $1 AND purpose = $2 AND expires_at > now()
            "#,
        )
        .bind(token_hash)
        .bind(purpose)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, purpose: &str) -> sqlx::Result<()> {
        sqlx::query(r#"DELETE FROM action_tokens WHERE user_id = $1 AND purpose = $2"#)
            .bind(user_id)
            .bind(purpose)
            .execute(db)
            .await?;
        Ok(())
    }
}
