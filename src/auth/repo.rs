use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn create(db: &PgPool, new: NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                first_name, last_name, patronymic, email, password_hash,
                phone_number, avatar, email_verification_code,
                email_verification_code_expires
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.patronymic)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.phone_number)
        .bind(new.avatar)
        .bind(new.verification_code)
        .bind(new.verification_code_expires)
        .fetch_one(db)
        .await
    }

    /// Overwrites any outstanding verification code.
    pub async fn set_verification_code(
        db: &PgPool,
        id: Uuid,
        code: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_verification_code = $2,
                email_verification_code_expires = $3,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Marks the email verified and clears the code pair in one write.
    pub async fn mark_email_verified(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_email_verified = TRUE,
                email_verification_code = NULL,
                email_verification_code_expires = NULL,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Overwrites any outstanding password reset code.
    pub async fn set_reset_code(
        db: &PgPool,
        id: Uuid,
        code: &str,
        expires: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_code = $2,
                password_reset_code_expires = $3,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(expires)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Stores a new hash and clears the reset pair (reset-password path).
    pub async fn reset_password(db: &PgPool, id: Uuid, password_hash: &str) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_code = NULL,
                password_reset_code_expires = NULL,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Stores a new hash without touching reset state (change-password path).
    pub async fn set_password(db: &PgPool, id: Uuid, password_hash: &str) -> sqlx::Result<()> {
        sqlx::query(
            r#"UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Changes the address and forces re-verification.
    pub async fn update_email(db: &PgPool, id: Uuid, email: &str) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2,
                is_email_verified = FALSE,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(db)
        .await
    }

    /// Paginated listing, optionally filtered to a single role tag.
    pub async fn list_by_role(
        db: &PgPool,
        role: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE $1::text IS NULL OR $1 = ANY(roles)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }

    pub async fn count_by_role(db: &PgPool, role: Option<&str>) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM users WHERE $1::text IS NULL OR $1 = ANY(roles)"#,
        )
        .bind(role)
        .fetch_one(db)
        .await
    }
}
