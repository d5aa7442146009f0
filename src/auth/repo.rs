use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{EmailVerification, NewUser, ProfileChanges, User, VerifyOutcome};

/// Persistence boundary for users and their verification codes.
/// Emails are expected already normalized.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Creates an unverified user with its code. `None` if the email is taken.
    async fn create_unverified(&self, new: &NewUser) -> anyhow::Result<Option<User>>;

    /// Consumes a matching, unexpired code and marks the user verified.
    async fn consume_verification(
        &self,
        email: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<VerifyOutcome>;

    /// Overwrites the fields present in `changes`.
    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> anyhow::Result<Option<User>>;
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, location, bio, avatar_url, email_verified, created_at";

impl EmailVerification {
    pub fn matches(&self, code: &str, now: OffsetDateTime) -> bool {
        self.code == code.trim() && now < self.expires_at
    }
}

#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .context("find user by email")
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")
    }

    async fn create_unverified(&self, new: &NewUser) -> anyhow::Result<Option<User>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let sql = format!(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        );
        let Some(user) = sqlx::query_as::<_, User>(&sql)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.name)
            .fetch_optional(&mut *tx)
            .await
            .context("insert user")?
        else {
            return Ok(None);
        };

        sqlx::query(
            r#"
            INSERT INTO email_verifications (email, code, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&user.email)
        .bind(&new.code)
        .bind(new.code_expires_at)
        .execute(&mut *tx)
        .await
        .context("insert verification code")?;

        tx.commit().await.context("commit tx")?;
        Ok(Some(user))
    }

    async fn consume_verification(
        &self,
        email: &str,
        code: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<VerifyOutcome> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let pending = sqlx::query_as::<_, EmailVerification>(
            "SELECT email, code, expires_at FROM email_verifications WHERE email = $1 FOR UPDATE",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await
        .context("load verification code")?;

        let Some(pending) = pending else {
            drop(tx);
            return Ok(match self.find_by_email(email).await? {
                Some(_) => VerifyOutcome::InvalidCode,
                None => VerifyOutcome::UnknownUser,
            });
        };
        if !pending.matches(code, now) {
            return Ok(VerifyOutcome::InvalidCode);
        }

        sqlx::query("DELETE FROM email_verifications WHERE email = $1")
            .bind(&pending.email)
            .execute(&mut *tx)
            .await
            .context("delete verification code")?;
        sqlx::query("UPDATE users SET email_verified = TRUE WHERE email = $1 AND NOT email_verified")
            .bind(&pending.email)
            .execute(&mut *tx)
            .await
            .context("mark email verified")?;

        tx.commit().await.context("commit tx")?;
        Ok(VerifyOutcome::Verified)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   location = COALESCE($3, location),
                   bio = COALESCE($4, bio),
                   avatar_url = COALESCE($5, avatar_url)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.location)
            .bind(&changes.bio)
            .bind(&changes.avatar_url)
            .fetch_optional(&self.db)
            .await
            .context("update profile")
    }
}

#[cfg(test)]
pub use memory::MemoryAccountStore;
