use async_trait::async_trait;

use crate::auth::repo_types::{Account, NewAccount};
use crate::db::PgStore;
use crate::error::StoreError;

/// Persistence for accounts.
///
/// `save` is a plain overwrite of the lockout fields; there is no
/// compare-and-swap, so two concurrent attempts on one account can race.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account by its normalized (lower-cased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Insert a new account. Fails with `StoreError::Duplicate` if the email is taken.
    async fn create(&self, new: NewAccount) -> Result<Account, StoreError>;

    /// Persist `failed_login_attempts` and `lock_until`.
    async fn save(&self, account: &Account) -> Result<Account, StoreError>;
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, name, failed_login_attempts, lock_until,
                   created_at, updated_at
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, name, failed_login_attempts, lock_until,
                      created_at, updated_at
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.name)
        .fetch_one(&self.db)
        .await?;
        Ok(account)
    }

    async fn save(&self, account: &Account) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE users
            SET failed_login_attempts = $2, lock_until = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, email, password_hash, name, failed_login_attempts, lock_until,
                      created_at, updated_at
            "#,
        )
        .bind(account.id)
        .bind(account.failed_login_attempts)
        .bind(account.lock_until)
        .fetch_one(&self.db)
        .await?;
        Ok(account)
    }
}
