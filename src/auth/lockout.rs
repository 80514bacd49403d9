//! Failed-login lockout.
//!
//! An account that accumulates `max_attempts` consecutive failures is locked
//! until `lock_until`. The lock is not cleared by a background job; the next
//! attempt after expiry resets the counter before the password is checked.

use time::{Duration, OffsetDateTime};

use crate::auth::repo_types::Account;
use crate::config::LockoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::from(&LockoutConfig::default())
    }
}

impl From<&LockoutConfig> for LockoutPolicy {
    fn from(cfg: &LockoutConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            lock_duration: Duration::milliseconds(cfg.lock_duration_ms),
        }
    }
}

/// True iff the account has a lock that has not yet expired.
pub fn is_locked(account: &Account, now: OffsetDateTime) -> bool {
    matches!(account.lock_until, Some(until) if until > now)
}

/// Resets an expired lock. Returns `true` if anything was reset.
pub fn clear_stale_lock(account: &mut Account, now: OffsetDateTime) -> bool {
    match account.lock_until {
        Some(until) if until <= now => {
            account.failed_login_attempts = 0;
            account.lock_until = None;
            true
        }
        _ => false,
    }
}

impl LockoutPolicy {
    pub fn record_success(&self, account: &mut Account) {
        account.failed_login_attempts = 0;
        account.lock_until = None;
    }

    /// Counts one failure. Returns `Ok(true)` if this failure locked the account.
    pub fn record_failure(&self, account: &mut Account, now: OffsetDateTime) -> anyhow::Result<bool> {
        account.failed_login_attempts = account.failed_login_attempts.saturating_add(1);
        if account.failed_login_attempts as i64 >= self.max_attempts as i64 {
            let until = now
                .checked_add(self.lock_duration)
                .ok_or_else(|| anyhow::anyhow!("lock_until out of range"))?;
            account.lock_until = Some(until);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
pub(crate) fn account_fixture() -> Account {
    let now = OffsetDateTime::now_utc();
    Account {
        id: uuid::Uuid::new_v4(),
        email: "user@x.com".into(),
        password_hash: String::new(),
        name: "User".into(),
        failed_login_attempts: 0,
        lock_until: None,
        created_at: now,
        updated_at: now,
    }
}
