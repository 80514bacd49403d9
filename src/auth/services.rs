use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::auth::{
    dto::{LoginRequest, SignupRequest},
    jwt::JwtKeys,
    lockout::{clear_stale_lock, is_locked, LockoutPolicy},
    password::{check_password_strength, is_valid_email, CredentialVerifier},
    repo::AccountStore,
    repo_types::{NewAccount, PublicUser},
};
use crate::error::{AppError, StoreError};

const INVALID_CREDENTIALS: &str = "Invalid credentials.";
const USER_EXISTS: &str = "User already exists.";

/// Signup and login over an account store.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    verifier: CredentialVerifier,
    lockout: LockoutPolicy,
    keys: JwtKeys,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        verifier: CredentialVerifier,
        lockout: LockoutPolicy,
        keys: JwtKeys,
    ) -> Self {
        Self {
            accounts,
            verifier,
            lockout,
            keys,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<PublicUser, AppError> {
        let email = normalize_email(&req.email);
        let name = req.name.trim().to_string();

        if email.is_empty() || req.password.is_empty() || name.is_empty() {
            return Err(AppError::Validation(
                "Email, password and name are required.".into(),
            ));
        }
        if !is_valid_email(&email) {
            warn!(email = %email, "signup invalid email");
            return Err(AppError::Validation("Provide a valid email address.".into()));
        }
        if let Err(reason) = check_password_strength(&req.password) {
            warn!(email = %email, "signup weak password");
            return Err(AppError::Validation(reason.into()));
        }

        if self.accounts.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict(USER_EXISTS.into()));
        }

        let password_hash = self.verifier.hash_blocking(req.password).await?;
        let account = match self
            .accounts
            .create(NewAccount {
                email,
                name,
                password_hash,
            })
            .await
        {
            Ok(a) => a,
            // lost a race with a concurrent signup for the same email
            Err(StoreError::Duplicate) => return Err(AppError::Conflict(USER_EXISTS.into())),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %account.id, email = %account.email, "user signed up");
        Ok(PublicUser::from(&account))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<String, AppError> {
        self.login_at(req, OffsetDateTime::now_utc()).await
    }

    /// Login evaluated at `now`. Check order: lock, stale-lock reset, password.
    pub async fn login_at(&self, req: LoginRequest, now: OffsetDateTime) -> Result<String, AppError> {
        let email = normalize_email(&req.email);
        if email.is_empty() || req.password.is_empty() {
            return Err(AppError::Validation("Email and password are required.".into()));
        }

        let Some(mut account) = self.accounts.find_by_email(&email).await? else {
            // unknown emails cost one verification, like a wrong password
            self.verifier.verify_dummy_blocking(req.password).await?;
            warn!(email = %email, "login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if is_locked(&account, now) {
            warn!(user_id = %account.id, "login attempt on locked account");
            return Err(AppError::Locked(
                "Account is locked. Try again later.".into(),
            ));
        }

        if clear_stale_lock(&mut account, now) {
            info!(user_id = %account.id, "expired lock cleared");
        }

        let ok = self
            .verifier
            .verify_blocking(req.password, account.password_hash.clone())
            .await?;

        if !ok {
            let locked_now = self.lockout.record_failure(&mut account, now)?;
            self.accounts.save(&account).await?;
            if locked_now {
                warn!(
                    user_id = %account.id,
                    attempts = account.failed_login_attempts,
                    "account locked after failed logins"
                );
                return Err(AppError::Locked(
                    "Account now locked due to too many failed login attempts.".into(),
                ));
            }
            warn!(
                user_id = %account.id,
                attempts = account.failed_login_attempts,
                "login invalid password"
            );
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        self.lockout.record_success(&mut account);
        self.accounts.save(&account).await?;

        let token = self.keys.sign_at(&PublicUser::from(&account), now)?;
        info!(user_id = %account.id, email = %account.email, "user logged in");
        Ok(token)
    }
}
