use serde::Deserialize;

/// Access tokens live for six hours; not configurable.
pub const TOKEN_TTL_MINUTES: i64 = 6 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    pub max_attempts: u32,
    pub lock_duration_ms: i64,
}

/// Longest lock the service will impose (24 hours).
pub const MAX_LOCK_DURATION_MS: i64 = 24 * 60 * 60 * 1000;

impl LockoutConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_attempts == 0 {
            anyhow::bail!("LOCKOUT_MAX_ATTEMPTS must be at least 1");
        }
        if self.lock_duration_ms <= 0 || self.lock_duration_ms > MAX_LOCK_DURATION_MS {
            anyhow::bail!(
                "LOCKOUT_DURATION_MS must be in 1..={MAX_LOCK_DURATION_MS}, got {}",
                self.lock_duration_ms
            );
        }
        Ok(())
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            lock_duration_ms: 300_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    /// Argon2 time cost (iterations).
    pub cost: u32,
    pub memory_kib: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            cost: 10,
            memory_kib: argon2::Params::DEFAULT_M_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub lockout: LockoutConfig,
    pub password: PasswordConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "shipdesk".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "shipdesk-users".into()),
            ttl_minutes: TOKEN_TTL_MINUTES,
        };

        let defaults = LockoutConfig::default();
        let lockout = LockoutConfig {
            max_attempts: env_or("LOCKOUT_MAX_ATTEMPTS", defaults.max_attempts),
            lock_duration_ms: env_or("LOCKOUT_DURATION_MS", defaults.lock_duration_ms),
        };
        lockout.validate()?;

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            cost: env_or("PASSWORD_HASH_COST", defaults.cost),
            memory_kib: env_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib),
        };

        Ok(Self {
            database_url,
            jwt,
            lockout,
            password,
        })
    }
}
