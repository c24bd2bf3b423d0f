use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    /// One year. Larger values overflow timestamp arithmetic.
    pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.secret.is_empty(), "JWT_SECRET must not be empty");
        anyhow::ensure!(self.ttl_minutes > 0, "JWT_TTL_MINUTES must be positive");
        anyhow::ensure!(
            self.ttl_minutes <= Self::MAX_TTL_MINUTES,
            "JWT_TTL_MINUTES must be at most {}",
            Self::MAX_TTL_MINUTES
        );
        Ok(())
    }
}

/// Argon2 work factor. Raising any of these only affects new hashes.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimum for Argon2id)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "cadastro".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "cadastro-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60)?,
        };
        jwt.validate()?;

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: env_or("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: env_or("ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: env_or("ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 3000)?,
            jwt,
            password,
        })
    }
}

/// Reads and parses an optional variable. A present but unparsable value is an error
/// rather than a silent fallback.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_when_unset() {
        let v: u32 = env_or("CADASTRO_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(v, 42);
    }

    fn jwt(ttl_minutes: i64) -> JwtConfig {
        JwtConfig {
            secret: "s".into(),
            issuer: "i".into(),
            audience: "a".into(),
            ttl_minutes,
        }
    }

    #[test]
    fn jwt_ttl_bounds() {
        assert!(jwt(60).validate().is_ok());
        assert!(jwt(JwtConfig::MAX_TTL_MINUTES).validate().is_ok());
        assert!(jwt(0).validate().is_err());
        assert!(jwt(JwtConfig::MAX_TTL_MINUTES + 1).validate().is_err());
        let err = jwt(i64::MAX / 2).validate().unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"));
    }

    #[test]
    fn env_or_rejects_garbage() {
        std::env::set_var("CADASTRO_TEST_BAD_PORT", "not-a-port");
        let err = env_or::<u16>("CADASTRO_TEST_BAD_PORT", 3000).unwrap_err();
        assert!(err.to_string().contains("CADASTRO_TEST_BAD_PORT"));
    }
}
