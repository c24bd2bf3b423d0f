use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// Argon2id hasher configured with the deployment's work factor.
///
/// Verification reads the parameters embedded in each stored PHC string, so hashes
/// produced under an older (cheaper) configuration keep verifying after the work
/// factor is raised.
pub struct Passwords {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl Passwords {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut passwords = Self {
            argon2,
            dummy_hash: String::new(),
        };
        passwords.dummy_hash = passwords.hash_password("cadastro-timing-equalizer")?;
        Ok(passwords)
    }

    pub fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on mismatch; `Err` only when the stored hash itself is unusable.
    pub fn verify_password(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(anyhow::anyhow!(e.to_string()))
            }
        }
    }

    /// Burns the same hashing cost as a real verification. Used when login finds no user.
    pub fn verify_against_dummy(&self, plain: &str) {
        let _ = self.verify_password(plain, &self.dummy_hash);
    }

    pub async fn hash_blocking(self: &Arc<Self>, plain: String) -> anyhow::Result<String> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.hash_password(&plain))
            .await
            .context("password hashing task failed")?
    }

    pub async fn verify_blocking(self: &Arc<Self>, plain: String, hash: String) -> anyhow::Result<bool> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.verify_password(&plain, &hash))
            .await
            .context("password verification task failed")?
    }

    pub async fn verify_dummy_blocking(self: &Arc<Self>, plain: String) -> anyhow::Result<()> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.verify_against_dummy(&plain))
            .await
            .context("password verification task failed")
    }
}

#[cfg(test)]
pub(crate) fn cheap_config() -> PasswordConfig {
    PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}
