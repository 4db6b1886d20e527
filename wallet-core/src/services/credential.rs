//! Credential store - registration and password verification
//!
//! Passwords are hashed with Argon2id into PHC strings. Verification of an
//! unknown username still runs a full hash against a fixed dummy hash, so
//! "no such user" and "wrong password" cost the same and look the same.

use std::sync::{Arc, OnceLock};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use tracing::{debug, warn};

use crate::domain::result::{Result, WalletError};
use crate::domain::{User, MAX_PASSWORD_LEN, MAX_USERNAME_LEN};
use crate::ports::Repository;

/// Registers users and checks their passwords
pub struct CredentialService {
    repository: Arc<dyn Repository>,
    argon2: Argon2<'static>,
    dummy_hash: OnceLock<String>,
}

impl CredentialService {
    /// Credential service with the Argon2 library defaults
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self::with_params(repository, Params::default())
    }

    /// Credential service with explicit Argon2id cost parameters
    pub fn with_params(repository: Arc<dyn Repository>, params: Params) -> Self {
        Self {
            repository,
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: OnceLock::new(),
        }
    }

    /// Low-cost parameters for tests and local tooling
    pub fn fast_params() -> Params {
        // m = 8 KiB, t = 1, p = 1 are the smallest values argon2 accepts
        Params::new(8, 1, 1, None).unwrap_or_default()
    }

    /// Register a new user with a zero balance
    pub fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        validate_new_credentials(username, password)?;

        if self.repository.find_user_by_username(username)?.is_some() {
            return Err(WalletError::DuplicateUser(username.to_string()));
        }

        let user = User::new(username, self.hash(password)?);

        // The unique constraint settles races between concurrent registrations
        if !self.repository.insert_user(&user)? {
            return Err(WalletError::DuplicateUser(username.to_string()));
        }

        debug!(user_id = %user.id, "registered user");
        Ok(user)
    }

    /// Check a username/password pair
    ///
    /// Returns `None` for an unknown user, a wrong password, or an unreadable
    /// stored hash. Callers cannot tell these apart.
    pub fn verify(&self, username: &str, password: &str) -> Result<Option<User>> {
        let user = self.repository.find_user_by_username(username)?;

        let Some(user) = user else {
            let dummy = self.dummy_hash()?;
            let _ = self.check(password, dummy);
            return Ok(None);
        };

        if self.check(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| WalletError::database(format!("Failed to hash password: {}", e)))
    }

    fn check(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!("unreadable password hash in store: {}", e);
                false
            }
        }
    }

    fn dummy_hash(&self) -> Result<&str> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash.as_str());
        }
        let hash = self.hash("wallet-dummy-password")?;
        Ok(self.dummy_hash.get_or_init(|| hash).as_str())
    }
}

fn validate_new_credentials(username: &str, password: &str) -> Result<()> {
    if username.is_empty() || password.is_empty() {
        return Err(WalletError::invalid("Username and password are required"));
    }
    if username.contains(':') {
        return Err(WalletError::invalid("Username must not contain ':'"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(WalletError::invalid(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(WalletError::invalid(format!(
            "Password must be at most {} bytes",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}
