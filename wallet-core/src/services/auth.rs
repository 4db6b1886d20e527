//! Authentication gate
//!
//! Every user-scoped operation takes a [`Caller`], and only [`AuthGate`]
//! can produce one, so nothing reaches the ledger unauthenticated.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::{Result, WalletError};
use crate::domain::BasicCredentials;

use super::credential::CredentialService;

/// Proof that a request carried valid credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user_id: Uuid,
    username: String,
}

impl Caller {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

pub struct AuthGate {
    credentials: Arc<CredentialService>,
}

impl AuthGate {
    pub fn new(credentials: Arc<CredentialService>) -> Self {
        Self { credentials }
    }

    /// Authenticate an `Authorization` header value
    ///
    /// Every failure, whether a missing header, a malformed one, or a bad
    /// password, is reported as `AuthenticationRequired`.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Caller> {
        let creds = header
            .and_then(BasicCredentials::parse)
            .ok_or(WalletError::AuthenticationRequired)?;
        self.authenticate_credentials(&creds)
    }

    /// Authenticate already-decoded credentials
    pub fn authenticate_credentials(&self, creds: &BasicCredentials) -> Result<Caller> {
        match self.credentials.verify(&creds.username, &creds.password)? {
            Some(user) => Ok(Caller {
                user_id: user.id,
                username: user.username,
            }),
            None => Err(WalletError::AuthenticationRequired),
        }
    }
}
