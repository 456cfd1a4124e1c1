//! Identity fixtures loaded at startup.
//!
//! A fixture file lists identities together with the SHA-256 digest of the
//! bearer token each one authenticates with:
//!
//! ```json
//! {
//!   "identities": [
//!     {
//!       "name": "Alice",
//!       "email": "alice@example.com",
//!       "role": "admin",
//!       "passwordHash": "$argon2id$...",
//!       "tokenSha256": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
//!     }
//!   ]
//! }
//! ```
//!
//! Seeding is idempotent: identities whose email is already registered are
//! bound to their existing id instead of being registered again.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::domain::ports::{RegisterUserRequest, TrackerStore, UserDirectory};
use crate::domain::service_support::map_store_error;
use crate::domain::{EmailAddress, Error, ErrorCode, PasswordHash, Role, UserId};

use super::StaticAccessTokenVerifier;

/// Failures while reading a fixture file.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The file could not be read.
    #[error("failed to read identity fixtures at {path}: {source}")]
    Read {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The file is not valid fixture JSON.
    #[error("failed to parse identity fixtures at {path}: {source}")]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// Underlying parse failure.
        source: serde_json::Error,
    },
}

/// One identity to register.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityFixture {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role granted.
    pub role: Role,
    /// Opaque credential digest.
    #[serde(default)]
    pub password_hash: String,
    /// Hex SHA-256 digest of the identity's bearer token.
    pub token_sha256: String,
}

/// Parsed fixture file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityFixtures {
    /// Identities in registration order.
    pub identities: Vec<IdentityFixture>,
}

impl IdentityFixtures {
    /// Read and parse a fixture file.
    ///
    /// # Errors
    /// Returns [`FixtureError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse fixture JSON.
    ///
    /// # Errors
    /// Returns the underlying `serde_json` error for malformed input.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Register every identity and return a verifier accepting their tokens.
    ///
    /// # Errors
    /// Propagates registration failures other than an already registered
    /// email.
    pub async fn seed<S>(
        &self,
        directory: &dyn UserDirectory,
        store: &S,
    ) -> Result<StaticAccessTokenVerifier, Error>
    where
        S: TrackerStore + ?Sized,
    {
        let mut verifier = StaticAccessTokenVerifier::new();
        for fixture in &self.identities {
            let request = RegisterUserRequest {
                name: fixture.name.clone(),
                email: fixture.email.clone(),
                password_hash: PasswordHash::new(fixture.password_hash.clone()),
                role: fixture.role,
            };
            let id = match directory.register_user(request).await {
                Ok(user) => user.id,
                Err(err) if err.code() == ErrorCode::Conflict => {
                    existing_id(store, &fixture.email).await?
                }
                Err(err) => return Err(err),
            };
            verifier.insert_digest(&fixture.token_sha256, id);
        }
        info!(identities = verifier.len(), "identity fixtures seeded");
        Ok(verifier)
    }
}

async fn existing_id<S>(store: &S, raw_email: &str) -> Result<UserId, Error>
where
    S: TrackerStore + ?Sized,
{
    let email = EmailAddress::new(raw_email)
        .map_err(|err| Error::invalid_request(format!("fixture email {raw_email}: {err}")))?;
    store
        .find_user_by_email(&email)
        .await
        .map_err(map_store_error)?
        .map(|user| user.id)
        .ok_or_else(|| Error::internal(format!("identity {email} vanished during seeding")))
}
