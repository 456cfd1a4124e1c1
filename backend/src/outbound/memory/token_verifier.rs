//! Digest-based bearer token verifier.
//!
//! Only SHA-256 digests of issued tokens are held. A presented token is
//! hashed and looked up; the raw value never leaves its zeroizing buffer.

use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::UserId;
use crate::domain::ports::{AccessTokenError, AccessTokenVerifier};

/// Hex-encoded SHA-256 digest of `token`.
///
/// # Examples
/// ```
/// use tracker::outbound::memory::token_digest;
///
/// assert_eq!(
///     token_digest("abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
/// );
/// ```
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Verifier backed by a fixed table of token digests.
#[derive(Debug, Clone, Default)]
pub struct StaticAccessTokenVerifier {
    digests: HashMap<String, UserId>,
}

impl StaticAccessTokenVerifier {
    /// Empty verifier; rejects every token until digests are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept tokens whose hex SHA-256 digest is `digest` as `user`.
    ///
    /// Digests are compared case-insensitively.
    #[must_use]
    pub fn with_digest(mut self, digest: &str, user: UserId) -> Self {
        self.insert_digest(digest, user);
        self
    }

    /// Register a digest in place.
    pub fn insert_digest(&mut self, digest: &str, user: UserId) {
        self.digests.insert(digest.trim().to_ascii_lowercase(), user);
    }

    /// Number of registered digests.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Whether no digests are registered.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

#[async_trait]
impl AccessTokenVerifier for StaticAccessTokenVerifier {
    async fn verify(&self, token: Zeroizing<String>) -> Result<UserId, AccessTokenError> {
        let digest = Zeroizing::new(token_digest(token.as_str()));
        match self.digests.get(digest.as_str()) {
            Some(user) => Ok(*user),
            None => {
                debug!("bearer token digest not recognised");
                Err(AccessTokenError::rejected())
            }
        }
    }
}
