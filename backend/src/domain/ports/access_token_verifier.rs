//! Driven port resolving bearer credentials to identities.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Failures raised while verifying an access token.
    pub enum AccessTokenError {
        /// The token is unknown, malformed or revoked.
        Rejected => "access token rejected",
        /// The verifier backend is unavailable.
        Unavailable { message: String } => "access token verifier unavailable: {message}",
    }
}

/// Resolves a raw bearer token to the identity it was issued for.
///
/// Tokens are handed over in a [`Zeroizing`] buffer so the secret is wiped
/// once verification finishes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessTokenVerifier: Send + Sync {
    /// Verify `token` and return the identity it authenticates.
    async fn verify(&self, token: Zeroizing<String>) -> Result<UserId, AccessTokenError>;
}

/// Verifier that rejects every token.
///
/// Used when no credentials are configured so that every request is
/// unauthenticated rather than silently trusted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAccessTokenVerifier;

#[async_trait]
impl AccessTokenVerifier for FixtureAccessTokenVerifier {
    async fn verify(&self, _token: Zeroizing<String>) -> Result<UserId, AccessTokenError> {
        Err(AccessTokenError::rejected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_verifier_rejects_everything() {
        let verifier = FixtureAccessTokenVerifier;
        let result = verifier.verify(Zeroizing::new("anything".to_owned())).await;
        assert_eq!(result, Err(AccessTokenError::Rejected));
    }
}
