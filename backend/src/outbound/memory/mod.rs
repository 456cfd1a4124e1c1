//! In-process adapters.
//!
//! Used when no database is configured and by the integration tests: a
//! `TrackerStore` held in memory, a digest-based bearer token verifier and
//! the identity fixture loader that feeds it.

mod fixtures;
mod store;
mod token_verifier;

pub use fixtures::{FixtureError, IdentityFixture, IdentityFixtures};
pub use store::InMemoryTrackerStore;
pub use token_verifier::{StaticAccessTokenVerifier, token_digest};
