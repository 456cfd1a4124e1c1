//! Driving port for resolving the ids a response mentions.

use async_trait::async_trait;

use crate::domain::{Error, ReferenceSet, ResolvedReferences};

/// Batch lookup of display summaries for referenced entities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Resolve every id in `wanted`. Ids that do not exist are left out.
    ///
    /// # Errors
    /// `service_unavailable` when the backing store cannot be read.
    async fn resolve(&self, wanted: &ReferenceSet) -> Result<ResolvedReferences, Error>;
}

/// Lookup answering every request with one canned set of summaries.
///
/// The default resolves nothing, so responses carry bare ids.
#[derive(Debug, Clone, Default)]
pub struct FixtureReferenceLookup {
    resolved: ResolvedReferences,
}

impl FixtureReferenceLookup {
    /// Answer every request with `resolved`.
    pub fn new(resolved: ResolvedReferences) -> Self {
        Self { resolved }
    }
}

#[async_trait]
impl ReferenceLookup for FixtureReferenceLookup {
    async fn resolve(&self, _wanted: &ReferenceSet) -> Result<ResolvedReferences, Error> {
        Ok(self.resolved.clone())
    }
}
