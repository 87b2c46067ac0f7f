//! SourceBackend trait: the abstraction over biomedical literature databases.
//!
//! Query string in, ranked records out. Failures are reported as
//! [`SourceError`] and are never fatal to a generation request.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::result::EvidenceSource;

#[async_trait]
pub trait SourceBackend: Send + Sync {
    /// Backend name used in logs and health reports (e.g., "literature", "trials").
    fn name(&self) -> &str;

    /// Whether this backend has anything to say about `query`.
    ///
    /// Specialized backends (gene databases, for instance) return `false`
    /// for queries outside their field and are then not consulted.
    fn handles(&self, _query: &str) -> bool {
        true
    }

    /// Search for up to `limit` records relevant to `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EvidenceSource>, SourceError>;

    /// Health check: can we reach the backend?
    async fn health_check(&self) -> bool {
        true
    }
}
