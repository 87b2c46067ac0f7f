//! Evidence sources for Clinidraft drafts.
//!
//! The [`EvidenceAggregator`] fans a query out to every configured
//! [`SourceBackend`] that handles it, each under its own deadline, then
//! ranks the union (relevance descending, then year descending) and keeps
//! the top `max_results`. Failures surface as [`SourceError`]; the pipeline
//! turns them into an empty list plus a safety flag.
//!
//! Three deterministic backends ship with the crate: literature
//! ([`MockLiteratureSource`]), trial registry ([`MockTrialsSource`]) and
//! gene annotation ([`MockGeneSource`]). Real databases plug in through the
//! same trait.
//!
//! [`SourceBackend`]: clinidraft_core::SourceBackend
//! [`SourceError`]: clinidraft_core::SourceError

pub mod aggregator;
pub mod genes;
pub mod mock;
pub mod trials;

use std::sync::Arc;

use clinidraft_config::AppConfig;
use clinidraft_core::{SourceBackend, SourceError};

pub use aggregator::{EvidenceAggregator, query_for};
pub use genes::MockGeneSource;
pub use mock::MockLiteratureSource;
pub use trials::MockTrialsSource;

/// Build every configured source backend, in configuration order.
pub fn build_from_config(config: &AppConfig) -> Result<Vec<Arc<dyn SourceBackend>>, SourceError> {
    config
        .sources
        .backends
        .iter()
        .map(|name| build_backend(name))
        .collect()
}

fn build_backend(name: &str) -> Result<Arc<dyn SourceBackend>, SourceError> {
    match name {
        "literature" | "mock" => Ok(Arc::new(MockLiteratureSource::new())),
        "trials" => Ok(Arc::new(MockTrialsSource::new())),
        "genes" => Ok(Arc::new(MockGeneSource::new())),
        other => Err(SourceError::Unavailable {
            backend: other.to_string(),
            reason: "unknown source backend (built-in backends: literature, trials, genes)"
                .into(),
        }),
    }
}
