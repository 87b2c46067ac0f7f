//! Ranked, deadline-bounded evidence lookup across several backends.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use clinidraft_config::SourcesConfig;
use clinidraft_core::{EvidenceSource, GenerationRequest, SourceBackend, SourceError};
use futures::future::join_all;
use tracing::{debug, warn};

/// Fans a query out to every backend that handles it and ranks the union.
pub struct EvidenceAggregator {
    backends: Vec<Arc<dyn SourceBackend>>,
    name: String,
    timeout: Duration,
    max_results: usize,
}

impl EvidenceAggregator {
    pub fn new(backends: Vec<Arc<dyn SourceBackend>>, timeout: Duration, max_results: usize) -> Self {
        let name = backends
            .iter()
            .map(|b| b.name())
            .collect::<Vec<_>>()
            .join("+");
        Self {
            backends,
            name,
            timeout,
            max_results,
        }
    }

    pub fn from_config(backends: Vec<Arc<dyn SourceBackend>>, config: &SourcesConfig) -> Self {
        Self::new(backends, config.timeout(), config.max_results)
    }

    /// Backend names joined with `+`, e.g. "literature+trials+genes".
    pub fn backend_name(&self) -> &str {
        &self.name
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Fetch up to the configured number of records for `query`.
    pub async fn fetch(&self, query: &str) -> Result<Vec<EvidenceSource>, SourceError> {
        self.fetch_with_limit(query, self.max_results).await
    }

    /// Query every backend that handles `query` concurrently, then merge,
    /// rank and truncate.
    ///
    /// Each backend runs under its own deadline. A failing backend only
    /// loses its own records; the call fails when every consulted backend
    /// failed. Records with a relevance score outside `[0, 1]` are dropped,
    /// and a record reported twice (same identifier) is kept once.
    pub async fn fetch_with_limit(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceSource>, SourceError> {
        let applicable: Vec<&dyn SourceBackend> = self
            .backends
            .iter()
            .map(|b| &**b)
            .filter(|b| b.handles(query))
            .collect();
        if applicable.is_empty() {
            debug!(backends = %self.name, "No evidence backend handles this query");
            return Ok(Vec::new());
        }

        let outcomes = join_all(
            applicable
                .iter()
                .map(|&backend| self.search_one(backend, query, max_results)),
        )
        .await;

        let mut sources = Vec::new();
        let mut last_error = None;
        let mut answered = 0;
        for outcome in outcomes {
            match outcome {
                Ok(mut records) => {
                    answered += 1;
                    sources.append(&mut records);
                }
                Err(e) => last_error = Some(e),
            }
        }
        if answered == 0 {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        sources.retain(|s| (0.0..=1.0).contains(&s.relevance_score));
        sources.sort_by(EvidenceSource::rank_cmp);
        let mut seen = HashSet::new();
        sources.retain(|s| seen.insert(s.identifier.clone()));
        sources.truncate(max_results);

        debug!(
            backends = %self.name,
            consulted = applicable.len(),
            answered,
            count = sources.len(),
            "Evidence lookup complete"
        );
        Ok(sources)
    }

    async fn search_one(
        &self,
        backend: &dyn SourceBackend,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<EvidenceSource>, SourceError> {
        let name = backend.name().to_string();
        match tokio::time::timeout(self.timeout, backend.search(query, max_results)).await {
            Ok(Ok(sources)) => Ok(sources),
            Ok(Err(e)) => {
                warn!(backend = %name, error = %e, "Evidence lookup failed");
                Err(e)
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(backend = %name, timeout_ms, "Evidence lookup timed out");
                Err(SourceError::Timeout {
                    backend: name,
                    timeout_ms,
                })
            }
        }
    }

    /// Healthy only when every backend answers its health check in time.
    pub async fn health_check(&self) -> bool {
        let checks = self
            .backends
            .iter()
            .map(|b| tokio::time::timeout(self.timeout, b.health_check()));
        join_all(checks)
            .await
            .into_iter()
            .all(|r| r.unwrap_or(false))
    }
}

/// The literature query for a request, or `None` when no sources are wanted.
///
/// Clinical queries are built from the summary type and focus areas only;
/// patient data never leaves the process.
pub fn query_for(request: &GenerationRequest) -> Option<String> {
    match request {
        GenerationRequest::PatientEducation(r) => r.include_sources.then(|| r.topic.clone()),
        GenerationRequest::ClinicalSummary(r) => {
            let mut query = format!("{} summary", r.summary_type.as_str());
            for area in &r.focus_areas {
                query.push(' ');
                query.push_str(area);
            }
            Some(query)
        }
    }
}
