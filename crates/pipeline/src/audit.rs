//! Audit logging of pipeline runs.
//!
//! Every run leaves one entry: who asked, for which fingerprint, and how it
//! ended. Entries never contain request text or generated content.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use clinidraft_core::CallerIdentity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Entries kept in memory before the oldest are dropped.
pub const DEFAULT_AUDIT_CAPACITY: usize = 1024;

/// A single audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
    pub caller: CallerIdentity,
    /// Absent when the request was rejected before it could be fingerprinted.
    pub fingerprint: Option<String>,
    pub outcome: AuditOutcome,
    pub detail: Option<String>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Completed,
    CacheHit,
    Rejected,
}

/// Trait for audit log sinks (where entries are written).
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry);
}

/// Bounded in-memory audit log that forwards every entry to its sinks.
pub struct AuditLogger {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
    sinks: Vec<Box<dyn AuditSink>>,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger")
            .field("entry_count", &self.count())
            .field("capacity", &self.capacity)
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogger {
    /// Create a new audit logger with no sinks.
    pub fn new() -> Self {
        Self::with_sinks(Vec::new())
    }

    /// Create a new audit logger with the given sinks.
    pub fn with_sinks(sinks: Vec<Box<dyn AuditSink>>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: DEFAULT_AUDIT_CAPACITY,
            sinks,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    fn entries_guard(&self) -> std::sync::MutexGuard<'_, VecDeque<AuditEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the outcome of a run.
    pub fn log(
        &self,
        request_id: Uuid,
        caller: &CallerIdentity,
        fingerprint: Option<&str>,
        outcome: AuditOutcome,
        detail: Option<String>,
    ) {
        let entry = AuditEntry {
            timestamp: Utc::now(),
            request_id,
            caller: caller.clone(),
            fingerprint: fingerprint.map(str::to_string),
            outcome,
            detail,
        };

        {
            let mut entries = self.entries_guard();
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }

        for sink in &self.sinks {
            sink.record(&entry);
        }
    }

    /// Get all retained entries, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries_guard().iter().cloned().collect()
    }

    pub fn entries_by_outcome(&self, outcome: AuditOutcome) -> Vec<AuditEntry> {
        self.entries_guard()
            .iter()
            .filter(|e| e.outcome == outcome)
            .cloned()
            .collect()
    }

    /// Count of retained entries.
    pub fn count(&self) -> usize {
        self.entries_guard().len()
    }
}

/// A tracing-based audit sink that logs entries via `tracing::info!`.
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, entry: &AuditEntry) {
        tracing::info!(
            request_id = %entry.request_id,
            caller = %entry.caller,
            fingerprint = entry.fingerprint.as_deref().unwrap_or("-"),
            outcome = ?entry.outcome,
            detail = ?entry.detail,
            "AUDIT"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct CollectingSink(Arc<Mutex<Vec<AuditOutcome>>>);

    impl AuditSink for CollectingSink {
        fn record(&self, entry: &AuditEntry) {
            self.0.lock().unwrap().push(entry.outcome);
        }
    }

    #[test]
    fn log_and_retrieve_entries() {
        let logger = AuditLogger::new();
        let caller = CallerIdentity::new("clinician-7");
        logger.log(Uuid::new_v4(), &caller, Some("abc"), AuditOutcome::Completed, None);
        logger.log(
            Uuid::new_v4(),
            &caller,
            None,
            AuditOutcome::Rejected,
            Some("pii.phone_number".into()),
        );

        assert_eq!(logger.count(), 2);
        let entries = logger.entries();
        assert_eq!(entries[0].fingerprint.as_deref(), Some("abc"));
        assert_eq!(entries[1].detail.as_deref(), Some("pii.phone_number"));
        assert_eq!(entries[1].caller.as_str(), "clinician-7");
    }

    #[test]
    fn filter_by_outcome() {
        let logger = AuditLogger::new();
        let caller = CallerIdentity::anonymous();
        for outcome in [
            AuditOutcome::Completed,
            AuditOutcome::CacheHit,
            AuditOutcome::CacheHit,
            AuditOutcome::Rejected,
        ] {
            logger.log(Uuid::new_v4(), &caller, Some("fp"), outcome, None);
        }
        assert_eq!(logger.entries_by_outcome(AuditOutcome::CacheHit).len(), 2);
        assert_eq!(logger.entries_by_outcome(AuditOutcome::Rejected).len(), 1);
    }

    #[test]
    fn capacity_drops_oldest() {
        let logger = AuditLogger::new().with_capacity(2);
        let caller = CallerIdentity::anonymous();
        for fp in ["a", "b", "c"] {
            logger.log(Uuid::new_v4(), &caller, Some(fp), AuditOutcome::Completed, None);
        }
        let fps: Vec<_> = logger
            .entries()
            .into_iter()
            .filter_map(|e| e.fingerprint)
            .collect();
        assert_eq!(fps, vec!["b", "c"]);
    }

    #[test]
    fn sinks_receive_every_entry() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let logger = AuditLogger::with_sinks(vec![
            Box::new(CollectingSink(Arc::clone(&seen))),
            Box::new(TracingSink),
        ]);
        let caller = CallerIdentity::anonymous();
        logger.log(Uuid::new_v4(), &caller, None, AuditOutcome::Rejected, None);
        logger.log(Uuid::new_v4(), &caller, Some("fp"), AuditOutcome::CacheHit, None);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![AuditOutcome::Rejected, AuditOutcome::CacheHit]
        );
    }

    #[test]
    fn entries_serialize_without_content() {
        let logger = AuditLogger::new();
        logger.log(
            Uuid::nil(),
            &CallerIdentity::new("svc"),
            Some("fp"),
            AuditOutcome::Completed,
            None,
        );
        let json = serde_json::to_value(&logger.entries()[0]).unwrap();
        assert_eq!(json["caller"], "svc");
        assert_eq!(json["outcome"], "completed");
        assert!(json.get("content").is_none());
    }
}
