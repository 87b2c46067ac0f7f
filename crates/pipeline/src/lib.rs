//! The Clinidraft guardrail pipeline.
//!
//! ```text
//!  GenerationRequest
//!        │ validate, normalize, fingerprint
//!        ▼
//!  ResponseCache ── hit / joined ─────────────────────────────┐
//!        │ miss (one leader per fingerprint)                    │
//!        ▼                                                      │
//!  pre-check ── block ──▶ Rejection                             │
//!        │                                                      │
//!        ▼                                                      │
//!  generate draft  ∥  fetch evidence                            │
//!        │                                                      │
//!        ▼                                                      │
//!  post-check (flags only) ──▶ assemble ──▶ GenerationResult ◀─┘
//! ```
//!
//! Every run, including rejections and cache hits, leaves an audit entry.

pub mod audit;
pub mod cache;
pub mod fingerprint;
pub mod pipeline;
pub mod rejection;

pub use audit::{AuditEntry, AuditLogger, AuditOutcome, AuditSink, TracingSink};
pub use cache::{Abandoned, Fetched, Lookup, ResponseCache};
pub use fingerprint::fingerprint;
pub use pipeline::{
    CacheHealth, ComponentHealth, GuardrailPipeline, HealthReport, PipelineError,
    SOURCES_UNAVAILABLE_FLAG,
};
pub use rejection::{Rejection, RejectionReason, Stage};
