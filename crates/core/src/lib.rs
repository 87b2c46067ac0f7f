//! # Clinidraft Core
//!
//! Domain types, traits, and error definitions for the Clinidraft content
//! generation and compliance guardrail pipeline. This crate has **no runtime
//! dependencies**; it defines the domain model that every other crate
//! implements against.
//!
//! ## Design Philosophy
//!
//! Every external capability is defined as a trait here. Implementations live
//! in their respective crates:
//! - [`Provider`]: the language-model capability (`clinidraft-providers`)
//! - [`SourceBackend`]: the biomedical literature capability (`clinidraft-evidence`)
//!
//! Tests swap in counting mocks without touching the pipeline.

pub mod error;
pub mod finding;
pub mod identity;
pub mod provider;
pub mod request;
pub mod result;
pub mod source;
pub mod text;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, SourceError, ValidationError};
pub use finding::{ComplianceFinding, MatchedSpan, Phase, Severity};
pub use identity::CallerIdentity;
pub use provider::{
    GenerationConstraints, GenerationPass, Provider, ProviderRequest, ProviderResponse, Usage,
};
pub use request::{
    AgeGroup, ClinicalSummaryRequest, ContentKind, GenerationRequest, PatientEducationRequest,
    ReadingLevel, SummaryType,
};
pub use result::{
    ContentDetails, EvidenceSource, GenerationMetadata, GenerationResult, LengthOutcome,
};
pub use source::SourceBackend;
pub use text::{capitalize_first, title_case};
