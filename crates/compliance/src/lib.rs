//! Compliance rules: PII screening and clinical-safety checks.
//!
//! The rule engine is a pure function over text. It runs twice per request:
//!
//! ```text
//!  request input ──▶ evaluate(Pre)  ──▶ any Block? ──▶ reject (no generation)
//!                                             │
//!                                             ▼
//!  generated draft ─▶ evaluate(Post) ──▶ findings become safety flags
//! ```
//!
//! PII found in clinical input before generation blocks the request; the
//! same patterns found in a draft only warn. Everything else is advisory.
//!
//! Rules are compiled once at start-up. Findings come back in rule
//! declaration order, one per rule.

mod engine;
mod lexicon;
mod rule;

pub use engine::{RuleEngine, first_blocking};
pub use lexicon::HEDGING_FLAG;
pub use rule::{Matcher, Rule, RuleCategory, Scope};

/// Errors from the compliance subsystem.
#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    #[error("invalid pattern in rule '{rule_id}': {detail}")]
    InvalidPattern { rule_id: String, detail: String },
}
