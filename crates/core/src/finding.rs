//! Compliance findings produced by the rule engine.

use serde::{Deserialize, Serialize};

/// When a rule is evaluated relative to generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before any generation cost is spent, over the request input.
    Pre,
    /// After generation, over the draft.
    Post,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Pre => f.write_str("pre"),
            Phase::Post => f.write_str("post"),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre" => Ok(Phase::Pre),
            "post" => Ok(Phase::Post),
            other => Err(format!("unknown phase '{other}' (expected pre or post)")),
        }
    }
}

/// How serious a finding is. Only `Block` stops the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Block,
}

/// Byte range of the text that triggered a rule.
///
/// The matched text itself is deliberately not stored: for PII rules it would
/// copy the identifier into logs and rejection messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedSpan {
    pub start: usize,
    pub end: usize,
}

/// A single rule hit. Created once by the rule engine and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceFinding {
    /// Stable rule identifier, e.g. `pii.phone_number`.
    pub rule_id: String,
    pub severity: Severity,
    /// Human-readable message; surfaced verbatim in `safety_flags`.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_span: Option<MatchedSpan>,
}

impl ComplianceFinding {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Block
    }
}
