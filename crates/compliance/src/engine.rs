//! Rule evaluation.
//!
//! The engine holds an immutable, compiled rule table and evaluates it
//! against request input (pre phase) or a generated draft (post phase).

use clinidraft_core::{ComplianceFinding, ContentKind, MatchedSpan, Phase, Severity};
use tracing::{debug, warn};

use crate::ComplianceError;
use crate::lexicon::builtin_rules;
use crate::rule::{Matcher, Rule};

/// The compliance rule engine.
///
/// Immutable after construction and safe to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    /// Engine with the built-in rule table.
    pub fn new() -> Result<Self, ComplianceError> {
        Self::with_extra_terms(&[], &[])
    }

    /// Engine with the built-in rules, extending the unsafe-claim and
    /// sensitive-topic lexicons with configured terms.
    pub fn with_extra_terms(
        extra_unsafe_terms: &[String],
        extra_sensitive_terms: &[String],
    ) -> Result<Self, ComplianceError> {
        Ok(Self {
            rules: builtin_rules(extra_unsafe_terms, extra_sensitive_terms)?,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate every rule that applies to `phase` and `kind`.
    ///
    /// Returns at most one finding per rule, in rule declaration order.
    pub fn evaluate(&self, text: &str, phase: Phase, kind: ContentKind) -> Vec<ComplianceFinding> {
        let mut findings = Vec::new();

        for rule in &self.rules {
            let Some(severity) = rule.severity_for(phase, kind) else {
                continue;
            };

            let hit = match &rule.matcher {
                Matcher::Present(regex) => regex.find(text).map(|m| {
                    Some(MatchedSpan {
                        start: m.start(),
                        end: m.end(),
                    })
                }),
                Matcher::Absent(regex) => (!regex.is_match(text)).then_some(None),
                Matcher::LongerThan(limit) => (text.chars().count() > *limit).then_some(None),
            };

            let Some(matched_span) = hit else {
                continue;
            };

            if severity == Severity::Block {
                warn!(rule_id = %rule.id, %phase, "Compliance rule BLOCKED input");
            } else {
                debug!(rule_id = %rule.id, %phase, ?severity, "Compliance rule matched");
            }

            findings.push(ComplianceFinding {
                rule_id: rule.id.clone(),
                severity,
                message: rule.message.clone(),
                matched_span,
            });
        }

        findings
    }
}

/// The first blocking finding, if any. Any block is fatal to a request.
pub fn first_blocking(findings: &[ComplianceFinding]) -> Option<&ComplianceFinding> {
    findings.iter().find(|f| f.is_blocking())
}
