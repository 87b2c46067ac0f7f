//! Rule data model.

use clinidraft_core::{ContentKind, Phase, Severity};
use regex_lite::Regex;
use serde::Serialize;

use crate::ComplianceError;

/// Broad family a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Pii,
    SensitiveTopic,
    UnsafeClaim,
    ClinicalLanguage,
}

/// Where a rule runs and how severe a hit is there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub phase: Phase,
    /// `None` = both request kinds.
    pub kind: Option<ContentKind>,
    pub severity: Severity,
}

impl Scope {
    pub const fn new(phase: Phase, kind: Option<ContentKind>, severity: Severity) -> Self {
        Self {
            phase,
            kind,
            severity,
        }
    }

    fn applies(&self, phase: Phase, kind: ContentKind) -> bool {
        self.phase == phase && self.kind.is_none_or(|k| k == kind)
    }
}

/// How a rule inspects text.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Fires when the pattern matches.
    Present(Regex),
    /// Fires when the pattern matches nowhere in the text.
    Absent(Regex),
    /// Fires when the text runs past this many characters.
    LongerThan(usize),
}

/// A single compiled compliance rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable identifier, e.g. `pii.phone_number`.
    pub id: String,
    pub category: RuleCategory,
    pub message: String,
    pub matcher: Matcher,
    pub scopes: Vec<Scope>,
}

impl Rule {
    /// Compile a rule from a regex source.
    pub fn new(
        id: &str,
        category: RuleCategory,
        message: &str,
        pattern: &str,
        absent: bool,
        scopes: Vec<Scope>,
    ) -> Result<Self, ComplianceError> {
        let regex = Regex::new(pattern).map_err(|e| ComplianceError::InvalidPattern {
            rule_id: id.to_string(),
            detail: e.to_string(),
        })?;
        Ok(Self {
            id: id.to_string(),
            category,
            message: message.to_string(),
            matcher: if absent {
                Matcher::Absent(regex)
            } else {
                Matcher::Present(regex)
            },
            scopes,
        })
    }

    /// A rule on input size rather than content.
    pub fn longer_than(
        id: &str,
        category: RuleCategory,
        message: &str,
        limit: usize,
        scopes: Vec<Scope>,
    ) -> Self {
        Self {
            id: id.to_string(),
            category,
            message: message.to_string(),
            matcher: Matcher::LongerThan(limit),
            scopes,
        }
    }

    /// Severity of a hit for this phase and request kind, if the rule runs there at all.
    pub fn severity_for(&self, phase: Phase, kind: ContentKind) -> Option<Severity> {
        self.scopes
            .iter()
            .find(|s| s.applies(phase, kind))
            .map(|s| s.severity)
    }
}

/// Build a case-insensitive alternation from a base pattern plus literal terms.
///
/// Literal terms are escaped and get word boundaries on whichever edges are
/// word characters.
pub(crate) fn lexicon_pattern(base: &str, extra_terms: &[String]) -> String {
    let mut alternatives = vec![format!("(?:{base})")];
    for term in extra_terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let starts_word = term.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
        let ends_word = term.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
        alternatives.push(format!(
            "{}{}{}",
            if starts_word { r"\b" } else { "" },
            regex_lite::escape(term),
            if ends_word { r"\b" } else { "" },
        ));
    }
    format!("(?i){}", alternatives.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_without_kind_applies_to_both() {
        let rule = Rule::new(
            "t",
            RuleCategory::UnsafeClaim,
            "m",
            "x",
            false,
            vec![Scope::new(Phase::Post, None, Severity::Warn)],
        )
        .unwrap();
        assert_eq!(
            rule.severity_for(Phase::Post, ContentKind::PatientEducation),
            Some(Severity::Warn)
        );
        assert_eq!(
            rule.severity_for(Phase::Post, ContentKind::ClinicalSummary),
            Some(Severity::Warn)
        );
        assert_eq!(rule.severity_for(Phase::Pre, ContentKind::ClinicalSummary), None);
    }

    #[test]
    fn invalid_pattern_reports_rule_id() {
        let err = Rule::new("broken", RuleCategory::Pii, "m", "(unclosed", false, vec![])
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn lexicon_terms_are_escaped() {
        let pattern = lexicon_pattern("miracle", &["100% effective".into(), "  ".into()]);
        let regex = Regex::new(&pattern).unwrap();
        assert!(regex.is_match("This is 100% effective for everyone"));
        assert!(regex.is_match("A MIRACLE treatment"));
        assert!(!regex.is_match("100x effective"));
    }
}
