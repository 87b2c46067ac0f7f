//! `clinidraft check`: Evaluate text against the compliance rules.

use std::process::ExitCode;

use clinidraft_compliance::{RuleEngine, first_blocking};
use clinidraft_config::AppConfig;
use clinidraft_core::{ContentKind, Phase};

pub fn run(
    config: &AppConfig,
    phase: Phase,
    kind: ContentKind,
    text: &str,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let engine = RuleEngine::with_extra_terms(
        &config.compliance.extra_unsafe_terms,
        &config.compliance.extra_sensitive_terms,
    )?;
    let findings = engine.evaluate(text, phase, kind);
    super::print_json(&findings)?;

    match first_blocking(&findings) {
        Some(finding) => {
            eprintln!("❌ Blocked by {}: {}", finding.rule_id, finding.message);
            Ok(ExitCode::from(super::EXIT_REJECTED))
        }
        None => Ok(ExitCode::SUCCESS),
    }
}
