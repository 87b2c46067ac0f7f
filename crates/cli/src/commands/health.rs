//! `clinidraft health`: Check provider, evidence source and cache health.

use std::process::ExitCode;

use clinidraft_config::AppConfig;
use clinidraft_pipeline::GuardrailPipeline;

pub async fn run(config: &AppConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let pipeline = GuardrailPipeline::from_config(config)?;
    let report = pipeline.health().await;
    super::print_json(&report)?;

    if !report.sources.healthy {
        eprintln!(
            "⚠️  Evidence source '{}' unavailable; drafts will carry no citations",
            report.sources.name
        );
    }
    if report.is_healthy() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("❌ Language model '{}' is not reachable", report.generator.name);
        Ok(ExitCode::FAILURE)
    }
}
