//! Subcommand implementations.

pub mod check;
pub mod config_cmd;
pub mod education;
pub mod health;
pub mod summary;

use std::process::ExitCode;
use std::sync::Arc;

use clinidraft_config::AppConfig;
use clinidraft_core::{CallerIdentity, GenerationRequest, GenerationResult};
use clinidraft_pipeline::{GuardrailPipeline, Rejection};
use serde::Serialize;

/// Exit code for a request the pipeline rejected.
pub const EXIT_REJECTED: u8 = 2;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run one request through a fresh pipeline and print the outcome.
///
/// A result goes to stdout. A rejection goes to stderr and maps to
/// [`EXIT_REJECTED`].
pub async fn generate(
    config: &AppConfig,
    request: GenerationRequest,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let pipeline = GuardrailPipeline::from_config(config)?;
    let outcome = pipeline.run_as(&CallerIdentity::new("cli"), request).await;
    render(outcome)
}

fn render(
    outcome: Result<Arc<GenerationResult>, Rejection>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match outcome {
        Ok(result) => {
            print_json(result.as_ref())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(rejection) => {
            eprintln!("❌ {}", rejection.reason);
            eprintln!("{}", serde_json::to_string_pretty(&rejection)?);
            Ok(ExitCode::from(EXIT_REJECTED))
        }
    }
}
