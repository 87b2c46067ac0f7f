//! `clinidraft config`: Print the effective configuration.

use std::process::ExitCode;

use clinidraft_config::AppConfig;

pub fn show(config: &AppConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    print!("{}", config.to_toml()?);
    Ok(ExitCode::SUCCESS)
}
