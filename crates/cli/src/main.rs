//! Clinidraft CLI: the main entry point.
//!
//! Commands:
//! - `education` Draft patient education material on a topic
//! - `summary`   Summarize clinical notes from a file
//! - `check`     Run the compliance rules over a piece of text
//! - `health`    Report provider, source and cache health
//! - `config`    Print the effective configuration

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clinidraft_config::AppConfig;
use clinidraft_core::{AgeGroup, ContentKind, Phase, ReadingLevel, SummaryType};

mod commands;

#[derive(Parser)]
#[command(
    name = "clinidraft",
    about = "Clinidraft: guarded drafting of patient education and clinical summaries",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of ~/.clinidraft/config.toml
    #[arg(short, long, global = true, env = "CLINIDRAFT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Draft patient education material
    Education {
        /// What the material is about
        #[arg(short, long)]
        topic: String,

        /// elementary, middle_school, high_school, college or professional
        #[arg(short, long, default_value = "high_school")]
        reading_level: ReadingLevel,

        /// Target length in words
        #[arg(short, long, default_value_t = 300)]
        word_count: u32,

        /// Skip the evidence lookup
        #[arg(long)]
        no_sources: bool,

        /// pediatric, adult or geriatric
        #[arg(long)]
        age_group: Option<AgeGroup>,

        #[arg(long, default_value = "english")]
        language: String,
    },

    /// Summarize clinical notes
    Summary {
        /// File containing the patient notes
        #[arg(short, long)]
        data_file: PathBuf,

        /// admission, discharge, progress or consult
        #[arg(short, long)]
        summary_type: SummaryType,

        /// Target length in words
        #[arg(short, long, default_value_t = 500)]
        word_count: u32,

        /// Area to emphasize (repeatable)
        #[arg(short, long = "focus")]
        focus: Vec<String>,

        /// Leave recommendations out of the summary
        #[arg(long)]
        no_recommendations: bool,
    },

    /// Evaluate text against the compliance rules
    Check {
        /// pre (caller input) or post (generated draft)
        #[arg(short, long, default_value = "post")]
        phase: Phase,

        /// education or clinical
        #[arg(short, long, default_value = "education")]
        kind: ContentKind,

        /// Text to evaluate
        text: String,
    },

    /// Check provider, evidence source and cache health
    Health,

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_with_env(path)?,
        None => AppConfig::load()?,
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json_logs || config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Education {
            topic,
            reading_level,
            word_count,
            no_sources,
            age_group,
            language,
        } => {
            commands::education::run(
                &config,
                commands::education::Options {
                    topic,
                    reading_level,
                    word_count,
                    include_sources: !no_sources,
                    age_group,
                    language,
                },
            )
            .await
        }
        Commands::Summary {
            data_file,
            summary_type,
            word_count,
            focus,
            no_recommendations,
        } => {
            commands::summary::run(
                &config,
                commands::summary::Options {
                    data_file,
                    summary_type,
                    word_count,
                    focus_areas: focus,
                    include_recommendations: !no_recommendations,
                },
            )
            .await
        }
        Commands::Check { phase, kind, text } => commands::check::run(&config, phase, kind, &text),
        Commands::Health => commands::health::run(&config).await,
        Commands::Config => commands::config_cmd::show(&config),
    }
}
