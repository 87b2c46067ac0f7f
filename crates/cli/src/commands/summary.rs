//! `clinidraft summary`: Summarize clinical notes read from a file.

use std::path::PathBuf;
use std::process::ExitCode;

use clinidraft_config::AppConfig;
use clinidraft_core::{ClinicalSummaryRequest, GenerationRequest, SummaryType};

pub struct Options {
    pub data_file: PathBuf,
    pub summary_type: SummaryType,
    pub word_count: u32,
    pub focus_areas: Vec<String>,
    pub include_recommendations: bool,
}

impl Options {
    fn into_request(self, patient_data: String) -> GenerationRequest {
        GenerationRequest::ClinicalSummary(ClinicalSummaryRequest {
            patient_data,
            summary_type: self.summary_type,
            word_count: self.word_count,
            include_recommendations: self.include_recommendations,
            focus_areas: self.focus_areas,
        })
    }
}

pub async fn run(config: &AppConfig, options: Options) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let patient_data = std::fs::read_to_string(&options.data_file).map_err(|e| {
        format!("cannot read {}: {e}", options.data_file.display())
    })?;
    tracing::debug!(
        path = %options.data_file.display(),
        chars = patient_data.chars().count(),
        "Loaded patient notes"
    );
    super::generate(config, options.into_request(patient_data)).await
}
