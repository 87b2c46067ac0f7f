//! `clinidraft education`: Draft patient education material.

use std::process::ExitCode;

use clinidraft_config::AppConfig;
use clinidraft_core::{AgeGroup, GenerationRequest, PatientEducationRequest, ReadingLevel};

pub struct Options {
    pub topic: String,
    pub reading_level: ReadingLevel,
    pub word_count: u32,
    pub include_sources: bool,
    pub age_group: Option<AgeGroup>,
    pub language: String,
}

impl Options {
    fn into_request(self) -> GenerationRequest {
        GenerationRequest::PatientEducation(PatientEducationRequest {
            topic: self.topic,
            reading_level: self.reading_level,
            word_count: self.word_count,
            include_sources: self.include_sources,
            patient_age_group: self.age_group,
            language: self.language,
        })
    }
}

pub async fn run(config: &AppConfig, options: Options) -> Result<ExitCode, Box<dyn std::error::Error>> {
    super::generate(config, options.into_request()).await
}
