//! Generation requests: the tagged sum type accepted by the pipeline.
//!
//! Requests are validated and normalized at the boundary. Every downstream
//! stage matches exhaustively on [`GenerationRequest`].

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Inclusive lower bound for `word_count`.
pub const MIN_WORD_COUNT: u32 = 50;
/// Inclusive upper bound for `word_count`.
pub const MAX_WORD_COUNT: u32 = 2000;
/// Maximum topic length in characters (after trimming).
pub const MAX_TOPIC_CHARS: usize = 200;
/// Maximum clinical input length in characters.
pub const MAX_PATIENT_DATA_CHARS: usize = 10_000;

/// Target reading level for generated content.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ReadingLevel {
    Elementary,
    MiddleSchool,
    #[default]
    HighSchool,
    College,
    Professional,
}

impl ReadingLevel {
    pub const ALL: [ReadingLevel; 5] = [
        ReadingLevel::Elementary,
        ReadingLevel::MiddleSchool,
        ReadingLevel::HighSchool,
        ReadingLevel::College,
        ReadingLevel::Professional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingLevel::Elementary => "elementary",
            ReadingLevel::MiddleSchool => "middle_school",
            ReadingLevel::HighSchool => "high_school",
            ReadingLevel::College => "college",
            ReadingLevel::Professional => "professional",
        }
    }
}

impl std::fmt::Display for ReadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReadingLevel {
    type Err = String;

    /// Accepts both `middle_school` and `middle-school` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ReadingLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| format!("unknown reading level '{s}'"))
    }
}

/// Audience age group for patient education material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Pediatric,
    Adult,
    Geriatric,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Pediatric => "pediatric",
            AgeGroup::Adult => "adult",
            AgeGroup::Geriatric => "geriatric",
        }
    }
}

impl std::str::FromStr for AgeGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pediatric" => Ok(AgeGroup::Pediatric),
            "adult" => Ok(AgeGroup::Adult),
            "geriatric" => Ok(AgeGroup::Geriatric),
            other => Err(format!("unknown age group '{other}'")),
        }
    }
}

/// Kind of clinical summary to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    Admission,
    Discharge,
    Progress,
    Consult,
}

impl SummaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryType::Admission => "admission",
            SummaryType::Discharge => "discharge",
            SummaryType::Progress => "progress",
            SummaryType::Consult => "consult",
        }
    }
}

impl std::fmt::Display for SummaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SummaryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admission" => Ok(SummaryType::Admission),
            "discharge" => Ok(SummaryType::Discharge),
            "progress" => Ok(SummaryType::Progress),
            "consult" => Ok(SummaryType::Consult),
            other => Err(format!("unknown summary type '{other}'")),
        }
    }
}

/// Which request variant a piece of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    PatientEducation,
    ClinicalSummary,
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "education" | "patient_education" => Ok(ContentKind::PatientEducation),
            "clinical" | "clinical_summary" => Ok(ContentKind::ClinicalSummary),
            other => Err(format!("unknown content kind '{other}'")),
        }
    }
}

/// Request for patient education material on a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientEducationRequest {
    pub topic: String,

    #[serde(default)]
    pub reading_level: ReadingLevel,

    #[serde(default = "default_education_word_count")]
    pub word_count: u32,

    #[serde(default = "default_true")]
    pub include_sources: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_age_group: Option<AgeGroup>,

    #[serde(default = "default_language")]
    pub language: String,
}

impl PatientEducationRequest {
    /// A request with default settings for the given topic.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            reading_level: ReadingLevel::default(),
            word_count: default_education_word_count(),
            include_sources: true,
            patient_age_group: None,
            language: default_language(),
        }
    }
}

/// Request for a clinical summary of free-text patient data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSummaryRequest {
    pub patient_data: String,

    pub summary_type: SummaryType,

    #[serde(default = "default_summary_word_count")]
    pub word_count: u32,

    #[serde(default = "default_true")]
    pub include_recommendations: bool,

    #[serde(default)]
    pub focus_areas: Vec<String>,
}

impl ClinicalSummaryRequest {
    pub fn new(patient_data: impl Into<String>, summary_type: SummaryType) -> Self {
        Self {
            patient_data: patient_data.into(),
            summary_type,
            word_count: default_summary_word_count(),
            include_recommendations: true,
            focus_areas: Vec::new(),
        }
    }
}

fn default_education_word_count() -> u32 {
    300
}
fn default_summary_word_count() -> u32 {
    500
}
fn default_true() -> bool {
    true
}
fn default_language() -> String {
    "english".into()
}

/// A generation request: either patient education or a clinical summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationRequest {
    PatientEducation(PatientEducationRequest),
    ClinicalSummary(ClinicalSummaryRequest),
}

impl GenerationRequest {
    pub fn kind(&self) -> ContentKind {
        match self {
            GenerationRequest::PatientEducation(_) => ContentKind::PatientEducation,
            GenerationRequest::ClinicalSummary(_) => ContentKind::ClinicalSummary,
        }
    }

    pub fn word_count(&self) -> u32 {
        match self {
            GenerationRequest::PatientEducation(r) => r.word_count,
            GenerationRequest::ClinicalSummary(r) => r.word_count,
        }
    }

    /// Reading level the draft is written at. Clinical summaries are always
    /// professional-level.
    pub fn reading_level(&self) -> ReadingLevel {
        match self {
            GenerationRequest::PatientEducation(r) => r.reading_level,
            GenerationRequest::ClinicalSummary(_) => ReadingLevel::Professional,
        }
    }

    /// The caller-supplied text screened by the pre-check.
    pub fn screened_input(&self) -> &str {
        match self {
            GenerationRequest::PatientEducation(r) => &r.topic,
            GenerationRequest::ClinicalSummary(r) => &r.patient_data,
        }
    }

    /// Reject malformed requests before any pipeline work.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            GenerationRequest::PatientEducation(r) => {
                check_text("topic", &r.topic, MAX_TOPIC_CHARS)?;
                check_word_count(r.word_count)?;
                if r.language.trim().is_empty() {
                    return Err(ValidationError::EmptyField { field: "language" });
                }
            }
            GenerationRequest::ClinicalSummary(r) => {
                check_text("patient_data", &r.patient_data, MAX_PATIENT_DATA_CHARS)?;
                check_word_count(r.word_count)?;
            }
        }
        Ok(())
    }

    /// Canonical form used for fingerprinting and screening.
    ///
    /// Topic and language are trimmed and lower-cased; focus areas are trimmed
    /// and empty entries dropped (their order is preserved).
    pub fn normalized(self) -> Self {
        match self {
            GenerationRequest::PatientEducation(mut r) => {
                r.topic = r.topic.trim().to_lowercase();
                r.language = r.language.trim().to_lowercase();
                GenerationRequest::PatientEducation(r)
            }
            GenerationRequest::ClinicalSummary(mut r) => {
                r.patient_data = r.patient_data.trim().to_string();
                r.focus_areas = r
                    .focus_areas
                    .into_iter()
                    .map(|area| area.trim().to_string())
                    .filter(|area| !area.is_empty())
                    .collect();
                GenerationRequest::ClinicalSummary(r)
            }
        }
    }

    /// The form shown back to the caller: like [`normalized`](Self::normalized),
    /// but the topic keeps its casing (so "HIV" stays "HIV") and inner runs of
    /// whitespace collapse to one space.
    pub fn display_form(&self) -> Self {
        match self {
            GenerationRequest::PatientEducation(r) => {
                let mut r = r.clone();
                r.topic = r.topic.split_whitespace().collect::<Vec<_>>().join(" ");
                r.language = r.language.trim().to_lowercase();
                GenerationRequest::PatientEducation(r)
            }
            GenerationRequest::ClinicalSummary(_) => self.clone().normalized(),
        }
    }
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    let actual = trimmed.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

fn check_word_count(value: u32) -> Result<(), ValidationError> {
    if !(MIN_WORD_COUNT..=MAX_WORD_COUNT).contains(&value) {
        return Err(ValidationError::WordCountOutOfRange {
            value,
            min: MIN_WORD_COUNT,
            max: MAX_WORD_COUNT,
        });
    }
    Ok(())
}
