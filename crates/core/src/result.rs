//! Pipeline output: the assembled, immutable generation result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::request::{ReadingLevel, SummaryType};

/// Disclaimer attached to every patient education draft.
pub const EDUCATION_DISCLAIMER: &str = "This content is AI-generated and intended as a draft. \
It must be reviewed and approved by a qualified healthcare professional before use.";

/// Disclaimer attached to every clinical summary draft.
pub const CLINICAL_DISCLAIMER: &str = "This summary is AI-generated and intended to assist \
healthcare professionals. Clinical decisions should always be based on professional judgment \
and patient assessment.";

/// A literature record supporting the draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSource {
    pub title: String,
    pub authors: Vec<String>,
    pub journal: String,
    pub year: u16,
    /// DOI or database accession.
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Relevance in `[0, 1]`.
    pub relevance_score: f32,
}

impl EvidenceSource {
    /// Ranking order: relevance descending, then year descending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .relevance_score
            .partial_cmp(&self.relevance_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.year.cmp(&self.year))
    }
}

/// How the length shaper arrived at the final draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthOutcome {
    /// The first draft was already inside the tolerance band.
    WithinTolerance,
    /// The draft was cut back at a sentence boundary.
    Truncated,
    /// The expansion pass brought the draft into (or past) the band.
    Expanded,
    /// The expansion pass was spent and the draft is still short.
    AcceptedShort,
}

/// Variant-specific parts of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentDetails {
    PatientEducation {
        title: String,
        key_points: Vec<String>,
    },
    ClinicalSummary {
        summary_type: SummaryType,
        key_findings: Vec<String>,
        /// Risk factors named in the draft, or a prompt to assess them.
        risk_factors: Vec<String>,
        /// Present only when the request asked for recommendations.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recommendations: Option<Vec<String>>,
        follow_up: Vec<String>,
    },
}

/// Generation metadata and safety annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub generated_at: DateTime<Utc>,
    pub actual_word_count: u32,
    pub target_word_count: u32,
    pub reading_level: ReadingLevel,
    pub model_used: String,
    pub length_outcome: LengthOutcome,
    /// Advisory compliance messages, in rule order.
    pub safety_flags: Vec<String>,
    /// Always `true`: every draft needs clinician review.
    pub requires_review: bool,
}

/// The complete pipeline output for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Id of the run that produced this result (cache hits keep the original).
    pub request_id: Uuid,
    pub fingerprint: String,
    pub content: String,
    pub details: ContentDetails,
    pub sources: Vec<EvidenceSource>,
    pub metadata: GenerationMetadata,
    pub disclaimer: String,
}
