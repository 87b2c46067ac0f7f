//! Titles, key points and findings derived from a finished draft.
//!
//! Everything here is extracted from the draft's own sentences, so the
//! structured fields never say anything the content does not.

use clinidraft_core::{ContentDetails, GenerationRequest, title_case};

use crate::length::split_sentences;

const MAX_KEY_POINTS: usize = 4;
const MAX_FINDINGS: usize = 3;
const MAX_RECOMMENDATIONS: usize = 3;
const MAX_FOLLOW_UP: usize = 2;
const MAX_RISK_FACTORS: usize = 3;

const RECOMMENDATION_MARKERS: &[&str] = &["consider", "warrant", "recommend", "evaluation"];
const FOLLOW_UP_MARKERS: &[&str] = &["follow-up", "follow up", "monitor", "reassess", "review"];
const RISK_MARKERS: &[&str] = &["risk", "history of", "smok", "comorbid", "predispos"];

/// Used when the draft names no follow-up of its own.
const DEFAULT_FOLLOW_UP: &str = "Review with the treating team at the next scheduled assessment";

/// Used when the draft names no risk factors of its own.
const DEFAULT_RISK_FACTOR: &str = "Consider patient-specific risk assessment";

/// Build the variant-specific result fields for `request` from `draft`.
pub fn details_for(request: &GenerationRequest, draft: &str) -> ContentDetails {
    let sentences: Vec<String> = split_sentences(draft)
        .into_iter()
        .map(|s| s.trim_end_matches(['.', '!', '?']).to_string())
        .filter(|s| !s.is_empty())
        .collect();

    match request {
        GenerationRequest::PatientEducation(r) => ContentDetails::PatientEducation {
            title: education_title(&r.topic),
            key_points: key_points(&sentences),
        },
        GenerationRequest::ClinicalSummary(r) => {
            let recommendations = r
                .include_recommendations
                .then(|| matching(&sentences, RECOMMENDATION_MARKERS, MAX_RECOMMENDATIONS));
            let mut follow_up = matching(&sentences, FOLLOW_UP_MARKERS, MAX_FOLLOW_UP);
            if follow_up.is_empty() {
                follow_up.push(DEFAULT_FOLLOW_UP.to_string());
            }
            let mut risk_factors = matching(&sentences, RISK_MARKERS, MAX_RISK_FACTORS);
            if risk_factors.is_empty() {
                risk_factors.push(DEFAULT_RISK_FACTOR.to_string());
            }
            ContentDetails::ClinicalSummary {
                summary_type: r.summary_type,
                key_findings: key_findings(&sentences),
                risk_factors,
                recommendations,
                follow_up,
            }
        }
    }
}

/// "Understanding Diabetes Management: A Patient Guide"
pub fn education_title(topic: &str) -> String {
    format!("Understanding {}: A Patient Guide", title_case(topic))
}

/// The sentences after the opening one; the opening only if there is nothing else.
fn key_points(sentences: &[String]) -> Vec<String> {
    let body = if sentences.len() > 1 {
        &sentences[1..]
    } else {
        sentences
    };
    dedup(body.iter()).take(MAX_KEY_POINTS).collect()
}

/// Sentences that are not recommendations, follow-up or risk factors, skipping the opening.
fn key_findings(sentences: &[String]) -> Vec<String> {
    let body = sentences.get(1..).unwrap_or_default();
    let findings: Vec<String> = dedup(body.iter().filter(|s| {
        !contains_any(s, RECOMMENDATION_MARKERS)
            && !contains_any(s, FOLLOW_UP_MARKERS)
            && !contains_any(s, RISK_MARKERS)
    }))
    .take(MAX_FINDINGS)
    .collect();

    if findings.is_empty() {
        dedup(sentences.iter()).take(MAX_FINDINGS).collect()
    } else {
        findings
    }
}

fn matching(sentences: &[String], markers: &[&str], limit: usize) -> Vec<String> {
    dedup(sentences.iter().filter(|s| contains_any(s, markers)))
        .take(limit)
        .collect()
}

fn contains_any(sentence: &str, markers: &[&str]) -> bool {
    let lower = sentence.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

fn dedup<'a>(sentences: impl Iterator<Item = &'a String>) -> impl Iterator<Item = String> {
    let mut seen = std::collections::HashSet::new();
    sentences
        .filter(move |s| seen.insert((*s).clone()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinidraft_core::{ClinicalSummaryRequest, PatientEducationRequest, SummaryType};

    const CLINICAL_DRAFT: &str = "This discharge summary outlines the course. \
        Documented findings for renal function appear consistent with recovery. \
        Laboratory trends suggest a stable course. \
        The care team may consider further evaluation of anemia. \
        Follow-up of electrolytes may be arranged.";

    #[test]
    fn education_title_is_title_cased() {
        assert_eq!(
            education_title("diabetes management"),
            "Understanding Diabetes Management: A Patient Guide"
        );
        assert_eq!(
            education_title("living with HIV"),
            "Understanding Living With HIV: A Patient Guide"
        );
    }

    #[test]
    fn education_key_points_skip_opening_and_duplicates() {
        let request = GenerationRequest::PatientEducation(PatientEducationRequest::new("asthma"));
        let draft = "This guide explains asthma. Triggers vary. Triggers vary. \
                     Inhalers help many people. Keep a diary. Ask questions. Rest well.";
        match details_for(&request, draft) {
            ContentDetails::PatientEducation { title, key_points } => {
                assert_eq!(title, "Understanding Asthma: A Patient Guide");
                assert_eq!(
                    key_points,
                    vec![
                        "Triggers vary",
                        "Inhalers help many people",
                        "Keep a diary",
                        "Ask questions"
                    ]
                );
            }
            other => panic!("Expected PatientEducation, got: {other:?}"),
        }
    }

    #[test]
    fn clinical_details_sort_sentences_by_role() {
        let request = GenerationRequest::ClinicalSummary(ClinicalSummaryRequest::new(
            "notes",
            SummaryType::Discharge,
        ));
        match details_for(&request, CLINICAL_DRAFT) {
            ContentDetails::ClinicalSummary {
                summary_type,
                key_findings,
                risk_factors,
                recommendations,
                follow_up,
            } => {
                assert_eq!(summary_type, SummaryType::Discharge);
                assert_eq!(risk_factors, vec![DEFAULT_RISK_FACTOR]);
                assert_eq!(
                    key_findings,
                    vec![
                        "Documented findings for renal function appear consistent with recovery",
                        "Laboratory trends suggest a stable course",
                    ]
                );
                assert_eq!(
                    recommendations.unwrap(),
                    vec!["The care team may consider further evaluation of anemia"]
                );
                assert_eq!(follow_up, vec!["Follow-up of electrolytes may be arranged"]);
            }
            other => panic!("Expected ClinicalSummary, got: {other:?}"),
        }
    }

    #[test]
    fn recommendations_omitted_unless_requested() {
        let mut req = ClinicalSummaryRequest::new("notes", SummaryType::Progress);
        req.include_recommendations = false;
        match details_for(&GenerationRequest::ClinicalSummary(req), CLINICAL_DRAFT) {
            ContentDetails::ClinicalSummary {
                recommendations, ..
            } => assert!(recommendations.is_none()),
            other => panic!("Expected ClinicalSummary, got: {other:?}"),
        }
    }

    #[test]
    fn follow_up_falls_back_to_default() {
        let request = GenerationRequest::ClinicalSummary(ClinicalSummaryRequest::new(
            "notes",
            SummaryType::Consult,
        ));
        match details_for(&request, "Findings may reflect dehydration.") {
            ContentDetails::ClinicalSummary {
                key_findings,
                follow_up,
                ..
            } => {
                assert_eq!(key_findings, vec!["Findings may reflect dehydration"]);
                assert_eq!(follow_up, vec![DEFAULT_FOLLOW_UP]);
            }
            other => panic!("Expected ClinicalSummary, got: {other:?}"),
        }
    }

    #[test]
    fn risk_factors_pulled_from_draft() {
        let request = GenerationRequest::ClinicalSummary(ClinicalSummaryRequest::new(
            "notes",
            SummaryType::Admission,
        ));
        let draft = "This admission summary outlines the course. \
                     A history of smoking is documented. \
                     Cardiovascular risk factors include hypertension. \
                     Laboratory trends suggest a stable course.";
        match details_for(&request, draft) {
            ContentDetails::ClinicalSummary {
                key_findings,
                risk_factors,
                ..
            } => {
                assert_eq!(
                    risk_factors,
                    vec![
                        "A history of smoking is documented",
                        "Cardiovascular risk factors include hypertension",
                    ]
                );
                assert_eq!(key_findings, vec!["Laboratory trends suggest a stable course"]);
            }
            other => panic!("Expected ClinicalSummary, got: {other:?}"),
        }
    }
}
