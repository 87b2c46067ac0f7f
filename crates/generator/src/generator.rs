//! Content generator: prompt construction plus length shaping.

use std::sync::Arc;

use clinidraft_config::AppConfig;
use clinidraft_core::{
    AgeGroup, ContentKind, GenerationConstraints, GenerationPass, GenerationRequest,
    LengthOutcome, Provider, ProviderError, ProviderRequest, ReadingLevel,
};
use tracing::{debug, info};

use crate::length::{LengthCheck, LengthPolicy, truncate_to_sentences, word_count};
use crate::profile::{ReadingProfile, profile};

const SAFETY_GUIDELINES: &str = "You draft healthcare content for review by a clinician. \
Never promise cures or guaranteed outcomes. Do not give definitive treatment orders. \
Do not include names, contact details, dates of birth or record numbers.";

const CLINICAL_GUIDELINES: &str = "Use hedged clinical language (for example \"may\", \
\"consistent with\", \"consider\") and do not state diagnoses as certain.";

const CONSERVATIVE_GUIDELINES: &str = "The topic is sensitive. Use calm, non-judgmental \
wording, avoid graphic detail, and point the reader towards professional support.";

/// Everything the generator needs to know about a request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    pub kind: ContentKind,
    /// Topic for education, summary type for clinical text.
    pub subject: String,
    pub focus_areas: Vec<String>,
    /// Clinical notes to summarize. Rendered into the prompt only.
    pub source_material: Option<String>,
    pub age_group: Option<AgeGroup>,
    pub language: String,
    pub include_recommendations: bool,
    /// Sensitive topic detected during pre-check.
    pub conservative: bool,
}

impl PromptContext {
    pub fn from_request(request: &GenerationRequest, conservative: bool) -> Self {
        match request {
            GenerationRequest::PatientEducation(r) => Self {
                kind: ContentKind::PatientEducation,
                subject: r.topic.clone(),
                focus_areas: Vec::new(),
                source_material: None,
                age_group: r.patient_age_group,
                language: r.language.clone(),
                include_recommendations: false,
                conservative,
            },
            GenerationRequest::ClinicalSummary(r) => Self {
                kind: ContentKind::ClinicalSummary,
                subject: r.summary_type.as_str().to_string(),
                focus_areas: r.focus_areas.clone(),
                source_material: Some(r.patient_data.clone()),
                age_group: None,
                language: "english".into(),
                include_recommendations: r.include_recommendations,
                conservative,
            },
        }
    }

    fn system_prompt(&self, profile: &ReadingProfile) -> String {
        let mut system = format!(
            "{SAFETY_GUIDELINES}\n{}\nKeep sentences under {} words. {}",
            profile.instruction, profile.max_sentence_words, profile.vocabulary
        );
        if self.kind == ContentKind::ClinicalSummary {
            system.push('\n');
            system.push_str(CLINICAL_GUIDELINES);
        }
        if self.conservative {
            system.push('\n');
            system.push_str(CONSERVATIVE_GUIDELINES);
        }
        system
    }

    fn task_prompt(&self, target_words: u32, pass: &GenerationPass) -> String {
        let mut prompt = match self.kind {
            ContentKind::PatientEducation => format!(
                "Write patient education material about {} in {}, about {target_words} words.",
                self.subject, self.language
            ),
            ContentKind::ClinicalSummary => format!(
                "Write a {} summary of the clinical notes below, about {target_words} words.",
                self.subject
            ),
        };
        if let Some(age) = self.age_group {
            prompt.push_str(&format!(" The reader is a {} patient.", age.as_str()));
        }
        if !self.focus_areas.is_empty() {
            prompt.push_str(&format!(" Focus on: {}.", self.focus_areas.join(", ")));
        }
        if self.kind == ContentKind::ClinicalSummary && self.include_recommendations {
            prompt.push_str(" Close with considerations for follow-up.");
        }
        if let GenerationPass::Expansion { previous_draft } = pass {
            prompt.push_str(&format!(
                "\n\nThe draft below is too short. Elaborate on it with additional detail, \
                 keeping everything already written:\n\n{previous_draft}"
            ));
        }
        if let Some(notes) = &self.source_material {
            prompt.push_str(&format!("\n\nClinical notes:\n{notes}"));
        }
        prompt
    }
}

/// A length-shaped draft.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub text: String,
    pub word_count: u32,
    pub model: String,
    pub length_outcome: LengthOutcome,
    /// Provider calls made, including any expansion pass.
    pub provider_calls: u32,
}

/// Drives a provider and shapes its output to the requested length.
pub struct ContentGenerator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    policy: LengthPolicy,
}

impl ContentGenerator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            policy: LengthPolicy::default(),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self {
            provider,
            model: config.model.name.clone(),
            temperature: config.model.temperature,
            policy: LengthPolicy::from_config(&config.generation),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await.unwrap_or(false)
    }

    /// Produce a draft for `context` at `level`, shaped towards `target_words`.
    ///
    /// A failed draft call is an error. A failed expansion call is not: the
    /// draft in hand is accepted as short.
    pub async fn generate(
        &self,
        context: &PromptContext,
        level: ReadingLevel,
        target_words: u32,
    ) -> Result<Draft, ProviderError> {
        let profile = profile(level);
        let system = context.system_prompt(profile);

        let (mut text, mut model) = self
            .call(context, profile, &system, target_words, GenerationPass::Draft)
            .await?;
        let mut calls = 1;

        let mut outcome = match self.policy.check(word_count(&text), target_words) {
            LengthCheck::Within => LengthOutcome::WithinTolerance,
            LengthCheck::Long => {
                text = truncate_to_sentences(&text, target_words as usize);
                LengthOutcome::Truncated
            }
            LengthCheck::Short => LengthOutcome::AcceptedShort,
        };

        let mut passes = 0;
        while outcome == LengthOutcome::AcceptedShort && passes < self.policy.max_expansion_passes {
            passes += 1;
            calls += 1;
            let pass = GenerationPass::Expansion {
                previous_draft: text.clone(),
            };
            match self.call(context, profile, &system, target_words, pass).await {
                Ok((expanded, expanded_model)) if word_count(&expanded) > word_count(&text) => {
                    text = expanded;
                    model = expanded_model;
                    match self.policy.check(word_count(&text), target_words) {
                        LengthCheck::Short => {}
                        LengthCheck::Within => outcome = LengthOutcome::Expanded,
                        LengthCheck::Long => {
                            text = truncate_to_sentences(&text, target_words as usize);
                            outcome = LengthOutcome::Expanded;
                        }
                    }
                }
                Ok(_) => debug!(pass = passes, "Expansion pass did not lengthen the draft"),
                Err(e) => {
                    info!(pass = passes, error = %e, "Expansion pass failed, keeping short draft");
                    break;
                }
            }
        }

        let word_count = word_count(&text) as u32;
        debug!(
            target_words,
            word_count,
            ?outcome,
            provider_calls = calls,
            "Draft shaped"
        );

        Ok(Draft {
            text,
            word_count,
            model,
            length_outcome: outcome,
            provider_calls: calls,
        })
    }

    async fn call(
        &self,
        context: &PromptContext,
        profile: &ReadingProfile,
        system: &str,
        target_words: u32,
        pass: GenerationPass,
    ) -> Result<(String, String), ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            system: system.to_string(),
            prompt: context.task_prompt(target_words, &pass),
            temperature: self.temperature,
            // Roughly 1.5 tokens per word plus headroom.
            max_tokens: Some(target_words.saturating_mul(2).max(256)),
            constraints: GenerationConstraints {
                kind: context.kind,
                subject: context.subject.clone(),
                focus_areas: context.focus_areas.clone(),
                reading_level: profile.level,
                target_words,
                max_sentence_words: profile.max_sentence_words,
                conservative: context.conservative,
                pass,
            },
        };

        let response = self.provider.complete(request).await?;
        let text = response.text.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::EmptyCompletion(self.provider.name().to_string()));
        }
        Ok((text, response.model))
    }
}
