//! Offline template language model.
//!
//! A deterministic stand-in for a hosted model. It composes drafts from
//! sentence templates keyed by register (plain, standard, technical or
//! clinical), filling in the subject and focus areas from the request
//! constraints. Output never exceeds `target_words` and lands within a few
//! words of it, so the length shaper sees realistic drafts.
//!
//! The model never sees patient data: clinical drafts are built from the
//! summary type and focus areas only.

use async_trait::async_trait;
use clinidraft_core::{
    ContentKind, GenerationConstraints, GenerationPass, Provider, ProviderError,
    ProviderRequest, ProviderResponse, ReadingLevel, Usage, capitalize_first,
};
use tracing::debug;

/// Sentence templates for one register. `{s}` is the subject, `{a}` an aspect.
struct Register {
    opening: &'static str,
    templates: &'static [&'static str],
    aspects: &'static [&'static str],
    /// Fixed short sentences used to close the gap to the target.
    fillers: &'static [&'static str],
}

const PLAIN: Register = Register {
    opening: "This page talks about {s} in simple words.",
    templates: &[
        "Learning about {a} can help with {s}.",
        "Ask your care team about {a}.",
        "Small steps with {a} may help a lot.",
        "It is okay to ask for help with {a}.",
        "Your family can help you with {a}.",
        "Everyone is different with {a}.",
    ],
    aspects: &[
        "daily habits",
        "healthy food",
        "staying active",
        "your medicine",
        "warning signs",
        "check-up visits",
        "good sleep",
        "feeling stressed",
    ],
    fillers: &[
        "Write your questions down.",
        "Keep a simple notebook.",
        "Ask questions anytime.",
    ],
};

const STANDARD: Register = Register {
    opening: "This guide explains {s} and what it can mean for your everyday life.",
    templates: &[
        "Learning about {a} can make living with {s} feel more manageable.",
        "Your care team can explain how {a} relates to {s} in your situation.",
        "Many people find that small, steady changes in {a} may help over time.",
        "Questions about {a} are a good thing to bring to your next visit.",
        "Plans for {a} may look different from one person to the next.",
        "Keeping track of {a} can help you notice what works for you.",
    ],
    aspects: &[
        "daily routines",
        "healthy eating",
        "physical activity",
        "medicines",
        "warning signs",
        "follow-up visits",
        "sleep",
        "stress",
        "family support",
        "tracking symptoms",
    ],
    fillers: &[
        "Keep a simple health notebook.",
        "Write down your questions.",
        "Support is available.",
    ],
};

const TECHNICAL: Register = Register {
    opening: "This overview summarizes current understanding of {s} for informed readers.",
    templates: &[
        "Current guidance on {s} emphasizes individualized assessment of {a}.",
        "Evidence suggests that structured attention to {a} may improve outcomes in {s}.",
        "Clinicians may consider {a} when tailoring management of {s}.",
        "Shared decision-making around {a} is generally encouraged.",
        "Variation in {a} between individuals can influence the course of {s}.",
        "Periodic review of {a} may help identify changes early.",
    ],
    aspects: &[
        "risk factors",
        "pharmacologic options",
        "lifestyle modification",
        "monitoring strategies",
        "comorbid conditions",
        "adherence",
        "patient-reported outcomes",
        "care coordination",
    ],
    fillers: &[
        "Individual response varies considerably.",
        "Individual response varies.",
        "Evidence continues evolving.",
    ],
};

const CLINICAL: Register = Register {
    opening: "This {s} summary outlines the available clinical information in a structured format.",
    templates: &[
        "Documented findings for {a} appear consistent with the working assessment.",
        "Findings related to {a} may warrant continued monitoring.",
        "Review of {a} suggests a stable course, although reassessment could be considered.",
        "The care team may consider further evaluation of {a} as clinically indicated.",
        "Changes in {a} are best interpreted in the context of the full record.",
        "Follow-up of {a} may be arranged according to the clinical course.",
    ],
    aspects: &[
        "presenting symptoms",
        "vital sign trends",
        "laboratory findings",
        "current medications",
        "functional status",
        "pending results",
    ],
    fillers: &[
        "Clinical correlation is advised.",
        "Findings may evolve.",
        "Correlation is advised.",
    ],
};

const CONSERVATIVE_OPENING: &str =
    "This topic can be hard to talk about, and support is available at any time.";

impl Register {
    fn for_constraints(constraints: &GenerationConstraints) -> &'static Register {
        match (constraints.kind, constraints.reading_level) {
            (ContentKind::ClinicalSummary, _) => &CLINICAL,
            (_, ReadingLevel::Elementary | ReadingLevel::MiddleSchool) => &PLAIN,
            (_, ReadingLevel::HighSchool | ReadingLevel::College) => &STANDARD,
            (_, ReadingLevel::Professional) => &TECHNICAL,
        }
    }
}

/// A deterministic, offline provider.
pub struct TemplateProvider {
    model: String,
}

impl TemplateProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    fn compose(&self, constraints: &GenerationConstraints) -> String {
        let register = Register::for_constraints(constraints);
        let target = constraints.target_words as usize;
        let max_sentence = constraints.max_sentence_words as usize;

        let mut draft = Draft::default();
        let start = match &constraints.pass {
            GenerationPass::Draft => {
                if constraints.conservative {
                    draft.push_if_fits(CONSERVATIVE_OPENING.to_string(), target);
                }
                draft.push_if_fits(fill(register.opening, &constraints.subject, ""), target);
                0
            }
            GenerationPass::Expansion { previous_draft } => {
                draft.seed(previous_draft);
                draft.sentences
            }
        };

        let aspects: Vec<&str> = constraints
            .focus_areas
            .iter()
            .map(String::as_str)
            .chain(register.aspects.iter().copied())
            .collect();
        let template_count = register.templates.len();

        // Walk the template/aspect grid, skipping sentences that would overshoot,
        // until a full lap of templates adds nothing.
        let mut index = start;
        let mut misses = 0;
        while misses < template_count {
            let template = register.templates[index % template_count];
            let aspect = aspects[(index + index / template_count) % aspects.len()];
            let sentence = fill(template, &constraints.subject, aspect);
            let words = word_count(&sentence);
            if words <= max_sentence && draft.push_if_fits(sentence, target) {
                misses = 0;
            } else {
                misses += 1;
            }
            index += 1;
        }

        for filler in register.fillers {
            draft.push_if_fits(filler.to_string(), target);
        }

        draft.text
    }
}

#[derive(Default)]
struct Draft {
    text: String,
    words: usize,
    sentences: usize,
}

impl Draft {
    fn seed(&mut self, previous: &str) {
        self.text = previous.trim().to_string();
        self.words = word_count(&self.text);
        self.sentences = self.text.matches(['.', '!', '?']).count();
    }

    fn push_if_fits(&mut self, sentence: String, target: usize) -> bool {
        let words = word_count(&sentence);
        if self.words + words > target {
            return false;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(&sentence);
        self.words += words;
        self.sentences += 1;
        true
    }
}

fn fill(template: &str, subject: &str, aspect: &str) -> String {
    let sentence = template.replace("{s}", subject).replace("{a}", aspect);
    capitalize_first(&sentence)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[async_trait]
impl Provider for TemplateProvider {
    fn name(&self) -> &str {
        "template"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let text = self.compose(&request.constraints);
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion(format!(
                "no template fits a {}-word target",
                request.constraints.target_words
            )));
        }

        let prompt_tokens = word_count(&request.system) + word_count(&request.prompt);
        let completion_tokens = word_count(&text);
        debug!(
            model = %self.model,
            completion_tokens,
            target_words = request.constraints.target_words,
            "Template model composed draft"
        );

        Ok(ProviderResponse {
            text,
            model: self.model.clone(),
            usage: Some(Usage {
                prompt_tokens: prompt_tokens as u32,
                completion_tokens: completion_tokens as u32,
                total_tokens: (prompt_tokens + completion_tokens) as u32,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(kind: ContentKind, level: ReadingLevel, target: u32) -> GenerationConstraints {
        GenerationConstraints {
            kind,
            subject: "diabetes management".into(),
            focus_areas: vec![],
            reading_level: level,
            target_words: target,
            max_sentence_words: 30,
            conservative: false,
            pass: GenerationPass::Draft,
        }
    }

    fn request(constraints: GenerationConstraints) -> ProviderRequest {
        ProviderRequest {
            model: "template-v1".into(),
            system: "Write clearly.".into(),
            prompt: "Write about diabetes management.".into(),
            temperature: 0.3,
            max_tokens: None,
            constraints,
        }
    }

    #[tokio::test]
    async fn draft_lands_just_under_target() {
        let provider = TemplateProvider::new("template-v1");
        for level in ReadingLevel::ALL {
            for target in [50, 120, 300, 2000] {
                let response = provider
                    .complete(request(constraints(ContentKind::PatientEducation, level, target)))
                    .await
                    .unwrap();
                let words = word_count(&response.text) as u32;
                assert!(
                    words <= target && words + 5 >= target,
                    "{level:?}/{target}: got {words} words"
                );
            }
        }
    }

    #[tokio::test]
    async fn output_is_deterministic() {
        let provider = TemplateProvider::new("template-v1");
        let c = constraints(ContentKind::PatientEducation, ReadingLevel::HighSchool, 300);
        let a = provider.complete(request(c.clone())).await.unwrap();
        let b = provider.complete(request(c)).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn sentences_respect_reading_level_limit() {
        let provider = TemplateProvider::new("template-v1");
        let mut c = constraints(ContentKind::PatientEducation, ReadingLevel::Elementary, 200);
        c.max_sentence_words = 12;
        c.subject = "asthma".into();
        let response = provider.complete(request(c)).await.unwrap();
        for sentence in response.text.split_terminator('.') {
            assert!(word_count(sentence) <= 12, "too long: {sentence:?}");
        }
    }

    #[tokio::test]
    async fn clinical_draft_uses_focus_areas_and_hedges() {
        let provider = TemplateProvider::new("template-v1");
        let mut c = constraints(ContentKind::ClinicalSummary, ReadingLevel::Professional, 150);
        c.subject = "discharge".into();
        c.focus_areas = vec!["renal function".into()];
        let response = provider.complete(request(c)).await.unwrap();
        assert!(response.text.starts_with("This discharge summary"));
        assert!(response.text.contains("renal function"));
        assert!(response.text.contains("may"));
    }

    #[tokio::test]
    async fn expansion_extends_previous_draft() {
        let provider = TemplateProvider::new("template-v1");
        let mut c = constraints(ContentKind::PatientEducation, ReadingLevel::HighSchool, 200);
        let previous = "Diabetes management is a daily effort.".to_string();
        c.pass = GenerationPass::Expansion {
            previous_draft: previous.clone(),
        };
        let response = provider.complete(request(c)).await.unwrap();
        assert!(response.text.starts_with(&previous));
        assert!(word_count(&response.text) > 190);
    }

    #[tokio::test]
    async fn conservative_flag_adds_supportive_opening() {
        let provider = TemplateProvider::new("template-v1");
        let mut c = constraints(ContentKind::PatientEducation, ReadingLevel::HighSchool, 100);
        c.conservative = true;
        let response = provider.complete(request(c)).await.unwrap();
        assert!(response.text.starts_with(CONSERVATIVE_OPENING));
    }

    #[tokio::test]
    async fn reports_usage_and_model() {
        let provider = TemplateProvider::new("template-v2");
        let response = provider
            .complete(request(constraints(
                ContentKind::PatientEducation,
                ReadingLevel::College,
                80,
            )))
            .await
            .unwrap();
        assert_eq!(response.model, "template-v2");
        let usage = response.usage.unwrap();
        assert_eq!(usage.completion_tokens as usize, word_count(&response.text));
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
    }
}
