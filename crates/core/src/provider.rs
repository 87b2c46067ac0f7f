//! Provider trait: the abstraction over language-model backends.
//!
//! A Provider turns a prompt plus generation constraints into draft text.
//! The pipeline never knows which backend it is talking to.
//!
//! Implementations: the offline template model, the retry decorator, and
//! test doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::request::{ContentKind, ReadingLevel};

/// Which pass of the length shaper issued the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "pass", rename_all = "snake_case")]
pub enum GenerationPass {
    /// The first draft.
    Draft,
    /// The single bounded elaboration pass over a short draft.
    Expansion { previous_draft: String },
}

/// Structured constraints that accompany the prompt.
///
/// Backends that only understand free text can ignore these; the same
/// information is rendered into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConstraints {
    pub kind: ContentKind,
    /// What the draft is about: the topic, or the summary type for clinical text.
    pub subject: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_areas: Vec<String>,
    pub reading_level: ReadingLevel,
    pub target_words: u32,
    /// Upper bound on words per sentence for this reading level.
    pub max_sentence_words: u32,
    /// Request more conservative phrasing (sensitive topics).
    #[serde(default)]
    pub conservative: bool,
    pub pass: GenerationPass,
}

/// A request to a language-model backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "template-v1", "gpt-4o")
    pub model: String,

    /// System instructions (safety guidelines, reading level profile)
    pub system: String,

    /// The task prompt
    pub prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    pub constraints: GenerationConstraints,
}

fn default_temperature() -> f32 {
    0.3
}

/// Token usage information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated text
    pub text: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// The core Provider trait.
///
/// Every language-model backend implements this trait. The content generator
/// calls `complete()` without knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "template", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
