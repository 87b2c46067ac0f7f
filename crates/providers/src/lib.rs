//! Language-model backends for Clinidraft.
//!
//! All backends implement the `clinidraft_core::Provider` trait.
//! [`build_from_config`] selects the backend named in configuration; the
//! pipeline wraps it in a [`RetryingProvider`].

pub mod retry;
pub mod template;

use std::sync::Arc;

use clinidraft_config::AppConfig;
use clinidraft_core::{Provider, ProviderError};

pub use retry::RetryingProvider;
pub use template::TemplateProvider;

/// Build the configured language-model backend.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    match config.model.provider.as_str() {
        "template" => Ok(Arc::new(TemplateProvider::new(&config.model.name))),
        other => Err(ProviderError::NotConfigured(format!(
            "unknown provider '{other}' (built-in providers: template)"
        ))),
    }
}
