//! Completion provider abstraction.
//!
//! A provider turns a system prompt plus a [`CompletionRequest`] into the
//! model's raw text. Cleanup happens in [`crate::CompletionClient`], so
//! providers only deal with transport and response shape.

pub mod perplexity;

use std::sync::Arc;
use std::time::Duration;

use crate::{AiError, CompletionRequest};

/// Default chat-completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Default request timeout. Deep-research completions can take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(900);

/// Trait for completion providers.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends one completion request and returns the raw model text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] describing the transport or response failure.
    async fn complete(
        &self,
        system_prompt: &str,
        request: &CompletionRequest,
    ) -> Result<String, AiError>;
}

/// Creates the completion provider from environment variables.
///
/// * `PERPLEXITY_API_KEY`: bearer credential. When it is missing the
///   provider is still created, but every completion fails fast with
///   [`AiError::MissingCredential`].
/// * `AI_BASE_URL`: chat-completions URL of any `OpenAI`-compatible
///   server (defaults to [`DEFAULT_API_URL`]).
/// * `AI_TIMEOUT_SECS`: request timeout (defaults to 900).
///
/// # Errors
///
/// Returns [`AiError::Unexpected`] if the HTTP client cannot be built.
pub fn create_provider_from_env() -> Result<Arc<dyn CompletionProvider>, AiError> {
    let api_key = std::env::var("PERPLEXITY_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    if api_key.is_none() {
        log::warn!(
            "PERPLEXITY_API_KEY not set. Report generation and follow-up answers will return \
             an error until it is configured."
        );
    }

    let endpoint = std::env::var("AI_BASE_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let timeout = std::env::var("AI_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

    log::info!(
        "Completion provider: {endpoint} (timeout {}s)",
        timeout.as_secs()
    );

    let provider = perplexity::PerplexityProvider::new(api_key, endpoint, timeout)?;
    Ok(Arc::new(provider))
}
