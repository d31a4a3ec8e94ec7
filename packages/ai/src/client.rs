//! The completion client: provider call followed by response cleanup.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;

use crate::AiError;
use crate::cleanup::clean_response;
use crate::providers::CompletionProvider;

/// System prompt used when a request does not bring its own.
///
/// Asks for report content only, with any reasoning enclosed in
/// `<think>` tags and the output starting with the exact report title.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI report writing machine. Your SOLE function \
is to produce the report text EXACTLY as requested by the user's prompt structure. DO NOT include \
ANY conversational phrases, introductory remarks, summaries of your understanding, \
self-corrections, or ANY text whatsoever that is not part of the direct report content. If you \
have any internal planning, thoughts, or meta-commentary about the generation process, you MUST \
enclose this information in <think>Your thought here</think> tags. These tags and their content \
will be programmatically removed and MUST NOT appear in the final report body. Your final output, \
after these <think> tags are notionally removed, MUST begin *EXACTLY* with the specified report \
title (e.g., 'Comprehensive Report on Healthcare in...').";

/// Default completion token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// A single completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// User prompt.
    pub prompt: String,
    /// Provider model identifier.
    pub model: String,
    /// System prompt; [`DEFAULT_SYSTEM_PROMPT`] when `None`.
    pub system_prompt: Option<String>,
    /// Maximum tokens the model may generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    /// Creates a request using the default system prompt, token budget
    /// and temperature.
    #[must_use]
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system_prompt: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Overrides the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Overrides the token budget.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Overrides the temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// The system prompt that will actually be sent.
    #[must_use]
    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

/// Obtains cleaned completions from a [`CompletionProvider`].
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
}

impl CompletionClient {
    /// Wraps a provider.
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Sends the request and returns the cleaned model text.
    ///
    /// A panicking provider is reported as [`AiError::Unexpected`]
    /// instead of unwinding into the caller.
    ///
    /// # Errors
    ///
    /// Returns the provider's [`AiError`] when no completion text could
    /// be obtained.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        log::info!(
            "Sending prompt (model: {}, prompt length: {} chars, max tokens: {})",
            request.model,
            request.prompt.len(),
            request.max_tokens
        );

        let call = self
            .provider
            .complete(request.effective_system_prompt(), request);
        let raw = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(AiError::Unexpected {
                message: panic_message(panic.as_ref()),
            }),
        }
        .inspect_err(|e| log::error!("Completion failed (model: {}): {e}", request.model))?;

        log::info!(
            "Raw response received from {} (length: {} chars)",
            request.model,
            raw.len()
        );

        let cleaned = clean_response(&raw);
        log::info!("Final cleaned content length: {} chars", cleaned.text.len());
        Ok(cleaned.text)
    }

    /// Like [`Self::complete`], but renders failures as `"Error: ..."`
    /// text so the result can be used directly as report content.
    pub async fn complete_or_error_text(&self, request: &CompletionRequest) -> String {
        self.complete(request)
            .await
            .unwrap_or_else(|e| e.to_report_text())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "completion provider panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedProvider {
        response: Result<String, AiError>,
        seen_system_prompts: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn complete(
            &self,
            system_prompt: &str,
            _request: &CompletionRequest,
        ) -> Result<String, AiError> {
            self.seen_system_prompts
                .lock()
                .unwrap()
                .push(system_prompt.to_string());
            self.response.clone()
        }
    }

    struct PanickingProvider;

    #[async_trait::async_trait]
    impl CompletionProvider for PanickingProvider {
        async fn complete(
            &self,
            _system_prompt: &str,
            _request: &CompletionRequest,
        ) -> Result<String, AiError> {
            panic!("boom");
        }
    }

    fn scripted(response: Result<String, AiError>) -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider {
            response,
            seen_system_prompts: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn cleans_successful_responses() {
        let provider = scripted(Ok(
            "<think>outline</think>Okay. Comprehensive Report on Healthcare in Oslo\n...".to_string(),
        ));
        let client = CompletionClient::new(provider);
        let text = client
            .complete(&CompletionRequest::new("prompt", "sonar"))
            .await
            .unwrap();
        assert_eq!(text, "Comprehensive Report on Healthcare in Oslo\n...");
    }

    #[tokio::test]
    async fn uses_default_system_prompt_unless_overridden() {
        let provider = scripted(Ok("answer".to_string()));
        let client = CompletionClient::new(provider.clone());
        client
            .complete(&CompletionRequest::new("q", "sonar"))
            .await
            .unwrap();
        client
            .complete(&CompletionRequest::new("q", "sonar").with_system_prompt("custom"))
            .await
            .unwrap();
        let seen = provider.seen_system_prompts.lock().unwrap();
        assert_eq!(seen[0], DEFAULT_SYSTEM_PROMPT);
        assert_eq!(seen[1], "custom");
    }

    #[tokio::test]
    async fn errors_render_as_error_text() {
        let client = CompletionClient::new(scripted(Err(AiError::Network {
            message: "connection refused".to_string(),
        })));
        let text = client
            .complete_or_error_text(&CompletionRequest::new("q", "sonar"))
            .await;
        assert_eq!(
            text,
            "Error: AI API request failed due to a network issue: connection refused"
        );
    }

    #[tokio::test]
    async fn provider_panics_become_unexpected_errors() {
        let client = CompletionClient::new(Arc::new(PanickingProvider));
        let err = client
            .complete(&CompletionRequest::new("q", "sonar"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AiError::Unexpected {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn request_builder_overrides_defaults() {
        let request = CompletionRequest::new("p", "m")
            .with_max_tokens(1024)
            .with_temperature(0.1);
        assert_eq!(request.max_tokens, 1024);
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(request.effective_system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }
}
