//! Follow-up questions answered from a report's text.

use health_report_ai::{CompletionClient, CompletionRequest};

/// Token budget for follow-up answers.
pub const FOLLOW_UP_MAX_TOKENS: u32 = 1024;

/// Sampling temperature for follow-up answers.
pub const FOLLOW_UP_TEMPERATURE: f32 = 0.3;

/// Restricts answers to the supplied report context.
pub const FOLLOW_UP_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. The user is asking a \
follow-up question about a detailed health report they just reviewed. Base your answer ONLY on the \
information contained within the provided report context. If the answer isn't in the report, \
clearly state that the information is not available in the provided document. Do not use \
external knowledge.";

/// Builds the user prompt wrapping the report context and the question.
#[must_use]
pub fn build_follow_up_prompt(question: &str, report_context: &str) -> String {
    format!(
        "Here is the health report content:\n\
         --- BEGIN REPORT CONTEXT ---\n{report_context}\n--- END REPORT CONTEXT ---\n\n\
         My question is: {question}\n\n\
         Based on the report, what is the answer? If it's not mentioned, please say so."
    )
}

/// Answers `question` from `report_context` with `model`.
///
/// Provider failures come back as `"Error: ..."` answers.
pub async fn answer_question(
    client: &CompletionClient,
    model: &str,
    question: &str,
    report_context: &str,
) -> String {
    log::info!(
        "Answering follow-up with {model}: '{}'",
        question.chars().take(100).collect::<String>()
    );

    let request = CompletionRequest::new(build_follow_up_prompt(question, report_context), model)
        .with_system_prompt(FOLLOW_UP_SYSTEM_PROMPT)
        .with_max_tokens(FOLLOW_UP_MAX_TOKENS)
        .with_temperature(FOLLOW_UP_TEMPERATURE);

    client.complete_or_error_text(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use health_report_ai::AiError;
    use health_report_ai::providers::CompletionProvider;

    #[derive(Default)]
    struct RecordingProvider {
        seen: Mutex<Vec<(String, CompletionRequest)>>,
    }

    #[async_trait::async_trait]
    impl CompletionProvider for RecordingProvider {
        async fn complete(
            &self,
            system_prompt: &str,
            request: &CompletionRequest,
        ) -> Result<String, AiError> {
            self.seen
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), request.clone()));
            Ok("  The report lists 12 district hospitals.  ".to_string())
        }
    }

    #[test]
    fn prompt_wraps_context_in_markers() {
        let prompt = build_follow_up_prompt("How many hospitals?", "12 district hospitals.");
        assert!(prompt.starts_with("Here is the health report content:\n--- BEGIN REPORT CONTEXT ---\n"));
        assert!(prompt.contains("12 district hospitals.\n--- END REPORT CONTEXT ---\n\n"));
        assert!(prompt.contains("My question is: How many hospitals?\n\n"));
    }

    #[tokio::test]
    async fn uses_follow_up_model_and_budget() {
        let provider = Arc::new(RecordingProvider::default());
        let client = CompletionClient::new(provider.clone());

        let answer = answer_question(&client, "sonar", "How many hospitals?", "context").await;
        assert_eq!(answer, "The report lists 12 district hospitals.");

        let seen = provider.seen.lock().unwrap();
        let (system_prompt, request) = &seen[0];
        assert_eq!(system_prompt, FOLLOW_UP_SYSTEM_PROMPT);
        assert_eq!(request.model, "sonar");
        assert_eq!(request.max_tokens, FOLLOW_UP_MAX_TOKENS);
    }

    struct FailingProvider;

    #[async_trait::async_trait]
    impl CompletionProvider for FailingProvider {
        async fn complete(
            &self,
            _system_prompt: &str,
            _request: &CompletionRequest,
        ) -> Result<String, AiError> {
            Err(AiError::MissingCredential)
        }
    }

    #[tokio::test]
    async fn failures_become_error_answers() {
        let client = CompletionClient::new(Arc::new(FailingProvider));
        let answer = answer_question(&client, "sonar", "q", "context").await;
        assert_eq!(answer, "Error: API Key is not configured on the server.");
    }
}
