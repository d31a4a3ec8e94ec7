//! Perplexity chat-completions provider.
//!
//! Speaks the `OpenAI`-compatible `/chat/completions` protocol, so it
//! also works against local servers when `AI_BASE_URL` points elsewhere.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::CompletionProvider;
use crate::{AiError, CompletionRequest};

/// Fallback message when a response has neither content nor an error.
const UNKNOWN_FORMAT: &str = "Unknown API response format.";

/// Perplexity API provider.
pub struct PerplexityProvider {
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl PerplexityProvider {
    /// Creates a new provider.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Unexpected`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Unexpected {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            api_key,
            endpoint,
            timeout,
            client,
        })
    }

    fn transport_error(&self, err: &reqwest::Error) -> AiError {
        if err.is_timeout() {
            AiError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if err.is_connect() || err.is_request() || err.is_body() {
            AiError::Network {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            AiError::MalformedResponse {
                message: err.to_string(),
            }
        } else {
            AiError::Unexpected {
                message: err.to_string(),
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Extracts `error.message` from an error body, falling back to the raw
/// body text when it is not the structured shape.
fn error_details(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| body.to_string())
}

/// Pulls `choices[0].message.content` out of a successful response body.
fn parse_completion_body(body: &str) -> Result<String, AiError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| AiError::MalformedResponse {
            message: format!("{UNKNOWN_FORMAT} ({e})"),
        })?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);

    content.ok_or_else(|| AiError::MalformedResponse {
        message: response
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| UNKNOWN_FORMAT.to_string()),
    })
}

#[async_trait::async_trait]
impl CompletionProvider for PerplexityProvider {
    async fn complete(
        &self,
        system_prompt: &str,
        request: &CompletionRequest,
    ) -> Result<String, AiError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AiError::MissingCredential);
        };

        let payload = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            let message = error_details(&body);
            log::error!("HTTP error (model: {}): {status} - {message}", request.model);
            return Err(AiError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        parse_completion_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Accepts one connection on a local port and reads the request.
    /// Replies with `response` when given, otherwise holds the connection
    /// open without answering. Returns the endpoint URL.
    async fn serve_once(response: Option<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            if let Some(response) = response {
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            } else {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        });
        format!("http://{addr}/chat/completions")
    }

    async fn read_request(socket: &mut TcpStream) {
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);

            let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&request[..end]);
            let content_length = headers
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + 4 + content_length {
                return;
            }
        }
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn provider(endpoint: String, timeout: Duration) -> PerplexityProvider {
        PerplexityProvider::new(Some("test-key".to_string()), endpoint, timeout).unwrap()
    }

    #[test]
    fn parses_first_choice_content() {
        let body = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "hello" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        })
        .to_string();
        assert_eq!(parse_completion_body(&body).unwrap(), "hello");
    }

    #[test]
    fn surfaces_api_error_message_when_choices_missing() {
        let body = serde_json::json!({ "error": { "message": "model overloaded" } }).to_string();
        assert_eq!(
            parse_completion_body(&body).unwrap_err(),
            AiError::MalformedResponse {
                message: "model overloaded".to_string()
            }
        );
    }

    #[test]
    fn falls_back_to_generic_format_error() {
        let body = serde_json::json!({ "choices": [{ "index": 0 }] }).to_string();
        assert_eq!(
            parse_completion_body(&body).unwrap_err(),
            AiError::MalformedResponse {
                message: UNKNOWN_FORMAT.to_string()
            }
        );
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert!(matches!(
            parse_completion_body("<html>bad gateway</html>"),
            Err(AiError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn error_details_prefers_structured_message() {
        let body = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
        assert_eq!(error_details(body), "Invalid API key");
        assert_eq!(error_details("Service Unavailable"), "Service Unavailable");
    }

    #[tokio::test]
    async fn missing_credential_fails_without_request() {
        // Port 9 (discard) on localhost would fail with a network error if
        // a request were attempted.
        let provider = PerplexityProvider::new(
            None,
            "http://127.0.0.1:9/chat/completions".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = provider
            .complete("system", &CompletionRequest::new("prompt", "sonar"))
            .await
            .unwrap_err();
        assert_eq!(err, AiError::MissingCredential);
    }

    #[tokio::test]
    async fn returns_content_of_successful_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Report body"}}]}"#;
        let endpoint = serve_once(Some(http_response("200 OK", body))).await;

        let content = provider(endpoint, Duration::from_secs(5))
            .complete("system", &CompletionRequest::new("prompt", "sonar"))
            .await
            .unwrap();
        assert_eq!(content, "Report body");
    }

    #[tokio::test]
    async fn non_success_status_carries_error_message() {
        let body = r#"{"error":{"message":"Invalid API key","type":"auth"}}"#;
        let endpoint = serve_once(Some(http_response("401 Unauthorized", body))).await;

        let err = provider(endpoint, Duration::from_secs(5))
            .complete("system", &CompletionRequest::new("prompt", "sonar"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AiError::HttpStatus {
                status: 401,
                message: "Invalid API key".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let endpoint = serve_once(None).await;

        let err = provider(endpoint, Duration::from_secs(1))
            .complete("system", &CompletionRequest::new("prompt", "sonar"))
            .await
            .unwrap_err();
        assert_eq!(err, AiError::Timeout { seconds: 1 });
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let err = provider(
            format!("http://{addr}/chat/completions"),
            Duration::from_secs(5),
        )
        .complete("system", &CompletionRequest::new("prompt", "sonar"))
        .await
        .unwrap_err();
        assert!(matches!(err, AiError::Network { .. }), "{err:?}");
    }
}
