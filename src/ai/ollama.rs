use crate::ai::client::{AiClient, AiError, strip_code_fences};
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed reply used when mock mode bypasses the network.
pub const MOCK_RESPONSE: &str = "feat: update (mocked)";

/// Setting this to `1` short-circuits every request to [`MOCK_RESPONSE`],
/// so the assistant can be exercised without a running model.
pub const MOCK_ENV_VAR: &str = "GITPAL_AI_MOCK";

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for a locally-hosted Ollama chat endpoint
pub struct OllamaClient {
    host: String,
    model: String,
    http_client: Client,
    max_attempts: u32,
    mock: bool,
}

impl OllamaClient {
    /// Build a client from the application configuration. The per-request
    /// HTTP timeout comes from `ai_timeout_seconds`; mock mode is honored
    /// from [`MOCK_ENV_VAR`].
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs_f64(config.ai_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        let mock = std::env::var(MOCK_ENV_VAR).map(|v| v == "1").unwrap_or(false);

        Self {
            host: config.ai_host.trim_end_matches('/').to_string(),
            model: config.ai_model.clone(),
            http_client,
            max_attempts: MAX_ATTEMPTS,
            mock,
        }
    }

    /// Build a client that never touches the network.
    pub fn mocked(config: &Config) -> Self {
        let mut client = Self::new(config);
        client.mock = true;
        client
    }

    /// Override the retry budget (mainly for tests).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    async fn chat(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/api/chat", self.host);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self.http_client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AiError::InvalidResponse(format!(
                "endpoint returned {}: {}",
                status, text
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(parsed.message.content)
    }
}

#[async_trait]
impl AiClient for OllamaClient {
    async fn ask(&self, prompt: &str) -> Result<String, AiError> {
        if self.mock {
            return Ok(MOCK_RESPONSE.to_string());
        }

        let mut last_error = String::new();
        for attempt in 0..self.max_attempts {
            match self.chat(prompt).await {
                Ok(content) => return Ok(strip_code_fences(&content).to_string()),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt + 1 < self.max_attempts {
                        // Linear backoff: 0.5s, 1.0s, 1.5s, ...
                        tokio::time::sleep(BACKOFF_STEP * (attempt + 1)).await;
                    }
                }
            }
        }

        Err(AiError::RequestFailed {
            attempts: self.max_attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            ai_host: "http://127.0.0.1:9".to_string(),
            ai_timeout_seconds: 5.0,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn mock_mode_returns_placeholder() {
        let client = OllamaClient::mocked(&test_config());

        let reply = client.ask("suggest a commit message").await.unwrap();
        assert_eq!(reply, MOCK_RESPONSE);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_request_failed() {
        // Port 9 (discard) is not listening; each attempt fails fast
        let client = OllamaClient::new(&test_config()).with_max_attempts(1);

        let result = client.ask("hello").await;
        match result {
            Err(AiError::RequestFailed {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 1);
                assert!(!last_error.is_empty());
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn host_trailing_slash_normalized() {
        let config = Config {
            ai_host: "http://localhost:11434/".to_string(),
            ..Config::default()
        };
        let client = OllamaClient::mocked(&config);
        assert_eq!(client.host, "http://localhost:11434");
    }
}
