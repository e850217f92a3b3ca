use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while talking to the model endpoint
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI request failed after {attempts} attempts: {last_error}")]
    RequestFailed { attempts: u32, last_error: String },

    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A chat-style model endpoint: one user prompt in, one text reply out.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String, AiError>;
}

/// Strip a leading/trailing markdown code fence from a model reply.
///
/// Models often wrap JSON replies in ```` ```json ... ``` ```` even when told
/// not to; the fence is presentation noise, not content.
pub fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    for opener in ["```json", "```"] {
        if let Some(rest) = cleaned.strip_prefix(opener) {
            cleaned = rest;
            if let Some(body) = cleaned.trim_end().strip_suffix("```") {
                cleaned = body;
            }
            break;
        }
    }
    cleaned.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plain_text_untouched() {
        assert_eq!(strip_code_fences("feat: update parser"), "feat: update parser");
    }

    #[test]
    fn test_strip_json_fence() {
        let reply = "```json\n[{\"scope\": \"parser\"}]\n```";
        assert_eq!(strip_code_fences(reply), "[{\"scope\": \"parser\"}]");
    }

    #[test]
    fn test_strip_bare_fence() {
        let reply = "```\ngit status\n```";
        assert_eq!(strip_code_fences(reply), "git status");
    }

    #[test]
    fn test_strip_fence_with_surrounding_whitespace() {
        let reply = "  ```json\n{\"command\": \"push\"}\n```  \n";
        assert_eq!(strip_code_fences(reply), "{\"command\": \"push\"}");
    }

    #[test]
    fn test_unterminated_fence_keeps_body() {
        let reply = "```json\n{\"command\": \"pull\"}";
        assert_eq!(strip_code_fences(reply), "{\"command\": \"pull\"}");
    }
}
