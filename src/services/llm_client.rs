use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ChatError;
use crate::models::ChatMessage;
use crate::services::config_service::Config;

/// OpenAI-compatible chat completion request. The relay only ever asks
/// for incremental delivery.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
}

/// One chunk of the upstream's incremental response.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// One decoded line of the upstream event stream.
#[derive(Debug, PartialEq)]
pub enum LineEvent {
    /// A non-empty incremental text fragment to forward.
    Delta(String),
    /// The `[DONE]` sentinel; translation ends here.
    Done,
    /// Everything else: lines without the data marker, keep-alives,
    /// malformed payloads, empty deltas. Skipped, never an error.
    Skip,
}

/// Decode one line of the upstream stream. A single bad line must never
/// abort the whole response, so every parse failure maps to `Skip`.
pub fn decode_line(line: &[u8]) -> LineEvent {
    let Ok(line) = std::str::from_utf8(line) else {
        return LineEvent::Skip;
    };
    let Some(data) = line.trim_end().strip_prefix("data: ") else {
        return LineEvent::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return LineEvent::Done;
    }
    let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
        return LineEvent::Skip;
    };
    match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
        Some(content) if !content.is_empty() => LineEvent::Delta(content),
        _ => LineEvent::Skip,
    }
}

/// Client for the upstream chat completion API.
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for long generations
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Create a new LLM client from process configuration. A missing
    /// credential is an operator error surfaced before any upstream call.
    pub fn from_config(config: &Config) -> Result<Self, ChatError> {
        let api_key = config.api_key.as_deref().unwrap_or_default();
        if api_key.is_empty() {
            return Err(ChatError::Configuration);
        }
        Ok(Self::new(&config.base_url, api_key, &config.model))
    }

    /// Send a chat completion request with incremental delivery and hand
    /// back the raw response, ready for line-by-line translation.
    ///
    /// A non-success status reads the full error body and fails with it;
    /// the call is never retried.
    pub async fn chat_completion_stream(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<reqwest::Response, ChatError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            stream: true,
            messages,
        };

        // Build the full URL - append /chat/completions if base_url doesn't already include it
        let url = if self.base_url.contains("/chat/completions") {
            self.base_url.clone()
        } else {
            format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "upstream chat completion failed");
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Helper to create the system message injected ahead of the
    /// visitor's conversation.
    pub fn system_message(content: &str) -> ChatMessage {
        ChatMessage {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line_extracts_delta_content() {
        let line = br#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(decode_line(line), LineEvent::Delta("Hello".to_string()));
    }

    #[test]
    fn test_decode_line_recognizes_sentinel() {
        assert_eq!(decode_line(b"data: [DONE]"), LineEvent::Done);
        assert_eq!(decode_line(b"data: [DONE]\r"), LineEvent::Done);
    }

    #[test]
    fn test_decode_line_skips_lines_without_marker() {
        assert_eq!(decode_line(b""), LineEvent::Skip);
        assert_eq!(decode_line(b": keep-alive"), LineEvent::Skip);
        assert_eq!(decode_line(b"event: message"), LineEvent::Skip);
    }

    #[test]
    fn test_decode_line_skips_malformed_json() {
        assert_eq!(decode_line(b"data: {not json"), LineEvent::Skip);
        assert_eq!(decode_line(b"data: 42"), LineEvent::Skip);
    }

    #[test]
    fn test_decode_line_skips_empty_and_missing_deltas() {
        assert_eq!(
            decode_line(br#"data: {"choices":[{"delta":{"content":""}}]}"#),
            LineEvent::Skip
        );
        assert_eq!(
            decode_line(br#"data: {"choices":[{"delta":{}}]}"#),
            LineEvent::Skip
        );
        assert_eq!(decode_line(br#"data: {"choices":[]}"#), LineEvent::Skip);
        assert_eq!(
            decode_line(br#"data: {"choices":[{"finish_reason":"stop","delta":{}}]}"#),
            LineEvent::Skip
        );
    }

    #[test]
    fn test_decode_line_keeps_multibyte_content_intact() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo ✓\"}}]}".as_bytes();
        assert_eq!(decode_line(line), LineEvent::Delta("héllo ✓".to_string()));
    }
}
