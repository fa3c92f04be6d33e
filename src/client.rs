use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::Mutex;

use crate::models::{ChatMessage, TranscriptTurn};

/// What the visitor sees when an exchange fails at any point. A
/// half-streamed answer is never left behind; it is always replaced by
/// this message so a failure can't be mistaken for a complete reply.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't connect right now. Please try again or use the contact form.";

/// Where the widget is in the current exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    /// No exchange in flight.
    Idle,
    /// Request sent, response stream not open yet.
    Sending,
    /// Incremental fragments arriving.
    Streaming,
}

struct Transcript {
    turns: Vec<TranscriptTurn>,
    state: ChatState,
}

/// Client side of the chat widget: owns the transcript and allows at
/// most one exchange in flight. Clones share the same transcript.
#[derive(Clone)]
pub struct ChatClient {
    endpoint: String,
    http: reqwest::Client,
    inner: Arc<Mutex<Transcript>>,
}

impl ChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            http: reqwest::Client::new(),
            inner: Arc::new(Mutex::new(Transcript {
                turns: Vec::new(),
                state: ChatState::Idle,
            })),
        }
    }

    pub async fn state(&self) -> ChatState {
        self.inner.lock().await.state
    }

    pub async fn transcript(&self) -> Vec<TranscriptTurn> {
        self.inner.lock().await.turns.clone()
    }

    /// Submit a visitor message and stream the reply into the transcript.
    ///
    /// Empty input is ignored, as is a submission while another exchange
    /// is in flight. The user turn and the empty assistant placeholder
    /// are both appended before any network I/O, so a late failure always
    /// has a slot to overwrite. Returns once the assistant turn is final.
    pub async fn submit(&self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }

        let outbound = {
            let mut inner = self.inner.lock().await;
            if inner.state != ChatState::Idle {
                return;
            }
            inner.turns.push(TranscriptTurn::user(trimmed));
            // The placeholder is excluded from the outbound request.
            let outbound: Vec<ChatMessage> = inner.turns.iter().map(ChatMessage::from).collect();
            inner.turns.push(TranscriptTurn::assistant(""));
            inner.state = ChatState::Sending;
            outbound
        };

        let result = self.exchange(outbound).await;

        let mut inner = self.inner.lock().await;
        if result.is_err() {
            if let Some(last) = inner.turns.last_mut() {
                last.content = FALLBACK_MESSAGE.to_string();
            }
        }
        inner.state = ChatState::Idle;
    }

    async fn exchange(&self, messages: Vec<ChatMessage>) -> Result<(), reqwest::Error> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await?
            .error_for_status()?;

        self.inner.lock().await.state = ChatState::Streaming;

        let mut body = response.bytes_stream();
        let mut partial: Vec<u8> = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            partial.extend_from_slice(&chunk);
            let text = take_decoded_prefix(&mut partial);
            if text.is_empty() {
                continue;
            }
            let mut inner = self.inner.lock().await;
            if let Some(last) = inner.turns.last_mut() {
                last.content.push_str(&text);
            }
        }
        Ok(())
    }
}

/// Decode as much complete UTF-8 as the buffer holds, leaving the bytes
/// of a character split across transport reads for the next one.
fn take_decoded_prefix(buf: &mut Vec<u8>) -> String {
    match std::str::from_utf8(buf) {
        Ok(text) => {
            let text = text.to_string();
            buf.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&buf[..valid]).into_owned();
            buf.drain(..valid);
            text
        }
        // Genuinely invalid bytes: decode lossily and move on.
        Err(_) => {
            let text = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            text
        }
    }
}
