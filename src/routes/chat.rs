use axum::body::{Body, Bytes};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::ChatError;
use crate::models::ChatRequest;
use crate::services::llm_client::{decode_line, LineEvent, LlmClient};

use super::AppState;

/// POST /api/chat: relays the visitor's conversation to the upstream
/// model and streams the reply back as flat text, one fragment per
/// upstream event. This gives the "typing" effect as tokens arrive.
pub async fn relay_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ChatError> {
    let Ok(Json(request)) = payload else {
        return Err(ChatError::InvalidRequest);
    };
    if request.messages.is_empty() {
        return Err(ChatError::InvalidRequest);
    }

    let client = LlmClient::from_config(&state.config)?;

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(LlmClient::system_message(&state.system_prompt));
    messages.extend(request.messages);

    let upstream = client.chat_completion_stream(messages).await?;

    let (tx, rx) = mpsc::unbounded_channel::<Result<Bytes, axum::BoxError>>();
    tokio::spawn(translate_stream(upstream, tx));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(UnboundedReceiverStream::new(rx)),
    )
        .into_response())
}

/// Read the upstream body incrementally and forward each text fragment
/// as soon as its line is complete. Lines can be split across transport
/// reads, so undecoded bytes carry over between chunks.
///
/// Returning drops the upstream response, which releases the connection
/// on every exit path: sentinel, upstream close, mid-stream error, or
/// the caller going away.
async fn translate_stream(upstream: reqwest::Response, tx: UnboundedSender<Result<Bytes, axum::BoxError>>) {
    let mut body = upstream.bytes_stream();
    let mut carry: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                // Whatever was already forwarded stands; aborting the
                // output transport is what lets the consumer tell this
                // apart from a finished answer.
                tracing::warn!(error = %e, "upstream stream ended abnormally");
                let _ = tx.send(Err(e.into()));
                return;
            }
        };

        carry.extend_from_slice(&chunk);
        while let Some(pos) = carry.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = carry.drain(..=pos).collect();
            match decode_line(&line) {
                LineEvent::Delta(text) => {
                    if tx.send(Ok(Bytes::from(text))).is_err() {
                        // Caller disconnected.
                        return;
                    }
                }
                LineEvent::Done => return,
                LineEvent::Skip => {}
            }
        }
    }

    // The last line may arrive without a trailing newline.
    if let LineEvent::Delta(text) = decode_line(&carry) {
        let _ = tx.send(Ok(Bytes::from(text)));
    }
}
