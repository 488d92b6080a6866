//! AI research assistant: a streaming chat relay plus a one-shot Q&A that
//! can return a revised outreach draft alongside the answer.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{future, stream, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::ApiError;
use crate::integrations::llm::{self, ChatMessage, LlmError, SseLineBuffer};
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// Free-form context pasted by the operator (lead notes, page copy, ...)
    pub context: Option<String>,
}

const SYSTEM_PROMPT: &str = "You are a market research assistant for a \
small-business marketing team. Answer concisely and factually. When asked to \
improve an outreach email, put the rewrite under a final heading exactly \
titled '## Revised draft'.";

/// Assemble the upstream message list: system prompt (with any pasted
/// context), prior turns with unknown roles dropped, then the new question.
fn build_messages(req: &ResearchRequest) -> Vec<ChatMessage> {
    let mut system = SYSTEM_PROMPT.to_string();
    if let Some(context) = req.context.as_deref().filter(|c| !c.trim().is_empty()) {
        system.push_str("\n\nContext provided by the operator:\n");
        system.push_str(context.trim());
    }

    let mut messages = vec![ChatMessage::system(system)];
    for turn in &req.history {
        match turn.role.as_str() {
            "user" | "assistant" => messages.push(ChatMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            }),
            _ => {}
        }
    }
    messages.push(ChatMessage::user(req.question.clone()));
    messages
}

/// Re-frame an upstream chunk stream as downstream SSE events, always
/// terminated by the `data: [DONE]` sentinel. An upstream error truncates
/// the stream but never drops the sentinel.
fn relay_frames<S, E>(upstream: S) -> impl Stream<Item = Bytes>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    upstream
        .scan(SseLineBuffer::new(), |buffer, chunk| {
            let frames = match chunk {
                Ok(bytes) => buffer.push(&bytes),
                Err(e) => {
                    warn!("LLM stream interrupted: {}", e);
                    Vec::new()
                }
            };
            future::ready(Some(stream::iter(frames)))
        })
        .flatten()
        .chain(stream::once(async { Bytes::from(llm::DONE_FRAME) }))
}

/// POST /api/companies/research/chat - relay the provider's token stream as
/// SSE. The response always terminates with a `data: [DONE]` sentinel, even
/// when the upstream fails or produces nothing, so clients can key teardown
/// on it unconditionally.
pub async fn chat(Json(req): Json<ResearchRequest>) -> Result<Response, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::bad_request("question is required"));
    }
    let messages = build_messages(&req);

    let body = match llm::client().stream_chat(&messages).await {
        Ok(upstream) => {
            Body::from_stream(relay_frames(upstream.bytes_stream()).map(Ok::<_, Infallible>))
        }
        Err(e) => {
            warn!("LLM stream failed to open: {}", e);
            Body::from_stream(
                relay_frames(stream::empty::<Result<Bytes, LlmError>>())
                    .map(Ok::<_, Infallible>),
            )
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

/// POST /api/companies/research/ask - one-shot completion, split into the
/// answer and an optional revised outreach draft
pub async fn ask(Json(req): Json<ResearchRequest>) -> ApiResult<Value> {
    if req.question.trim().is_empty() {
        return Err(ApiError::bad_request("question is required"));
    }
    let messages = build_messages(&req);

    let completion = llm::client().complete_chat(&messages).await?;
    let (answer, revised_draft) = llm::split_sections(&completion);
    Ok(ApiResponse::success(json!({
        "answer": answer,
        "revisedDraft": revised_draft,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question: &str) -> ResearchRequest {
        ResearchRequest {
            question: question.to_string(),
            history: Vec::new(),
            context: None,
        }
    }

    #[test]
    fn messages_start_with_system_and_end_with_question() {
        let messages = build_messages(&request("Who are my competitors?"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Who are my competitors?");
    }

    #[test]
    fn context_is_folded_into_the_system_prompt() {
        let mut req = request("q");
        req.context = Some("Acme Srl, plumbing, Torino".to_string());
        let messages = build_messages(&req);
        assert!(messages[0].content.contains("Acme Srl, plumbing, Torino"));
    }

    #[test]
    fn unknown_history_roles_are_dropped() {
        let mut req = request("q");
        req.history = vec![
            ChatTurn {
                role: "user".to_string(),
                content: "hi".to_string(),
            },
            ChatTurn {
                role: "tool".to_string(),
                content: "ignored".to_string(),
            },
            ChatTurn {
                role: "assistant".to_string(),
                content: "hello".to_string(),
            },
        ];
        let messages = build_messages(&req);
        // system + 2 kept turns + question
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|m| m.role != "tool"));
    }

    #[tokio::test]
    async fn relay_ends_with_the_sentinel() {
        let upstream = stream::iter(vec![Ok::<_, LlmError>(Bytes::from(
            "data: {\"delta\":\"ciao\"}\n",
        ))]);
        let frames: Vec<Bytes> = relay_frames(upstream).collect().await;
        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..], b"data: {\"delta\":\"ciao\"}\n\n");
        assert_eq!(frames[1], Bytes::from(llm::DONE_FRAME));
    }

    #[tokio::test]
    async fn empty_upstream_still_emits_the_sentinel() {
        let frames: Vec<Bytes> = relay_frames(stream::empty::<Result<Bytes, LlmError>>())
            .collect()
            .await;
        assert_eq!(frames, vec![Bytes::from(llm::DONE_FRAME)]);
    }

    #[tokio::test]
    async fn mid_stream_error_still_ends_with_the_sentinel() {
        let upstream = stream::iter(vec![
            Ok(Bytes::from("data: {\"delta\":\"ci\"}\n")),
            Err(LlmError::Provider("connection reset".to_string())),
            Ok(Bytes::from("data: {\"delta\":\"ao\"}\n")),
        ]);
        let frames: Vec<Bytes> = relay_frames(upstream).collect().await;
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.last().unwrap(), &Bytes::from(llm::DONE_FRAME));
    }
}
