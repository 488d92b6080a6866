use axum::body::Bytes;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::OnceLock;
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM provider not configured")]
    NotConfigured,

    #[error("Provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Heading marker separating the primary answer from an optional revised
/// draft in non-streaming replies
pub const DRAFT_MARKER: &str = "## Revised draft";

/// Terminating sentinel of every relayed stream
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

pub struct LlmClient {
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    fn request_body(messages: &[ChatMessage], stream: bool) -> Value {
        let cfg = &config::config().llm;
        json!({
            "model": cfg.model,
            "messages": messages,
            "stream": stream,
        })
    }

    /// Open one streaming chat-completion request; the caller reads the byte
    /// stream incrementally.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
    ) -> Result<reqwest::Response, LlmError> {
        let cfg = &config::config().llm;
        let api_key = cfg.api_key.as_deref().ok_or(LlmError::NotConfigured)?;

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", cfg.api_base))
            .bearer_auth(api_key)
            .json(&Self::request_body(messages, true))
            .send()
            .await
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider(format!("{}: {}", status, body)));
        }

        Ok(response)
    }

    /// Single non-streaming completion; returns the assistant text
    pub async fn complete_chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let cfg = &config::config().llm;
        let api_key = cfg.api_key.as_deref().ok_or(LlmError::NotConfigured)?;

        let response = self
            .http
            .post(format!("{}/v1/chat/completions", cfg.api_base))
            .bearer_auth(api_key)
            .json(&Self::request_body(messages, false))
            .send()
            .await
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider(format!("{}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Provider(e.to_string()))?;

        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::Provider("Completion had no content".to_string()))
    }
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new()
    }
}

pub fn client() -> &'static LlmClient {
    static INSTANCE: OnceLock<LlmClient> = OnceLock::new();
    INSTANCE.get_or_init(LlmClient::new)
}

/// Incremental splitter for the upstream event stream.
///
/// Buffers only the partial line spanning a chunk boundary. Each complete
/// `data:` line is re-framed as a downstream SSE event; malformed JSON lines
/// and the upstream's own [DONE] are skipped (the relay appends its own
/// sentinel).
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    partial: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one upstream chunk; returns the downstream frames it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        for byte in chunk {
            if *byte == b'\n' {
                let line = std::mem::take(&mut self.partial);
                if let Some(frame) = Self::frame_for_line(&line) {
                    frames.push(frame);
                }
            } else {
                self.partial.push(*byte);
            }
        }
        frames
    }

    fn frame_for_line(line: &[u8]) -> Option<Bytes> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end_matches('\r');
        let payload = line.strip_prefix("data:")?.trim_start();
        if payload == "[DONE]" || payload.is_empty() {
            return None;
        }
        // Best-effort parsing: a malformed line is dropped, not fatal
        let value: Value = serde_json::from_str(payload).ok()?;
        Some(Bytes::from(format!("data: {}\n\n", value)))
    }
}

/// Split a completion into the primary answer and an optional revised draft
/// using the fixed heading marker. Marker absent → whole text is the answer.
pub fn split_sections(text: &str) -> (String, Option<String>) {
    match text.split_once(DRAFT_MARKER) {
        Some((answer, draft)) => {
            let draft = draft.trim();
            let draft = (!draft.is_empty()).then(|| draft.to_string());
            (answer.trim().to_string(), draft)
        }
        None => (text.trim().to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_lines_split_across_chunks() {
        let mut buf = SseLineBuffer::new();
        let first = buf.push(b"data: {\"delta\":");
        assert!(first.is_empty());
        let second = buf.push(b"\"ciao\"}\n");
        assert_eq!(second.len(), 1);
        assert_eq!(&second[0][..], b"data: {\"delta\":\"ciao\"}\n\n");
    }

    #[test]
    fn multiple_lines_in_one_chunk() {
        let mut buf = SseLineBuffer::new();
        let frames = buf.push(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n");
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut buf = SseLineBuffer::new();
        let frames = buf.push(b"data: {not json}\nnoise line\ndata: {\"ok\":true}\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..], b"data: {\"ok\":true}\n\n");
    }

    #[test]
    fn upstream_done_is_not_relayed() {
        let mut buf = SseLineBuffer::new();
        let frames = buf.push(b"data: [DONE]\n");
        assert!(frames.is_empty());
    }

    #[test]
    fn crlf_terminated_lines_are_handled() {
        let mut buf = SseLineBuffer::new();
        let frames = buf.push(b"data: {\"x\":1}\r\n");
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn split_sections_with_marker() {
        let text = "The company looks solid.\n\n## Revised draft\nGentile cliente, ...";
        let (answer, draft) = split_sections(text);
        assert_eq!(answer, "The company looks solid.");
        assert_eq!(draft.as_deref(), Some("Gentile cliente, ..."));
    }

    #[test]
    fn split_sections_without_marker() {
        let (answer, draft) = split_sections("Just an answer.");
        assert_eq!(answer, "Just an answer.");
        assert!(draft.is_none());
    }
}
