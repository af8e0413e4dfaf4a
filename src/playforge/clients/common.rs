//! Shared plumbing for chat-completions clients: the pooled HTTP client, the
//! wire-format structs, and the Server-Sent-Events frame parser.
//!
//! The SSE parser is deliberately part of the core rather than hidden behind
//! an SDK: model output arrives as `data:` frames carrying JSON deltas, and
//! the extraction pipeline downstream must receive exactly the concatenation
//! of `choices[0].delta.content` across frames. Blank lines and `:`-prefixed
//! comment lines are keep-alive noise and are skipped; the literal `[DONE]`
//! sentinel (or stream close) terminates the stream.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::playforge::client_wrapper::{MessageChunk, MessageChunkStream, SendError};

lazy_static! {
    /// Process-wide HTTP client so connections, DNS lookups, and TLS
    /// handshakes are reused across requests.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = reqwest::ClientBuilder::new()
        // Keep idle connections alive for 90 seconds
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        // Generations can be slow; allow long-running requests
        .timeout(Duration::from_secs(300))
        .build()
        .expect("Failed to build HTTP client");
}

/// Get the shared `reqwest::Client` configured for persistent connections.
pub fn get_shared_http_client() -> reqwest::Client {
    SHARED_HTTP_CLIENT.clone()
}

// ---------------------------------------------------------------------------
// Chat-completions wire format
// ---------------------------------------------------------------------------

/// A single `{role, content}` entry in the request/response body.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
}

/// Token accounting block in a non-streaming response.
#[derive(Debug, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: WireMessage,
}

/// Non-streaming response body; the assistant reply lives at
/// `choices[0].message.content`.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    pub delta: StreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One decoded `data:` frame of a streaming response.
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    pub choices: Vec<StreamChoice>,
}

// ---------------------------------------------------------------------------
// SSE framing
// ---------------------------------------------------------------------------

/// Outcome of scanning one line of an SSE body.
#[derive(Clone, Debug, PartialEq)]
pub enum SseLine {
    /// Blank line, `:` keep-alive comment, or a non-`data` field — skip it.
    Ignore,
    /// The `[DONE]` sentinel — the stream is complete.
    Done,
    /// A `data:` frame payload (JSON text, not yet decoded).
    Data(String),
}

/// Classify a single SSE line. Tolerates `\r` line endings and both
/// `data:foo` and `data: foo` spellings.
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Ignore;
    }
    let payload = match line.strip_prefix("data:") {
        Some(rest) => rest.trim_start(),
        // event:/id:/retry: fields carry no delta content
        None => return SseLine::Ignore,
    };
    if payload == "[DONE]" {
        SseLine::Done
    } else {
        SseLine::Data(payload.to_string())
    }
}

/// Decode one `data:` payload into a [`MessageChunk`].
///
/// Malformed JSON frames are dropped with a logged warning instead of
/// aborting the stream — a single garbled keep-alive must not cost the whole
/// generation.
pub fn decode_delta_frame(payload: &str) -> Option<MessageChunk> {
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .first()
                .and_then(|choice| choice.delta.content.clone())
                .unwrap_or_default();
            let is_final = chunk
                .choices
                .first()
                .map(|choice| choice.finish_reason.is_some())
                .unwrap_or(false);
            Some(MessageChunk { content, is_final })
        }
        Err(err) => {
            log::warn!(
                "playforge::clients::common::decode_delta_frame(...): skipping malformed SSE frame: {}",
                err
            );
            None
        }
    }
}

/// Split a complete SSE body into message chunks, stopping at `[DONE]`.
pub fn sse_body_to_chunks(body: &str) -> Vec<MessageChunk> {
    let mut chunks = Vec::new();
    for line in body.lines() {
        match parse_sse_line(line) {
            SseLine::Ignore => {}
            SseLine::Done => break,
            SseLine::Data(payload) => {
                if let Some(chunk) = decode_delta_frame(&payload) {
                    chunks.push(chunk);
                }
            }
        }
    }
    chunks
}

/// Concatenate the delta contents of a complete SSE body into the full
/// assistant reply. Pure helper shared by the streaming client and tests.
pub fn concat_sse_body(body: &str) -> String {
    let mut out = String::new();
    for chunk in sse_body_to_chunks(body) {
        out.push_str(&chunk.content);
    }
    out
}

/// Convert collected chunks into the stream type the [`ClientWrapper`]
/// (crate::ClientWrapper) contract hands back.
pub fn chunks_to_stream(chunks: Vec<Result<MessageChunk, SendError>>) -> MessageChunkStream {
    Box::pin(futures_util::stream::iter(chunks))
}
