//! The `OpenAIClient` struct implements [`ClientWrapper`] for any
//! OpenAI-compatible chat-completions endpoint, capturing both the assistant
//! response and token usage (input vs output) for cost tracking.
//!
//! # Key Features
//!
//! - **send_message(...)**: single-shot request returning the full reply.
//! - **send_message_stream(...)**: SSE streaming request, decoded frame by
//!   frame into [`MessageChunk`]s.
//! - **Automatic Usage Capture**: stores the latest `TokenUsage` internally;
//!   call `get_last_usage()` after `send_message()` to retrieve it.
//! - **Custom base URL**: point the same client at self-hosted or third-party
//!   compatible gateways.
//!
//! # Example
//!
//! ```rust,no_run
//! use playforge::client_wrapper::{ClientWrapper, Message};
//! use playforge::clients::openai::OpenAIClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret_key = std::env::var("GATEWAY_API_KEY").expect("GATEWAY_API_KEY not set");
//!     let client = OpenAIClient::new_with_model_string(&secret_key, "gpt-4.1-mini");
//!
//!     let resp = client
//!         .send_message(&[
//!             Message::system("You output complete HTML documents only."),
//!             Message::user("A tiny snake game."),
//!         ])
//!         .await
//!         .unwrap();
//!     println!("Assistant: {}", resp.content);
//!
//!     if let Some(usage) = client.get_last_usage().await {
//!         println!(
//!             "Tokens - input: {}, output: {}, total: {}",
//!             usage.input_tokens, usage.output_tokens, usage.total_tokens
//!         );
//!     }
//! }
//! ```

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::playforge::client_wrapper::{
    ClientWrapper, Message, MessageChunk, MessageChunkStream, Role, SendError, TokenUsage,
};
use crate::playforge::clients::common::{
    chunks_to_stream, decode_delta_frame, get_shared_http_client, parse_sse_line, ChatRequest,
    ChatResponse, SseLine, WireMessage,
};
use crate::playforge::error::GatewayError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for OpenAI-compatible chat-completions gateways.
///
/// The wrapper keeps the selected model identifier plus an internal
/// [`TokenUsage`] slot so callers can inspect how many tokens each request
/// consumed. It reuses the shared HTTP client configured in
/// [`crate::playforge::clients::common`].
pub struct OpenAIClient {
    /// Shared pooled HTTP client.
    http: reqwest::Client,
    /// Gateway root, e.g. `https://api.openai.com/v1`.
    base_url: String,
    /// Bearer token injected into each request.
    api_key: String,
    /// Model name that will be injected into each request.
    model: String,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and model name,
    /// targeting the official OpenAI endpoint.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, DEFAULT_BASE_URL)
    }

    /// Construct a client targeting a custom OpenAI-compatible base URL
    /// (self-hosted deployments, proxies, other vendors' compatibility
    /// surfaces).
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            http: get_shared_http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: secret_key.to_string(),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_wire(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|msg| WireMessage {
                role: match msg.role {
                    Role::System => "system".to_owned(),
                    Role::User => "user".to_owned(),
                    Role::Assistant => "assistant".to_owned(),
                },
                content: msg.content.clone(),
            })
            .collect()
    }

    async fn post_chat(&self, body: &ChatRequest) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let classified = GatewayError::from_status(status.as_u16(), &body_text);
            log::error!(
                "OpenAIClient::post_chat(...): gateway error HTTP {}: {}",
                status,
                classified
            );
            return Err(classified);
        }
        Ok(response)
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(&self, messages: &[Message]) -> Result<Message, GatewayError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: Self::to_wire(messages),
            stream: false,
        };

        let response = self.post_chat(&body).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;

        if let Some(usage) = parsed.usage {
            // Store it for get_last_usage()
            *self.token_usage.lock().await = Some(TokenUsage {
                input_tokens: usage.prompt_tokens as usize,
                output_tokens: usage.completion_tokens as usize,
                total_tokens: usage.total_tokens as usize,
            });
        }

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            GatewayError::InvalidResponse("response contained no choices".into())
        })?;

        Ok(Message {
            role: Role::Assistant,
            content: choice.message.content,
        })
    }

    async fn send_message_stream(
        &self,
        messages: &[Message],
    ) -> Result<MessageChunkStream, GatewayError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: Self::to_wire(messages),
            stream: true,
        };

        let response = self.post_chat(&body).await?;
        let mut byte_stream = response.bytes_stream();

        // Collect the decoded chunks, then hand them back as a stream.
        let mut chunks: Vec<Result<MessageChunk, SendError>> = Vec::new();
        // Lines can straddle network reads; split on b'\n' only once a full
        // line is buffered so multi-byte characters are never cut.
        let mut buffer: Vec<u8> = Vec::new();
        let mut done = false;

        'read: while let Some(piece) = byte_stream.next().await {
            match piece {
                Ok(bytes) => {
                    buffer.extend_from_slice(&bytes);
                    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                        let line_bytes: Vec<u8> = buffer.drain(..=pos).collect();
                        let line = String::from_utf8_lossy(&line_bytes[..pos]);
                        match parse_sse_line(&line) {
                            SseLine::Ignore => {}
                            SseLine::Done => {
                                done = true;
                                break 'read;
                            }
                            SseLine::Data(payload) => {
                                if let Some(chunk) = decode_delta_frame(&payload) {
                                    chunks.push(Ok(chunk));
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    log::error!(
                        "OpenAIClient::send_message_stream(...): stream read error: {}",
                        err
                    );
                    chunks.push(Err(Box::new(GatewayError::Network(err.to_string()))
                        as SendError));
                    break 'read;
                }
            }
        }

        // A final frame may arrive without a trailing newline.
        if !done && !buffer.is_empty() {
            let line = String::from_utf8_lossy(&buffer);
            if let SseLine::Data(payload) = parse_sse_line(&line) {
                if let Some(chunk) = decode_delta_frame(&payload) {
                    chunks.push(Ok(chunk));
                }
            }
        }

        Ok(chunks_to_stream(chunks))
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
