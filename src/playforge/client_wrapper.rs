use async_trait::async_trait;
use futures_util::Stream;
use std::error::Error;
use std::pin::Pin;
use tokio::sync::Mutex;

use crate::playforge::error::GatewayError;

/// A ClientWrapper is a wrapper around a specific chat-completions gateway.
/// It provides a common interface for the generation pipeline to talk to any
/// OpenAI-compatible vendor. It does not keep track of retries or prompts —
/// that is the job of the [`CreationPipeline`](crate::CreationPipeline), which
/// uses a ClientWrapper to obtain raw model output.

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq)]
pub enum Role {
    // set by the developer to steer the model's responses
    System,
    // the creation prompt typed by the app user
    User,
    // content generated by the model in a previous turn
    Assistant,
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to the gateway.
#[derive(Clone, Debug)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Represents a chunk of a streaming message response.
#[derive(Clone, Debug)]
pub struct MessageChunk {
    /// The incremental content in this chunk.
    pub content: String,
    /// Whether this is the final chunk in the stream.
    pub is_final: bool,
}

/// Type alias for a Send-able error box
pub type SendError = Box<dyn Error + Send>;

/// A pinned stream of message chunks, as returned by streaming clients.
pub type MessageChunkStream = Pin<Box<dyn Stream<Item = Result<MessageChunk, SendError>> + Send>>;

/// Trait defining the interface to interact with chat-completions gateways.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// The model identifier this client injects into each request.
    fn model_name(&self) -> &str;

    /// Send the messages and get the complete assistant response in one shot.
    async fn send_message(&self, messages: &[Message]) -> Result<Message, GatewayError>;

    /// Send the messages and get a streaming response.
    ///
    /// Returns a stream of [`MessageChunk`] items, allowing tokens to be
    /// processed as they arrive. This method has a default implementation that
    /// returns an error, so clients that only support single-shot responses
    /// don't break. Clients that support streaming should override this.
    async fn send_message_stream(
        &self,
        _messages: &[Message],
    ) -> Result<MessageChunkStream, GatewayError> {
        Err(GatewayError::Unsupported(
            "streaming not supported by this client".into(),
        ))
    }

    /// Hook to retrieve usage from the *last* send_message() call.
    /// Default impl returns None so wrappers without accounting don't break.
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        match self.usage_slot() {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    /// ClientWrapper implementations supporting TokenUsage tracking should
    /// return their usage slot by overriding this method.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        None
    }
}
