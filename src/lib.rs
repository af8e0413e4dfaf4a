//! # Playforge
//!
//! Playforge is the generation core behind a "describe a game, get a game" web
//! editor: it takes a natural-language prompt, drives an OpenAI-compatible
//! chat-completions gateway, and turns the model's free-text reply into a
//! guaranteed-structurally-valid single-file HTML/CSS/JS creation.
//!
//! The crate provides layered building blocks:
//!
//! * **Gateway clients**: a [`ClientWrapper`] trait implemented for any
//!   OpenAI-compatible endpoint ([`clients::openai::OpenAIClient`]), with both
//!   single-response and Server-Sent-Events streaming calls plus token-usage
//!   accounting.
//! * **Extraction**: [`extract::extract`] locates the most plausible complete
//!   HTML document inside arbitrary model output (markdown fences, prose
//!   wrappers, truncated fragments) via an ordered cascade of strategies, each
//!   reporting a confidence score.
//! * **Repair**: [`repair::repair`] normalizes malformed documents into a
//!   well-formed doctype/html/head/body skeleton without a DOM parser. Repair
//!   is total and idempotent.
//! * **Validation**: [`validate::validate`] scores structural quality and runs
//!   a playability checklist, reporting errors and warnings the retry loop
//!   feeds back into the next prompt.
//! * **Retry orchestration**: [`CreationPipeline`] drives up to N attempts,
//!   injecting the previous attempt's concrete validation errors as corrective
//!   feedback and keeping the best-scoring candidate so callers get something
//!   playable even when no attempt fully validates.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use playforge::clients::openai::OpenAIClient;
//! use playforge::{CreationPipeline, GenerationRequest, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     playforge::init_logger();
//!
//!     let key = std::env::var("GATEWAY_API_KEY").expect("GATEWAY_API_KEY not set");
//!     let client = Arc::new(OpenAIClient::new_with_model_string(&key, "gpt-4.1-mini"));
//!     let pipeline = CreationPipeline::new(client, PipelineOptions::default());
//!
//!     let request = GenerationRequest::new("A breakout clone with neon colors");
//!     let result = pipeline.generate(&request).await;
//!
//!     if result.success {
//!         println!("playable HTML after {} attempt(s)", result.attempts);
//!         println!("{}", result.html);
//!     } else {
//!         eprintln!("generation failed: {:?}", result.errors);
//!     }
//! }
//! ```
//!
//! All heuristics are pure string/regex processing: deterministic, synchronous,
//! and unit-testable without a network. Only the gateway call awaits.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding Playforge can opt in to `RUST_LOG` driven
/// diagnostics without choosing a logging backend upfront.
///
/// ```rust
/// playforge::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `playforge` module.
pub mod playforge;

// Re-exporting key items for easier external access.
pub use crate::playforge::client_wrapper;
pub use crate::playforge::client_wrapper::{
    ClientWrapper, Message, MessageChunk, MessageChunkStream, Role, TokenUsage,
};
pub use crate::playforge::clients;
pub use crate::playforge::config::PipelineConfig;
pub use crate::playforge::error::GatewayError;
pub use crate::playforge::extract;
pub use crate::playforge::extract::ExtractionResult;
pub use crate::playforge::pipeline;
pub use crate::playforge::pipeline::{
    CancelToken, CreationPipeline, GenerationResult, PipelineOptions,
};
pub use crate::playforge::prompt;
pub use crate::playforge::prompt::{CreationConfig, GenerationRequest, PromptBuilder};
pub use crate::playforge::repair;
pub use crate::playforge::validate;
pub use crate::playforge::validate::ValidationReport;
