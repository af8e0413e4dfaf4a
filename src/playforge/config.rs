//! Configuration for the generation pipeline.
//!
//! Connection settings are threaded in explicitly rather than read from
//! process-wide environment state at call time, so the core stays testable
//! without environment mocking. Reading env vars (or a secrets store) is the
//! embedding application's business; it then constructs a [`PipelineConfig`]
//! manually — no config-file parsing dependencies are involved.
//!
//! # Example
//!
//! ```rust,no_run
//! use playforge::{PipelineConfig, PipelineOptions};
//!
//! let config = PipelineConfig::new(
//!     std::env::var("GATEWAY_API_KEY").unwrap(),
//!     "gpt-4.1-mini",
//! )
//! .with_options(PipelineOptions {
//!     max_attempts: 3,
//!     ..PipelineOptions::default()
//! });
//!
//! let pipeline = config.build();
//! ```

use std::sync::Arc;

use crate::playforge::clients::openai::OpenAIClient;
use crate::playforge::pipeline::{CreationPipeline, PipelineOptions};

/// Everything needed to stand up a [`CreationPipeline`] against an
/// OpenAI-compatible gateway.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Bearer token for the gateway.
    pub api_key: String,
    /// Model identifier injected into each request.
    pub model: String,
    /// Gateway root; `None` means the official OpenAI endpoint.
    pub base_url: Option<String>,
    /// Retry-loop tunables.
    pub options: PipelineOptions,
}

impl PipelineConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        PipelineConfig {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            options: PipelineOptions::default(),
        }
    }

    /// Target a self-hosted or third-party compatible gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Construct the gateway client and wire it into a ready pipeline.
    pub fn build(&self) -> CreationPipeline {
        let client = match &self.base_url {
            Some(base_url) => {
                OpenAIClient::new_with_base_url(&self.api_key, &self.model, base_url)
            }
            None => OpenAIClient::new_with_model_string(&self.api_key, &self.model),
        };
        CreationPipeline::new(Arc::new(client), self.options.clone())
    }
}
