// src/playforge/mod.rs

pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompt;
pub mod repair;
pub mod validate;

// Let's explicitly export the pipeline so we don't have to access it via
// playforge::pipeline::CreationPipeline and instead as playforge::CreationPipeline
pub use pipeline::CreationPipeline;
pub use prompt::GenerationRequest;
