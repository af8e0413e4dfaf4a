//! The retry orchestrator: drives the gateway, extraction, repair, and
//! validation until a valid creation emerges or the attempt budget runs out.
//!
//! The loop is strictly sequential — each attempt's prompt depends on the
//! previous attempt's validation output, so attempts are never batched or
//! parallelized. Soft failures (extraction miss, validation failure) never
//! raise; they become feedback for the next attempt and end up in the result
//! record. Gateway errors are caught at the per-attempt boundary and retried
//! like any other failure.
//!
//! Exhaustion policy: when no attempt fully validates but at least one
//! produced a scoring candidate, the best-scoring candidate is returned with
//! `success: true` plus a warning that it may be incomplete. Returning
//! something playable beats a hard failure. Only when every attempt came back
//! empty does the pipeline report `success: false`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;

use crate::playforge::client_wrapper::{ClientWrapper, Message};
use crate::playforge::error::GatewayError;
use crate::playforge::extract::extract;
use crate::playforge::prompt::{GenerationRequest, PromptBuilder};
use crate::playforge::repair::repair;
use crate::playforge::validate::{check_playability, score_structure};

/// Tunables for one pipeline instance. The same orchestrator covers both the
/// quick three-attempt flow and the high-reliability five-attempt flow; the
/// attempt budget is configuration, not a separate code path.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// Gateway calls to spend before giving up. Clamped to at least 1.
    pub max_attempts: u32,
    /// Run [`repair`] on every extracted candidate.
    pub auto_repair: bool,
    /// Additionally gate retries on the playability checklist's hard errors.
    pub strict_validation: bool,
    /// On exhaustion, return the best-scoring candidate instead of failing.
    pub best_effort: bool,
    /// Use the gateway's SSE streaming call instead of the single-shot call.
    pub streaming: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            max_attempts: 5,
            auto_repair: true,
            strict_validation: false,
            best_effort: true,
            streaming: false,
        }
    }
}

/// Terminal artifact of one generate call; at most one per invocation.
#[derive(Clone, Debug)]
pub struct GenerationResult {
    /// The creation document; empty only on hard failure.
    pub html: String,
    pub success: bool,
    /// Gateway calls actually made (0 when cancelled before the first).
    pub attempts: u32,
    /// Soft findings across all attempts, oldest first.
    pub warnings: Vec<String>,
    /// Per-attempt failure records; empty on a fully validated success.
    pub errors: Vec<String>,
}

/// Cooperative cancellation flag, checked at the top of every attempt. Cheap
/// to clone; hand one half to the UI context and the other to the pipeline.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Drives generate attempts against a [`ClientWrapper`] until a creation
/// validates or the budget is exhausted.
pub struct CreationPipeline {
    client: Arc<dyn ClientWrapper>,
    options: PipelineOptions,
}

impl CreationPipeline {
    pub fn new(client: Arc<dyn ClientWrapper>, options: PipelineOptions) -> Self {
        CreationPipeline { client, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Generate a creation for `request`. Never raises: every outcome,
    /// including gateway trouble on all attempts, is expressed in the
    /// returned [`GenerationResult`].
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        self.generate_with_cancel(request, &CancelToken::new()).await
    }

    /// Like [`CreationPipeline::generate`], with cooperative cancellation.
    /// The token is checked before each attempt; an in-flight gateway call is
    /// allowed to finish.
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> GenerationResult {
        let max_attempts = self.options.max_attempts.max(1);
        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        // (html, score) of the best candidate seen so far this call
        let mut best: Option<(String, u8)> = None;
        // concrete errors from the previous attempt, echoed into the prompt
        let mut feedback: Vec<String> = Vec::new();
        let mut attempts_made = 0u32;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                log::info!(
                    "CreationPipeline::generate(...): cancelled before attempt {}",
                    attempt
                );
                errors.push("generation cancelled".to_string());
                return GenerationResult {
                    html: String::new(),
                    success: false,
                    attempts: attempts_made,
                    warnings,
                    errors,
                };
            }

            let messages = PromptBuilder::new(request)
                .with_attempt(attempt, max_attempts)
                .with_feedback(&feedback)
                .build();
            feedback.clear();
            attempts_made = attempt;

            let raw = match self.obtain_raw(&messages).await {
                Ok(text) => text,
                Err(err) => {
                    let record = format!("attempt {}: {}", attempt, err);
                    log::warn!("CreationPipeline::generate(...): {}", record);
                    warnings.push(record.clone());
                    errors.push(record);
                    continue;
                }
            };

            let extraction = extract(&raw);
            for warning in &extraction.warnings {
                warnings.push(format!("attempt {}: {}", attempt, warning));
            }
            if extraction.is_empty() {
                let record =
                    format!("attempt {}: response contained no complete HTML document", attempt);
                errors.push(record);
                feedback
                    .push("your answer contained no complete HTML document".to_string());
                continue;
            }

            let html = if self.options.auto_repair {
                repair(&extraction.html)
            } else {
                extraction.html
            };

            let structure = score_structure(&html);
            let best_score = best.as_ref().map(|(_, score)| *score).unwrap_or(0);
            if structure.score > best_score {
                best = Some((html.clone(), structure.score));
            }

            if !structure.is_valid {
                let record = format!(
                    "attempt {}: quality score {} below threshold ({})",
                    attempt,
                    structure.score,
                    structure.issues.join("; ")
                );
                warnings.push(record.clone());
                errors.push(record);
                feedback = structure.issues;
                continue;
            }

            let playability = check_playability(&html);
            for warning in &playability.warnings {
                warnings.push(format!("attempt {}: {}", attempt, warning));
            }
            if self.options.strict_validation && !playability.is_valid {
                let record = format!(
                    "attempt {}: playability check failed ({})",
                    attempt,
                    playability.errors.join("; ")
                );
                warnings.push(record.clone());
                errors.push(record);
                feedback = playability.errors;
                continue;
            }

            if let Some(usage) = self.client.get_last_usage().await {
                log::info!(
                    "CreationPipeline::generate(...): success on attempt {} ({} tokens)",
                    attempt,
                    usage.total_tokens
                );
            }
            return GenerationResult {
                html,
                success: true,
                attempts: attempt,
                warnings,
                errors: Vec::new(),
            };
        }

        // Budget exhausted without a fully valid candidate.
        if self.options.best_effort {
            if let Some((html, score)) = best {
                warnings.push(format!(
                    "no attempt fully validated; returning best-effort candidate \
                     (score {}) which may be incomplete",
                    score
                ));
                return GenerationResult {
                    html,
                    success: true,
                    attempts: attempts_made,
                    warnings,
                    errors,
                };
            }
        }

        log::error!(
            "CreationPipeline::generate(...): all {} attempt(s) failed",
            attempts_made
        );
        GenerationResult {
            html: String::new(),
            success: false,
            attempts: attempts_made,
            warnings,
            errors,
        }
    }

    /// One gateway round-trip: single-shot or streamed per the options. The
    /// streamed path concatenates `delta.content` across frames, so callers
    /// downstream always see the complete reply text.
    async fn obtain_raw(&self, messages: &[Message]) -> Result<String, GatewayError> {
        if !self.options.streaming {
            return Ok(self.client.send_message(messages).await?.content);
        }

        let mut stream = self.client.send_message_stream(messages).await?;
        let mut content = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => content.push_str(&chunk.content),
                Err(err) => return Err(GatewayError::Network(err.to_string())),
            }
        }
        Ok(content)
    }
}
