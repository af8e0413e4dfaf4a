//! Prompt assembly for creation generation.
//!
//! A [`GenerationRequest`] captures everything the user asked for (prompt,
//! category, structured config, optionally the current HTML when iterating on
//! an existing creation). [`PromptBuilder`] renders it into the system/user
//! message pair sent to the gateway, and appends the retry-feedback block when
//! the orchestrator is on a second or later attempt.
//!
//! Feedback policy: when the previous attempt produced concrete validation
//! errors, those exact errors are injected so the model knows what to fix;
//! only when no errors are known yet does the builder fall back to the
//! generic strict-output directive.

use crate::playforge::client_wrapper::Message;

/// Structured knobs the editor UI exposes alongside the free-text prompt.
#[derive(Clone, Debug, Default)]
pub struct CreationConfig {
    pub difficulty: Option<String>,
    pub theme: Option<String>,
    pub features: Vec<String>,
}

/// Everything needed to generate (or re-generate) one creation. Immutable;
/// constructed once per user action and passed by value into the pipeline.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// The user's natural-language description of the game or tool.
    pub prompt: String,
    /// Optional category context ("arcade", "puzzle", "card", ...).
    pub category: Option<String>,
    /// Existing creation HTML when iterating; `prompt` then holds the change
    /// instruction instead of a from-scratch description.
    pub base_html: Option<String>,
    /// Optional structured configuration.
    pub config: Option<CreationConfig>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        GenerationRequest {
            prompt: prompt.into(),
            category: None,
            base_html: None,
            config: None,
        }
    }

    /// Request that iterates on an existing creation: `instruction` describes
    /// the change, `current_html` is the document to revise.
    pub fn iterate_on(current_html: impl Into<String>, instruction: impl Into<String>) -> Self {
        GenerationRequest {
            prompt: instruction.into(),
            category: None,
            base_html: Some(current_html.into()),
            config: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_config(mut self, config: CreationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// The output contract every generation shares. Kept strict so the extractor
/// downstream has the best possible chance of a clean match.
const SYSTEM_PROMPT: &str = "\
You are an expert web game developer. You produce complete, self-contained, \
playable HTML5 games and tools.

Rules:
- Output exactly one complete HTML document and nothing else.
- Start with <!DOCTYPE html> and end with </html>.
- All CSS goes in a <style> tag inside <head>; all JavaScript goes in a \
<script> tag inside <body>. No external files, no CDN links.
- The result must be interactive and immediately playable: wire up input \
handlers and run a game loop (requestAnimationFrame or setInterval) where \
the creation calls for one.
- Do not wrap the document in markdown fences and do not add commentary \
before or after it.";

/// Renders a [`GenerationRequest`] (plus retry context) into gateway messages.
pub struct PromptBuilder {
    request: GenerationRequest,
    attempt: u32,
    max_attempts: u32,
    feedback: Vec<String>,
}

impl PromptBuilder {
    pub fn new(request: &GenerationRequest) -> Self {
        PromptBuilder {
            request: request.clone(),
            attempt: 1,
            max_attempts: 1,
            feedback: Vec::new(),
        }
    }

    /// Record which attempt this is; attempts after the first get a
    /// corrective block appended.
    pub fn with_attempt(mut self, attempt: u32, max_attempts: u32) -> Self {
        self.attempt = attempt;
        self.max_attempts = max_attempts;
        self
    }

    /// Concrete errors from the previous attempt, to be echoed back verbatim.
    pub fn with_feedback(mut self, errors: &[String]) -> Self {
        self.feedback = errors.to_vec();
        self
    }

    /// Assemble the system + user message pair.
    pub fn build(&self) -> Vec<Message> {
        vec![Message::system(SYSTEM_PROMPT), Message::user(self.user_prompt())]
    }

    fn user_prompt(&self) -> String {
        let mut out = String::new();

        if let Some(base) = &self.request.base_html {
            out.push_str("Here is the current creation:\n\n");
            out.push_str(base);
            out.push_str("\n\nApply this change and output the full revised document: ");
            out.push_str(&self.request.prompt);
        } else {
            out.push_str("Create this: ");
            out.push_str(&self.request.prompt);
        }

        if let Some(category) = &self.request.category {
            out.push_str(&format!("\n\nCategory: {}", category));
        }

        if let Some(config) = &self.request.config {
            if let Some(difficulty) = &config.difficulty {
                out.push_str(&format!("\nDifficulty: {}", difficulty));
            }
            if let Some(theme) = &config.theme {
                out.push_str(&format!("\nVisual theme: {}", theme));
            }
            if !config.features.is_empty() {
                out.push_str(&format!("\nRequired features: {}", config.features.join(", ")));
            }
        }

        if self.attempt > 1 {
            out.push_str(&self.corrective_block());
        }

        out
    }

    fn corrective_block(&self) -> String {
        if self.feedback.is_empty() {
            // No concrete errors known yet; fall back to the generic
            // strict-output directive.
            format!(
                "\n\nIMPORTANT (attempt {} of {}): your previous answer could not \
                 be used. Respond with ONLY the complete HTML document, starting \
                 at <!DOCTYPE html> and ending at </html>, with no explanation \
                 and no markdown fences.",
                self.attempt, self.max_attempts
            )
        } else {
            let mut block = format!(
                "\n\nIMPORTANT (attempt {} of {}): your previous answer had these \
                 problems, fix every one of them:\n",
                self.attempt, self.max_attempts
            );
            for error in &self.feedback {
                block.push_str(&format!("- {}\n", error));
            }
            block.push_str(
                "Respond with ONLY the corrected complete HTML document, nothing else.",
            );
            block
        }
    }
}
