/// Tests for the retry orchestrator, driven by scripted mock clients
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use playforge::client_wrapper::{ClientWrapper, Message, MessageChunk, MessageChunkStream, Role};
use playforge::clients::common::chunks_to_stream;
use playforge::{CancelToken, CreationPipeline, GatewayError, GenerationRequest, PipelineOptions};

const VALID_GAME: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Orbit Dodger</title>
<style>
  body { margin: 0; background: #0b0e1a; }
  canvas { display: block; margin: 0 auto; }
</style>
</head>
<body>
<canvas id="game" width="480" height="640"></canvas>
<script>
  const canvas = document.getElementById('game');
  const ctx = canvas.getContext('2d');
  let score = 0;
  let shipX = 240;
  document.addEventListener('keydown', (e) => {
    if (e.key === 'ArrowLeft') shipX -= 10;
    if (e.key === 'ArrowRight') shipX += 10;
  });
  function init() { score = 0; shipX = 240; }
  function loop() {
    ctx.clearRect(0, 0, canvas.width, canvas.height);
    ctx.fillStyle = '#7df9ff';
    ctx.fillRect(shipX, 600, 24, 24);
    score += 1;
    requestAnimationFrame(loop);
  }
  init();
  loop();
</script>
</body>
</html>"#;

/// A page with structure but no script: extractable, repairs cleanly, fails
/// the quality gate.
const NO_SCRIPT_PAGE: &str =
    "<!DOCTYPE html><html><head><title>x</title></head><body><p>static page</p></body></html>";

/// Scripted client: pops one reply per call and records every prompt it saw.
struct MockClient {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockClient {
    fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
        MockClient {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn user_prompt_of_call(&self, index: usize) -> String {
        let calls = self.calls.lock().unwrap();
        calls[index]
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .collect()
    }
}

#[async_trait]
impl ClientWrapper for MockClient {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn send_message(&self, messages: &[Message]) -> Result<Message, GatewayError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let reply = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Network("no scripted response".into())));
        reply.map(|content| Message {
            role: Role::Assistant,
            content,
        })
    }
}

/// Streaming-only mock: serves one reply split into delta chunks.
struct MockStreamClient {
    reply: String,
}

#[async_trait]
impl ClientWrapper for MockStreamClient {
    fn model_name(&self) -> &str {
        "mock-stream"
    }

    async fn send_message(&self, _messages: &[Message]) -> Result<Message, GatewayError> {
        Err(GatewayError::Unsupported("streaming only".into()))
    }

    async fn send_message_stream(
        &self,
        _messages: &[Message],
    ) -> Result<MessageChunkStream, GatewayError> {
        let chunks = self
            .reply
            .as_bytes()
            .chunks(7)
            .map(|piece| {
                Ok(MessageChunk {
                    content: String::from_utf8_lossy(piece).into_owned(),
                    is_final: false,
                })
            })
            .collect();
        Ok(chunks_to_stream(chunks))
    }
}

fn options(max_attempts: u32) -> PipelineOptions {
    PipelineOptions {
        max_attempts,
        ..PipelineOptions::default()
    }
}

#[tokio::test]
async fn first_attempt_success_needs_no_retry() {
    let client = Arc::new(MockClient::new(vec![Ok(format!(
        "Here you go!\n```html\n{}\n```",
        VALID_GAME
    ))]));
    let pipeline = CreationPipeline::new(client.clone(), options(5));

    let result = pipeline.generate(&GenerationRequest::new("a dodging game")).await;

    assert!(result.success);
    assert_eq!(result.attempts, 1);
    assert!(result.errors.is_empty());
    assert!(result.html.contains("<canvas"));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn third_attempt_succeeds_after_two_invalid_replies() {
    let client = Arc::new(MockClient::new(vec![
        Ok(NO_SCRIPT_PAGE.to_string()),
        Ok(NO_SCRIPT_PAGE.to_string()),
        Ok(VALID_GAME.to_string()),
    ]));
    let pipeline = CreationPipeline::new(client.clone(), options(3));

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;

    assert!(result.success);
    assert_eq!(result.attempts, 3);
    assert!(result.errors.is_empty());
    // the two failed attempts leave their issues in the warnings history
    assert!(result.warnings.iter().any(|w| w.starts_with("attempt 1:")));
    assert!(result.warnings.iter().any(|w| w.starts_with("attempt 2:")));
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn retry_prompts_carry_previous_attempt_errors() {
    let client = Arc::new(MockClient::new(vec![
        Ok(NO_SCRIPT_PAGE.to_string()),
        Ok(VALID_GAME.to_string()),
    ]));
    let pipeline = CreationPipeline::new(client.clone(), options(3));

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;
    assert!(result.success);

    let first = client.user_prompt_of_call(0);
    let second = client.user_prompt_of_call(1);
    assert!(!first.contains("IMPORTANT"));
    assert!(second.contains("attempt 2 of 3"));
    // the concrete issue from attempt 1 is echoed back, not a generic nag
    assert!(second.contains("missing <script> tag"));
}

#[tokio::test]
async fn extraction_failure_feeds_concrete_feedback() {
    let client = Arc::new(MockClient::new(vec![
        Ok("I'd be happy to help! What kind of game?".to_string()),
        Ok(VALID_GAME.to_string()),
    ]));
    let pipeline = CreationPipeline::new(client.clone(), options(3));

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;
    assert!(result.success);
    assert_eq!(result.attempts, 2);

    let second = client.user_prompt_of_call(1);
    assert!(second.contains("no complete HTML document"));
}

#[tokio::test]
async fn exhaustion_returns_best_effort_candidate() {
    let client = Arc::new(MockClient::new(vec![
        Ok(NO_SCRIPT_PAGE.to_string()),
        Ok(NO_SCRIPT_PAGE.to_string()),
        Ok(NO_SCRIPT_PAGE.to_string()),
    ]));
    let pipeline = CreationPipeline::new(client.clone(), options(3));

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;

    assert!(result.success, "best-effort policy returns something playable");
    assert!(result.html.contains("static page"));
    assert_eq!(result.attempts, 3);
    assert!(!result.errors.is_empty());
    assert!(result.warnings.iter().any(|w| w.contains("best-effort")));
}

#[tokio::test]
async fn best_effort_can_be_disabled() {
    let client = Arc::new(MockClient::new(vec![
        Ok(NO_SCRIPT_PAGE.to_string()),
        Ok(NO_SCRIPT_PAGE.to_string()),
    ]));
    let pipeline = CreationPipeline::new(
        client,
        PipelineOptions {
            max_attempts: 2,
            best_effort: false,
            ..PipelineOptions::default()
        },
    );

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;
    assert!(!result.success);
    assert!(result.html.is_empty());
    assert_eq!(result.errors.len(), 2);
}

#[tokio::test]
async fn no_extractable_html_anywhere_is_a_hard_failure() {
    let client = Arc::new(MockClient::new(vec![
        Ok("I cannot produce that.".to_string()),
        Ok("Still refusing, sorry.".to_string()),
        Ok("Nope.".to_string()),
    ]));
    let pipeline = CreationPipeline::new(client.clone(), options(3));

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;

    assert!(!result.success);
    assert!(result.html.is_empty());
    assert_eq!(result.attempts, 3);
    assert_eq!(result.errors.len(), 3);
    assert_eq!(client.call_count(), 3);
}

#[tokio::test]
async fn gateway_errors_are_retried_not_thrown() {
    let client = Arc::new(MockClient::new(vec![
        Err(GatewayError::RateLimited),
        Ok(VALID_GAME.to_string()),
    ]));
    let pipeline = CreationPipeline::new(client.clone(), options(3));

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;

    assert!(result.success);
    assert_eq!(result.attempts, 2);
    assert!(result.errors.is_empty());
    assert!(result.warnings.iter().any(|w| w.contains("rate limit")));

    // a transport failure leaves no validator errors to echo, so the retry
    // falls back to the generic strict-output directive
    let second = client.user_prompt_of_call(1);
    assert!(second.contains("attempt 2 of 3"));
    assert!(second.contains("ONLY the complete HTML document"));
}

#[tokio::test]
async fn cancellation_stops_before_the_next_attempt() {
    let client = Arc::new(MockClient::new(vec![Ok(VALID_GAME.to_string())]));
    let pipeline = CreationPipeline::new(client.clone(), options(5));

    let cancel = CancelToken::new();
    cancel.cancel();
    let result = pipeline
        .generate_with_cancel(&GenerationRequest::new("a game"), &cancel)
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 0);
    assert!(result.errors.iter().any(|e| e.contains("cancelled")));
    assert_eq!(client.call_count(), 0, "no gateway call after cancellation");
}

#[tokio::test]
async fn streaming_replies_are_concatenated_before_extraction() {
    let client = Arc::new(MockStreamClient {
        reply: format!("```html\n{}\n```", VALID_GAME),
    });
    let pipeline = CreationPipeline::new(
        client,
        PipelineOptions {
            max_attempts: 1,
            streaming: true,
            ..PipelineOptions::default()
        },
    );

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;

    assert!(result.success);
    assert_eq!(result.html.trim(), VALID_GAME.trim());
}

#[tokio::test]
async fn iteration_requests_embed_the_current_creation() {
    let client = Arc::new(MockClient::new(vec![Ok(VALID_GAME.to_string())]));
    let pipeline = CreationPipeline::new(client.clone(), options(1));

    let request = GenerationRequest::iterate_on(VALID_GAME, "make the ship red");
    let result = pipeline.generate(&request).await;
    assert!(result.success);

    let prompt = client.user_prompt_of_call(0);
    assert!(prompt.contains("current creation"));
    assert!(prompt.contains("make the ship red"));
    assert!(prompt.contains("<canvas"));
}

#[tokio::test]
async fn attempt_budget_is_never_exceeded() {
    let client = Arc::new(MockClient::new(vec![]));
    let pipeline = CreationPipeline::new(client.clone(), options(4));

    let result = pipeline.generate(&GenerationRequest::new("a game")).await;

    assert!(!result.success);
    assert_eq!(client.call_count(), 4);
    assert_eq!(result.attempts, 4);
}
