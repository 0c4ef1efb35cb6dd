//! Mock LLM provider for testing

use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse, TextStream};

type Responder = Arc<dyn Fn(&LlmRequest, usize) -> Result<String, LlmError> + Send + Sync>;

/// A mock LLM provider that returns scripted responses.
///
/// Calls are numbered from 0 in arrival order; any call listed in
/// `fail_on` returns an error instead of a response.
pub struct MockProvider {
    /// Name of this mock
    pub name: String,
    responder: Responder,
    calls: AtomicUsize,
    fail_on: HashSet<usize>,
    /// Simulated latency in ms
    latency_ms: u64,
    /// Words per streamed chunk
    chunk_words: usize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("name", &self.name)
            .field("calls", &self.calls.load(Ordering::Relaxed))
            .field("fail_on", &self.fail_on)
            .field("latency_ms", &self.latency_ms)
            .finish()
    }
}

impl MockProvider {
    /// Answer every call with `f(request, call_index)`
    pub fn with_responder<F>(f: F) -> Self
    where
        F: Fn(&LlmRequest, usize) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            name: "mock".to_string(),
            responder: Arc::new(f),
            calls: AtomicUsize::new(0),
            fail_on: HashSet::new(),
            latency_ms: 0,
            chunk_words: 3,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that cycles through the given responses
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_responder(move |_, idx| {
            if responses.is_empty() {
                return Err(LlmError::InvalidResponse("no canned responses".to_string()));
            }
            Ok(responses[idx % responses.len()].clone())
        })
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a smart mock that responds based on prompt content
    pub fn smart() -> Self {
        let mut mock = Self::with_responder(|req, idx| Ok(smart_response(req, idx)));
        mock.name = "smart-mock".to_string();
        mock.latency_ms = 20;
        mock
    }

    /// Fail the given call indices with a non-retryable error
    pub fn fail_on_calls(mut self, calls: &[usize]) -> Self {
        self.fail_on.extend(calls.iter().copied());
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_chunk_words(mut self, words: usize) -> Self {
        self.chunk_words = words.max(1);
        self
    }

    /// Total calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    async fn respond(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }

        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        if self.fail_on.contains(&idx) {
            return Err(LlmError::RequestFailed(format!("scripted failure on call {}", idx)));
        }
        (self.responder)(request, idx)
    }
}

fn smart_response(request: &LlmRequest, idx: usize) -> String {
    let prompt = request.prompt.to_lowercase();

    if prompt.contains("json schema") {
        if prompt.contains("\"topics\"") {
            let count = prompt
                .split("exactly ")
                .nth(1)
                .and_then(|rest| rest.split_whitespace().next())
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(3);
            let topics: Vec<String> = (1..=count)
                .map(|i| format!("Proposition {}: remote work beats the office", i))
                .collect();
            return serde_json::json!({ "topics": topics }).to_string();
        }
        if prompt.contains("\"winner\"") {
            let winner = ["A", "B", "tie"][idx % 3];
            return serde_json::json!({
                "winner": winner,
                "rationale": "The stronger side answered its opponent's best point directly."
            })
            .to_string();
        }
        return "{}".to_string();
    }

    if prompt.contains("strategy") {
        return "Lead with one concrete example, concede minor points quickly, \
                and spend the final turn on the opponent's strongest claim."
            .to_string();
    }

    if prompt.contains("summar") {
        return "Summary: both participants sharpened their openings across the match.".to_string();
    }

    format!(
        "On \"{}\": my position holds because the evidence favours it, and my opponent has not shown otherwise.",
        request
            .system
            .lines()
            .find(|l| l.starts_with("Topic:"))
            .map(|l| l.trim_start_matches("Topic:").trim())
            .unwrap_or("this topic")
    )
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let content = self.respond(&request).await?;

        Ok(LlmResponse {
            content,
            model: request.model.clone().unwrap_or_else(|| self.name.clone()),
            tokens_used: Some((request.prompt.len() / 4) as u32 + 100),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn stream(&self, request: LlmRequest) -> Result<TextStream, LlmError> {
        let content = self.respond(&request).await?;

        let words: Vec<&str> = content.split_inclusive(' ').collect();
        let chunks: Vec<Result<String, LlmError>> = words
            .chunks(self.chunk_words)
            .map(|c| Ok(c.concat()))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}
