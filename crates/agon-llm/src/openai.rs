//! OpenAI-compatible chat completions provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse, Role};

/// Chat completions request format
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// Chat completions response format
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Provider for any endpoint speaking the `/v1/chat/completions` protocol
#[derive(Debug)]
pub struct OpenAiCompatibleProvider {
    /// API key
    api_key: String,
    /// Default model when a request does not name one
    model: String,
    /// HTTP client
    client: reqwest::Client,
    /// Base URL, without the `/v1` suffix
    base_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// OpenAI's hosted API
    pub fn openai(api_key: &str, model: &str) -> Self {
        Self::new(api_key, "https://api.openai.com", model)
    }

    fn messages(request: LlmRequest) -> Vec<Message> {
        let mut messages = vec![Message {
            role: "system",
            content: request.system.clone(),
        }];
        messages.extend(request.messages().into_iter().map(|m| Message {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: m.content,
        }));
        messages
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/v1/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = ChatRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: Self::messages(request),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(LlmError::RateLimited);
        }
        if status.is_server_error() {
            return Err(LlmError::NotAvailable);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!(
                "Status: {}, Body: {}",
                status, body
            )));
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("empty choices".to_string()))?;

        Ok(LlmResponse {
            content,
            model: api_response.model,
            tokens_used: api_response.usage.map(|u| u.total_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;

    #[test]
    fn test_message_mapping() {
        let request = LlmRequest::with_role("be brief", "your turn")
            .history(vec![ChatMessage::assistant("earlier")]);
        let messages = OpenAiCompatibleProvider::messages(request);
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "assistant", "user"]);
    }

    #[tokio::test]
    #[ignore = "Requires AGON_API_KEY"]
    async fn test_real_request() {
        let api_key = std::env::var("AGON_API_KEY").expect("AGON_API_KEY not set");
        let provider = OpenAiCompatibleProvider::openai(&api_key, "gpt-4o-mini");

        let response = provider.ask("Say hello in one word").await.unwrap();
        assert!(!response.is_empty());
    }
}
