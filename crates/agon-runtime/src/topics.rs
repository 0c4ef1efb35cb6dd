//! Topic generation

use std::sync::Arc;

use agon_core::Participant;
use agon_llm::{generate_structured, LlmError, LlmProvider, LlmRequest};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Proposes the topics for one debate
#[async_trait]
pub trait TopicGenerator: Send + Sync {
    async fn generate(
        &self,
        speakers: &[Participant; 2],
        count: usize,
        focus: &[String],
    ) -> Result<Vec<String>, LlmError>;
}

/// Topics proposed by a structured generation call
#[derive(Debug)]
pub struct LlmTopicGenerator<L: LlmProvider + ?Sized> {
    llm: Arc<L>,
    model: Option<String>,
}

impl<L: LlmProvider + ?Sized> LlmTopicGenerator<L> {
    pub fn new(llm: Arc<L>) -> Self {
        Self { llm, model: None }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }
}

#[derive(Deserialize)]
struct TopicList {
    topics: Vec<String>,
}

#[async_trait]
impl<L: LlmProvider + ?Sized> TopicGenerator for LlmTopicGenerator<L> {
    async fn generate(
        &self,
        speakers: &[Participant; 2],
        count: usize,
        focus: &[String],
    ) -> Result<Vec<String>, LlmError> {
        let schema = json!({
            "type": "object",
            "properties": {
                "topics": {
                    "type": "array",
                    "items": { "type": "string", "minLength": 1 },
                    "minItems": count,
                    "maxItems": count
                }
            },
            "required": ["topics"]
        });

        let mut prompt = format!(
            "Propose exactly {} debatable propositions for a debate between:\n- {}\n- {}\n",
            count,
            speakers[0].describe(),
            speakers[1].describe()
        );
        if !focus.is_empty() {
            prompt.push_str(&format!("\nEvery proposition must respect: {}\n", focus.join("; ")));
        }
        prompt.push_str("\nEach proposition is one sentence that a reasonable person could argue either way.");

        let mut request = LlmRequest::simple(&prompt).temperature(0.9);
        if let Some(model) = &self.model {
            request = request.model(model);
        }
        let list: TopicList = generate_structured(self.llm.as_ref(), request, &schema).await?;

        let topics: Vec<String> = list
            .topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if topics.len() != count {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} topics, got {}",
                count,
                topics.len()
            )));
        }
        tracing::debug!(count, "Topics generated");
        Ok(topics)
    }
}

/// A scripted topic list, cycled when more topics are requested than given
#[derive(Debug, Clone)]
pub struct FixedTopics {
    topics: Vec<String>,
}

impl FixedTopics {
    pub fn new<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TopicGenerator for FixedTopics {
    async fn generate(
        &self,
        _speakers: &[Participant; 2],
        count: usize,
        _focus: &[String],
    ) -> Result<Vec<String>, LlmError> {
        if self.topics.is_empty() {
            return Err(LlmError::InvalidResponse("no fixed topics configured".to_string()));
        }
        Ok(self.topics.iter().cycle().take(count).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agon_llm::MockProvider;

    fn speakers() -> [Participant; 2] {
        [Participant::new("Ada", "m"), Participant::new("Brutus", "m")]
    }

    #[tokio::test]
    async fn test_llm_topics_match_count() {
        let llm = Arc::new(MockProvider::smart());
        let generator = LlmTopicGenerator::new(llm.clone());
        let topics = generator
            .generate(&speakers(), 4, &["keep it about technology".to_string()])
            .await
            .unwrap();
        assert_eq!(topics.len(), 4);
        assert!(llm.requests()[0].prompt.contains("keep it about technology"));
    }

    #[tokio::test]
    async fn test_wrong_topic_count_is_rejected() {
        let llm = Arc::new(MockProvider::constant(r#"{"topics": ["only one"]}"#));
        let result = LlmTopicGenerator::new(llm).generate(&speakers(), 2, &[]).await;
        assert!(matches!(result, Err(LlmError::SchemaViolation(_))));
    }

    #[tokio::test]
    async fn test_fixed_topics_cycle() {
        let fixed = FixedTopics::new(["a", "b"]);
        let topics = fixed.generate(&speakers(), 3, &[]).await.unwrap();
        assert_eq!(topics, vec!["a", "b", "a"]);
        assert!(FixedTopics::new(Vec::<String>::new())
            .generate(&speakers(), 1, &[])
            .await
            .is_err());
    }
}
