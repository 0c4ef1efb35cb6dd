//! Participant types for Agon
//!
//! A [`Participant`] is one of the two debating entities in a match. Its
//! strategy text is the only belief state that survives between debates.

use serde::{Deserialize, Serialize};

use crate::ids::{new_id, ParticipantId};

/// Strategy text given to a participant that has not revised itself yet
pub const DEFAULT_STRATEGY: &str = "Argue clearly and directly. Open with your strongest point, \
answer the opponent's best argument rather than its weakest, and close each turn by stating \
why your position should win the topic.";

/// A debating entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    /// Unique identifier
    pub id: ParticipantId,
    /// Display name
    pub name: String,
    /// Current strategy text, mutated only between debates
    pub strategy: String,
    /// Model identifier used for this participant's generation calls
    pub model: String,
    /// Storage location for strategy and history; `None` for the judge role
    pub storage: Option<String>,
    /// Whether the learning loop may rewrite the strategy text
    pub self_revise: bool,
}

impl Participant {
    /// Create a participant with the default strategy and no storage yet
    pub fn new(name: &str, model: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            strategy: DEFAULT_STRATEGY.to_string(),
            model: model.to_string(),
            storage: None,
            self_revise: true,
        }
    }

    /// Create the judge role: never stored, never revised
    pub fn judge(model: &str) -> Self {
        Self {
            id: new_id(),
            name: "Judge".to_string(),
            strategy: String::new(),
            model: model.to_string(),
            storage: None,
            self_revise: false,
        }
    }

    pub fn with_strategy(mut self, strategy: &str) -> Self {
        self.strategy = strategy.to_string();
        self
    }

    pub fn with_storage(mut self, location: &str) -> Self {
        self.storage = Some(location.to_string());
        self
    }

    pub fn with_self_revise(mut self, enabled: bool) -> Self {
        self.self_revise = enabled;
        self
    }

    /// A participant without a storage location plays the judge role
    pub fn is_judge(&self) -> bool {
        self.storage.is_none()
    }

    /// One-line description used when proposing topics
    pub fn describe(&self) -> String {
        let headline = self
            .strategy
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("no stated strategy");
        format!("{} ({}): {}", self.name, self.model, headline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_participant() {
        let p = Participant::new("Ada", "model-x");
        assert_eq!(p.strategy, DEFAULT_STRATEGY);
        assert!(p.self_revise);
        assert!(p.is_judge());

        let stored = p.with_storage("matches/m/participants/ada");
        assert!(!stored.is_judge());
    }

    #[test]
    fn test_judge_role() {
        let judge = Participant::judge("model-y");
        assert!(judge.is_judge());
        assert!(!judge.self_revise);
    }

    #[test]
    fn test_describe_uses_first_line() {
        let p = Participant::new("Ada", "m").with_strategy("\n  Lead with data.\nThen rebut.");
        assert_eq!(p.describe(), "Ada (m): Lead with data.");
    }
}
