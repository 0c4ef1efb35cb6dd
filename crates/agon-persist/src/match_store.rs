//! Match storage
//!
//! Persists match configuration, per-debate results and per-participant
//! strategy/history, and reconstructs an in-flight match for resume.

use std::sync::Arc;

use agon_core::{slugify, short_id, DebateResult, Match, Participant};
use chrono::Utc;

use crate::backend::{StorageBackend, StorageError, StorageExt};

const MATCH_FILE: &str = "match.json";
const STRATEGY_FILE: &str = "strategy.md";
const HISTORY_FILE: &str = "history.md";
const SUMMARY_FILE: &str = "summary.md";

/// Match store for persistence
#[derive(Debug)]
pub struct MatchStore<B: StorageBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: StorageBackend + ?Sized> Clone for MatchStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
        }
    }
}

impl<B: StorageBackend + ?Sized> MatchStore<B> {
    /// Create a new match store
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn match_file(slug: &str) -> String {
        format!("{}/{}", slug, MATCH_FILE)
    }

    fn debates_dir(slug: &str) -> String {
        format!("{}/debates", slug)
    }

    fn debate_file(slug: &str, number: u32, ext: &str) -> String {
        format!("{}/debate-{:03}.{}", Self::debates_dir(slug), number, ext)
    }

    fn location(participant: &Participant) -> Result<&str, StorageError> {
        participant.storage.as_deref().ok_or_else(|| {
            StorageError::NotFound(format!("storage location for participant {}", participant.id))
        })
    }

    /// Directory assigned to a participant of the match
    pub fn participant_location(m: &Match, participant: &Participant) -> String {
        format!(
            "{}/participants/{}-{}",
            m.slug,
            slugify(&participant.name),
            short_id(&participant.id)
        )
    }

    /// Assign storage to both participants and persist the initial state
    pub async fn create_match(&self, m: &mut Match) -> Result<(), StorageError> {
        for i in 0..2 {
            if m.participants[i].storage.is_none() {
                let location = Self::participant_location(m, &m.participants[i]);
                m.participants[i].storage = Some(location);
            }
        }
        self.save_match(m).await?;

        for participant in &m.participants {
            let location = Self::location(participant)?;
            let strategy_path = format!("{}/{}", location, STRATEGY_FILE);
            if !self.backend.exists(&strategy_path).await? {
                self.backend
                    .write(&strategy_path, participant.strategy.as_bytes())
                    .await?;
            }
            let history_path = format!("{}/{}", location, HISTORY_FILE);
            if !self.backend.exists(&history_path).await? {
                let header = format!("# History of {}\n", participant.name);
                self.backend.append(&history_path, header.as_bytes()).await?;
            }
        }

        tracing::info!(match_slug = %m.slug, backend = %self.backend.name(), "Match created");
        Ok(())
    }

    /// Persist the match configuration and participant records
    pub async fn save_match(&self, m: &Match) -> Result<(), StorageError> {
        self.backend.put_json(&Self::match_file(&m.slug), m).await
    }

    /// Durably write a completed debate (machine-readable + transcript)
    pub async fn save_debate(&self, m: &Match, debate: &DebateResult) -> Result<(), StorageError> {
        let json_path = Self::debate_file(&m.slug, debate.number, "json");
        if let Err(e) = self.backend.put_json(&json_path, debate).await {
            tracing::error!(match_slug = %m.slug, debate = debate.number, error = %e, "Failed to persist debate");
            return Err(e);
        }

        let transcript = debate.to_markdown(&m.display_names());
        let md_path = Self::debate_file(&m.slug, debate.number, "md");
        if let Err(e) = self.backend.write(&md_path, transcript.as_bytes()).await {
            tracing::error!(match_slug = %m.slug, debate = debate.number, error = %e, "Failed to persist transcript");
            return Err(e);
        }
        Ok(())
    }

    /// Number encoded in a debate result's file name
    fn debate_number(path: &str) -> Option<u32> {
        path.rsplit('/')
            .next()?
            .strip_prefix("debate-")?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }

    /// Completed debates, in order, stopping at the first gap or unreadable file
    pub async fn load_debates(&self, slug: &str) -> Result<Vec<DebateResult>, StorageError> {
        let mut numbered: Vec<(u32, String)> = self
            .backend
            .list_dir(&Self::debates_dir(slug))
            .await?
            .into_iter()
            .filter_map(|path| Self::debate_number(&path).map(|n| (n, path)))
            .collect();
        numbered.sort_by_key(|(number, _)| *number);

        let mut debates = Vec::new();
        for (number, path) in numbered {
            let expected = debates.len() as u32 + 1;
            if number != expected {
                tracing::warn!(match_slug = %slug, path = %path, expected, "Gap in debate results");
                break;
            }
            match self.backend.get_json::<DebateResult>(&path).await {
                Ok(Some(debate)) if debate.number == expected => debates.push(debate),
                Ok(_) => break,
                Err(e) => {
                    tracing::warn!(match_slug = %slug, path = %path, error = %e, "Unreadable debate result");
                    break;
                }
            }
        }
        Ok(debates)
    }

    /// Reconstruct a match for resume.
    ///
    /// The `current_debate` stored in match.json counts debates whose learning
    /// step finished. A debate file one past it is returned in
    /// [`Match::pending_learning`] so the caller can finish learning from it.
    ///
    /// Returns `Ok(None)` if the match is missing or its state is corrupt.
    pub async fn load_match(&self, slug: &str) -> Result<Option<Match>, StorageError> {
        let mut m: Match = match self.backend.get_json(&Self::match_file(slug)).await {
            Ok(Some(m)) => m,
            Ok(None) => return Ok(None),
            Err(StorageError::Serialization(e)) => {
                tracing::warn!(match_slug = %slug, error = %e, "Corrupt match state");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        for participant in m.participants.iter_mut() {
            match self.read_strategy(participant).await {
                Ok(Some(strategy)) => participant.strategy = strategy,
                Ok(None) => {}
                Err(StorageError::NotFound(what)) => {
                    tracing::warn!(match_slug = %slug, missing = %what, "Participant without storage");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }

        let learned = m.current_debate;
        if learned > m.config.debates {
            tracing::warn!(match_slug = %slug, learned, "More debates recorded than configured");
            return Ok(None);
        }

        m.current_debate = 0;
        m.debates.clear();
        m.pending_learning = None;
        let mut stored = self.load_debates(slug).await?.into_iter();
        for debate in stored.by_ref().take(learned as usize) {
            if m.record_debate(debate).is_err() {
                break;
            }
        }
        if m.current_debate == learned {
            if let Some(debate) = stored.next() {
                if debate.number > m.config.debates {
                    tracing::warn!(match_slug = %slug, "More debates stored than configured");
                    return Ok(None);
                }
                tracing::info!(match_slug = %slug, debate = debate.number, "Debate awaiting learning");
                m.pending_learning = Some(debate);
            }
        }
        if stored.next().is_some() {
            tracing::warn!(match_slug = %slug, learned, "Ignoring debates stored past the first unlearned one");
        }
        Ok(Some(m))
    }

    pub async fn read_strategy(
        &self,
        participant: &Participant,
    ) -> Result<Option<String>, StorageError> {
        let location = Self::location(participant)?;
        self.backend
            .read_text(&format!("{}/{}", location, STRATEGY_FILE))
            .await
    }

    pub async fn write_strategy(
        &self,
        participant: &Participant,
        strategy: &str,
    ) -> Result<(), StorageError> {
        let location = Self::location(participant)?;
        self.backend
            .write(&format!("{}/{}", location, STRATEGY_FILE), strategy.as_bytes())
            .await
    }

    /// Append a dated entry to the participant's history log
    pub async fn append_history(
        &self,
        participant: &Participant,
        title: &str,
        body: &str,
    ) -> Result<(), StorageError> {
        let location = Self::location(participant)?;
        let entry = format!(
            "\n## {} ({})\n\n{}\n",
            title,
            Utc::now().format("%Y-%m-%d %H:%M UTC"),
            body.trim()
        );
        self.backend
            .append(&format!("{}/{}", location, HISTORY_FILE), entry.as_bytes())
            .await
    }

    pub async fn read_history(&self, participant: &Participant) -> Result<String, StorageError> {
        let location = Self::location(participant)?;
        Ok(self
            .backend
            .read_text(&format!("{}/{}", location, HISTORY_FILE))
            .await?
            .unwrap_or_default())
    }

    /// Copy strategy and history from a prior participant's location
    pub async fn seed_participant(
        &self,
        from_location: &str,
        to: &Participant,
    ) -> Result<(), StorageError> {
        let location = Self::location(to)?;
        for file in [STRATEGY_FILE, HISTORY_FILE] {
            let source = format!("{}/{}", from_location.trim_end_matches('/'), file);
            let bytes = self
                .backend
                .read(&source)
                .await?
                .ok_or_else(|| StorageError::NotFound(source.clone()))?;
            self.backend
                .write(&format!("{}/{}", location, file), &bytes)
                .await?;
        }
        tracing::info!(from = %from_location, to = %location, "Participant seeded");
        Ok(())
    }

    pub async fn write_summary(&self, slug: &str, summary: &str) -> Result<(), StorageError> {
        self.backend
            .write(&format!("{}/{}", slug, SUMMARY_FILE), summary.as_bytes())
            .await
    }

    pub async fn read_summary(&self, slug: &str) -> Result<Option<String>, StorageError> {
        self.backend
            .read_text(&format!("{}/{}", slug, SUMMARY_FILE))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use agon_core::{MatchConfig, Tally};

    fn new_match() -> Match {
        Match::new(
            MatchConfig {
                debates: 3,
                ..Default::default()
            },
            Participant::new("Ada", "m"),
            Participant::new("Brutus", "m"),
        )
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let mut m = new_match();
        store.create_match(&mut m).await.unwrap();
        assert!(m.participants.iter().all(|p| p.storage.is_some()));

        let loaded = store.load_match(&m.slug).await.unwrap().unwrap();
        assert_eq!(loaded.id, m.id);
        assert_eq!(loaded.current_debate, 0);
        assert_eq!(loaded.participants[0].strategy, m.participants[0].strategy);
        assert!(store
            .read_history(&loaded.participants[1])
            .await
            .unwrap()
            .starts_with("# History of Brutus"));
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_match_is_none() {
        let backend = Arc::new(MemoryBackend::new());
        let store = MatchStore::new(backend.clone());
        assert!(store.load_match("nope").await.unwrap().is_none());

        backend.write("broken/match.json", b"{\"id\":").await.unwrap();
        assert!(store.load_match("broken").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resume_sees_persisted_debates() {
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let mut m = new_match();
        store.create_match(&mut m).await.unwrap();

        for n in 1..=2 {
            let debate = DebateResult::new(n, vec![], Tally::default());
            store.save_debate(&m, &debate).await.unwrap();
            m.record_debate(debate).unwrap();
        }
        store.save_match(&m).await.unwrap();

        let loaded = store.load_match(&m.slug).await.unwrap().unwrap();
        assert_eq!(loaded.debates.len(), 2);
        assert_eq!(loaded.next_debate_number(), Some(3));
    }

    #[tokio::test]
    async fn test_debate_saved_before_learning_is_pending() {
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let mut m = Match::new(
            MatchConfig {
                debates: 1,
                ..Default::default()
            },
            Participant::new("Ada", "m"),
            Participant::new("Brutus", "m"),
        );
        store.create_match(&mut m).await.unwrap();
        store
            .save_debate(&m, &DebateResult::new(1, vec![], Tally::default()))
            .await
            .unwrap();

        let loaded = store.load_match(&m.slug).await.unwrap().unwrap();
        assert_eq!(loaded.current_debate, 0);
        assert!(loaded.debates.is_empty());
        assert_eq!(loaded.pending_learning.as_ref().map(|d| d.number), Some(1));
        assert!(!loaded.is_finished());
    }

    #[tokio::test]
    async fn test_participant_without_storage_is_none() {
        let backend = Arc::new(MemoryBackend::new());
        let store = MatchStore::new(backend.clone());
        let mut m = new_match();
        store.create_match(&mut m).await.unwrap();

        m.participants[1].storage = None;
        store.save_match(&m).await.unwrap();
        assert!(store.load_match(&m.slug).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_debates_past_999_load_in_numeric_order() {
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let mut m = Match::new(
            MatchConfig {
                debates: 1005,
                ..Default::default()
            },
            Participant::new("Ada", "m"),
            Participant::new("Brutus", "m"),
        );
        store.create_match(&mut m).await.unwrap();
        for n in 1..=1002 {
            store
                .save_debate(&m, &DebateResult::new(n, vec![], Tally::default()))
                .await
                .unwrap();
        }

        let debates = store.load_debates(&m.slug).await.unwrap();
        assert_eq!(debates.len(), 1002);
        assert_eq!(debates.last().map(|d| d.number), Some(1002));
        assert_eq!(
            MatchStore::<MemoryBackend>::debate_number(&format!("{}/debates/debate-1001.json", m.slug)),
            Some(1001)
        );
    }

    #[tokio::test]
    async fn test_debate_gap_stops_reconstruction() {
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let mut m = new_match();
        store.create_match(&mut m).await.unwrap();

        store
            .save_debate(&m, &DebateResult::new(1, vec![], Tally::default()))
            .await
            .unwrap();
        store
            .save_debate(&m, &DebateResult::new(3, vec![], Tally::default()))
            .await
            .unwrap();

        let debates = store.load_debates(&m.slug).await.unwrap();
        assert_eq!(debates.len(), 1);
    }

    #[tokio::test]
    async fn test_strategy_and_history() {
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let mut m = new_match();
        store.create_match(&mut m).await.unwrap();
        let ada = &m.participants[0];

        store.write_strategy(ada, "Be concise.").await.unwrap();
        assert_eq!(
            store.read_strategy(ada).await.unwrap().as_deref(),
            Some("Be concise.")
        );

        store.append_history(ada, "Debate 1", "Won 2 of 3").await.unwrap();
        let history = store.read_history(ada).await.unwrap();
        assert!(history.contains("## Debate 1 ("));
        assert!(history.contains("Won 2 of 3"));

        let judge = Participant::judge("m");
        assert!(matches!(
            store.read_history(&judge).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_participant() {
        let store = MatchStore::new(Arc::new(MemoryBackend::new()));
        let mut first = new_match();
        store.create_match(&mut first).await.unwrap();
        store
            .write_strategy(&first.participants[0], "Veteran strategy")
            .await
            .unwrap();

        let mut second = new_match();
        second.participants[0].storage = Some(MatchStore::<MemoryBackend>::participant_location(
            &second,
            &second.participants[0],
        ));
        store
            .seed_participant(first.participants[0].storage.as_deref().unwrap(), &second.participants[0])
            .await
            .unwrap();
        store.create_match(&mut second).await.unwrap();

        let loaded = store.load_match(&second.slug).await.unwrap().unwrap();
        assert_eq!(loaded.participants[0].strategy, "Veteran strategy");
    }
}
