use std::sync::Arc;

use agon_core::{
    DebateResult, Match, MatchConfig, Participant, Tally, TopicExecutionState, TopicResult,
    TopicStatus, Verdict,
};
use agon_persist::{FileBackend, MatchStore, StorageBackend};

fn judged_topic(m: &Match, index: usize) -> TopicResult {
    let (first, second) = m.speaking_order(index);
    let mut state = TopicExecutionState::new(index, &format!("Topic {}", index), 1, first, second);
    state.advance(TopicStatus::Debating).unwrap();
    state.begin_exchange(first).unwrap();
    state.append_exchange(first, "opening").unwrap();
    state.begin_exchange(second).unwrap();
    state.append_exchange(second, "rebuttal").unwrap();
    state.advance(TopicStatus::Judging).unwrap();
    state.conclude(Verdict::new(Some(first), "clearer")).unwrap();
    state.into()
}

#[tokio::test]
async fn test_resume_after_k_debates_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = MatchStore::new(Arc::new(FileBackend::new(dir.path())));

    let mut m = Match::new(
        MatchConfig {
            debates: 4,
            topics_per_debate: 2,
            turns_per_topic: 1,
            ..Default::default()
        },
        Participant::new("Ada", "m"),
        Participant::new("Brutus", "m"),
    );
    store.create_match(&mut m).await?;

    for k in 1..=2u32 {
        let topics = vec![judged_topic(&m, 0), judged_topic(&m, 1)];
        let tally = Tally {
            speaker1_wins: 1,
            speaker2_wins: 1,
            ties: 0,
        };
        let debate = DebateResult::new(k, topics, tally);
        store.save_debate(&m, &debate).await?;
        m.record_debate(debate)?;
        store.save_match(&m).await?;
    }

    // Loading twice must yield the same state
    let first = store.load_match(&m.slug).await?.expect("match present");
    let second = store.load_match(&m.slug).await?.expect("match present");
    assert_eq!(first.current_debate, 2);
    assert_eq!(second.current_debate, 2);
    assert_eq!(first.debates, second.debates);
    assert_eq!(first.next_debate_number(), Some(3));
    assert_eq!(first.debates[1].topics[0].exchanges.len(), 2);

    let transcript = std::fs::read_to_string(
        dir.path()
            .join(&m.slug)
            .join("debates")
            .join("debate-002.md"),
    )?;
    assert!(transcript.contains("# Debate 2"));
    assert!(transcript.contains("**Ada** (turn 1)"));
    assert!(transcript.contains("**Verdict:**"));
    Ok(())
}

#[tokio::test]
async fn test_truncated_debate_file_is_ignored() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let backend = Arc::new(FileBackend::new(dir.path()));
    let store = MatchStore::new(backend.clone());

    let mut m = Match::new(
        MatchConfig::default(),
        Participant::new("Ada", "m"),
        Participant::new("Brutus", "m"),
    );
    store.create_match(&mut m).await?;
    let debate = DebateResult::new(1, vec![], Tally::default());
    store.save_debate(&m, &debate).await?;
    m.record_debate(debate)?;
    store.save_match(&m).await?;
    backend
        .write(&format!("{}/debates/debate-002.json", m.slug), b"{\"number\": 2,")
        .await?;

    let loaded = store.load_match(&m.slug).await?.expect("match present");
    assert_eq!(loaded.current_debate, 1);
    assert!(loaded.pending_learning.is_none());
    Ok(())
}

#[tokio::test]
async fn test_history_survives_reload() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut m = Match::new(
        MatchConfig::default(),
        Participant::new("Ada", "m"),
        Participant::new("Brutus", "m"),
    );

    {
        let store = MatchStore::new(Arc::new(FileBackend::new(dir.path())));
        store.create_match(&mut m).await?;
        store
            .append_history(&m.participants[0], "Debate 1", "Won topic 1")
            .await?;
        store
            .write_strategy(&m.participants[0], "Lead with evidence.")
            .await?;
    }

    let store = MatchStore::new(Arc::new(FileBackend::new(dir.path())));
    let loaded = store.load_match(&m.slug).await?.expect("match present");
    assert_eq!(loaded.participants[0].strategy, "Lead with evidence.");
    let history = store.read_history(&loaded.participants[0]).await?;
    assert!(history.contains("Won topic 1"));
    Ok(())
}
