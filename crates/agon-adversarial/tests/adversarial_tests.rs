use std::sync::Arc;

use agon_adversarial::{calculate_tally, Judge, StrategyCoach, StrategyConfig};
use agon_core::{Match, MatchConfig, Participant, TopicResult, Verdict};
use agon_llm::MockProvider;
use agon_persist::{MatchStore, MemoryBackend};
use proptest::prelude::*;
use uuid::Uuid;

async fn setup() -> (Match, MatchStore<MemoryBackend>) {
    let store = MatchStore::new(Arc::new(MemoryBackend::new()));
    let mut m = Match::new(
        MatchConfig::default(),
        Participant::new("Ada", "m").with_self_revise(false),
        Participant::new("Brutus", "m"),
    );
    store.create_match(&mut m).await.unwrap();
    (m, store)
}

fn results(m: &Match) -> Vec<TopicResult> {
    let (a, b) = (m.participants[0].id, m.participants[1].id);
    vec![
        TopicResult {
            topic_index: 0,
            topic: "Remote work".into(),
            first_speaker: a,
            exchanges: vec![],
            verdict: Some(Verdict::new(Some(a), "tighter")),
            error: None,
        },
        TopicResult {
            topic_index: 1,
            topic: "Nuclear power".into(),
            first_speaker: b,
            exchanges: vec![],
            verdict: Some(Verdict::new(Some(b), "better data")),
            error: None,
        },
    ]
}

fn history_entries(history: &str) -> usize {
    history.matches("\n## ").count()
}

#[tokio::test]
async fn test_self_revision_disabled_keeps_strategy() {
    let (m, store) = setup().await;
    let coach = StrategyCoach::new(Arc::new(MockProvider::smart()), store.clone());
    let ada = &m.participants[0];

    let before_strategy = store.read_strategy(ada).await.unwrap();
    let before_history = store.read_history(ada).await.unwrap();

    let update = coach
        .update_after_debate(ada, &m.participants[1], 1, &results(&m), &m.display_names())
        .await
        .unwrap()
        .expect("participant has storage");

    assert!(update.revised.is_none());
    assert_eq!(store.read_strategy(ada).await.unwrap(), before_strategy);

    let after_history = store.read_history(ada).await.unwrap();
    assert_eq!(history_entries(&after_history), history_entries(&before_history) + 1);
    assert!(after_history.contains("- Topic 1 (Remote work): won"));
    assert!(after_history.contains("- Topic 2 (Nuclear power): lost"));
}

#[tokio::test]
async fn test_self_revision_rewrites_from_full_history() {
    let (m, store) = setup().await;
    let llm = Arc::new(MockProvider::smart());
    let coach = StrategyCoach::new(llm.clone(), store.clone())
        .with_config(StrategyConfig::from(&m.config));
    let brutus = &m.participants[1];

    for n in 1..=2 {
        coach
            .update_after_debate(brutus, &m.participants[0], n, &results(&m), &m.display_names())
            .await
            .unwrap();
    }

    let strategy = store.read_strategy(brutus).await.unwrap().unwrap();
    assert!(strategy.starts_with("Lead with one concrete example"));

    // The last revision prompt carried both history entries
    let last = llm.requests().pop().unwrap();
    assert!(last.prompt.contains("## Debate 1"));
    assert!(last.prompt.contains("## Debate 2"));
}

#[tokio::test]
async fn test_judge_and_tally_over_debate() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    // Smart mock cycles A, B, tie
    let judge = Judge::new(Arc::new(MockProvider::smart()));
    let exchange = |speaker| agon_core::Exchange {
        speaker,
        message: "point".into(),
        turn: 1,
        topic_index: 0,
    };

    let mut verdicts = Vec::new();
    for i in 0..3 {
        verdicts.push(
            judge
                .judge(i, "t", &[exchange(a), exchange(b)], a, b)
                .await
                .unwrap(),
        );
    }
    let tally = calculate_tally(&verdicts, a, b);
    assert_eq!((tally.speaker1_wins, tally.speaker2_wins, tally.ties), (1, 1, 1));
}

proptest! {
    #[test]
    fn tally_total_matches_verdict_count(picks in proptest::collection::vec(0u8..4, 0..40)) {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let verdicts: Vec<Verdict> = picks
            .iter()
            .map(|p| match p {
                0 => Verdict::new(Some(a), "r"),
                1 => Verdict::new(Some(b), "r"),
                2 => Verdict::tie("r"),
                _ => Verdict::new(Some(Uuid::new_v4()), "r"),
            })
            .collect();
        let tally = calculate_tally(&verdicts, a, b);
        prop_assert_eq!(tally.total() as usize, verdicts.len());
    }
}
