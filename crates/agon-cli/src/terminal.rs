//! Terminal rendering of match progress

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use agon_core::{DebateResult, DisplayNames, Match, TopicExecutionState, TopicStatus};
use agon_llm::LlmError;
use agon_runtime::{MatchObserver, OrchestratorError};
use colored::Colorize;

/// Exchanges already rendered for one topic
#[derive(Default)]
struct TopicProgress {
    announced: bool,
    exchanges: usize,
    speaking: bool,
    streamed: bool,
}

/// Prints match events as they happen.
///
/// Live token streaming only makes sense when one topic runs at a time;
/// otherwise each finished exchange is printed as a one-line preview.
pub struct TerminalObserver {
    names: DisplayNames,
    stream: bool,
    progress: Mutex<HashMap<usize, TopicProgress>>,
}

impl TerminalObserver {
    pub fn new(m: &Match) -> Self {
        Self {
            names: m.display_names(),
            stream: m.effective_concurrency() == 1,
            progress: Mutex::new(HashMap::new()),
        }
    }

    fn name(&self, id: &agon_core::ParticipantId) -> &str {
        self.names.name_of(id)
    }
}

impl MatchObserver for TerminalObserver {
    fn on_match_start(&self, m: &Match) {
        println!(
            "{} {} vs {}  ({})",
            "Match".bold().cyan(),
            m.participants[0].name.green().bold(),
            m.participants[1].name.magenta().bold(),
            m.slug.dimmed()
        );
        if m.current_debate > 0 {
            crate::print_info(&format!(
                "Resuming after debate {} of {}",
                m.current_debate, m.config.debates
            ));
        }
    }

    fn on_debate_start(&self, m: &Match, number: u32) {
        println!();
        println!(
            "{}",
            format!("Debate {} of {}", number, m.config.debates).bold()
        );
        println!("{}", "─".repeat(50).cyan());
        if let Ok(mut progress) = self.progress.lock() {
            progress.clear();
        }
    }

    fn on_topic_state_change(&self, state: &TopicExecutionState) {
        let Ok(mut progress) = self.progress.lock() else {
            return;
        };
        let topic = progress.entry(state.topic_index).or_default();
        let label = format!("[{}]", state.topic_index + 1).dimmed();

        if !topic.announced {
            println!("{} {}", label, state.topic.bold());
            topic.announced = true;
        }

        if let Some(speaker) = state.current_speaker {
            if self.stream && !topic.speaking {
                print!(
                    "\n{} {} (turn {}): ",
                    label,
                    self.name(&speaker).bold(),
                    state.turn
                );
                let _ = std::io::stdout().flush();
            }
            topic.speaking = true;
        }

        if state.exchanges.len() > topic.exchanges {
            for exchange in &state.exchanges[topic.exchanges..] {
                if self.stream && topic.streamed {
                    println!();
                } else if self.stream {
                    // Polished human turns arrive whole
                    println!("{}", exchange.message);
                } else {
                    println!(
                        "{} {} (turn {}): {}",
                        label,
                        self.name(&exchange.speaker).bold(),
                        exchange.turn,
                        preview(&exchange.message, 72).dimmed()
                    );
                }
            }
            topic.exchanges = state.exchanges.len();
            topic.speaking = false;
            topic.streamed = false;
        }

        if state.status == TopicStatus::Complete {
            if let Some(verdict) = &state.verdict {
                let outcome = match &verdict.winner {
                    Some(winner) => format!("{} wins", self.name(winner)).green().bold(),
                    None => "tie".yellow().bold(),
                };
                println!(
                    "{} {} {}  {}",
                    label,
                    "Verdict:".bold(),
                    outcome,
                    preview(&verdict.rationale, 60).dimmed()
                );
            }
        }
    }

    fn on_topic_stream_chunk(&self, topic_index: usize, chunk: &str) {
        if self.stream {
            if let Ok(mut progress) = self.progress.lock() {
                progress.entry(topic_index).or_default().streamed = true;
            }
            print!("{}", chunk);
            let _ = std::io::stdout().flush();
        }
    }

    fn on_debate_end(&self, m: &Match, debate: &DebateResult) {
        let tally = debate.tally;
        println!(
            "{} {} {} - {} {}  ({} ties, {} abandoned)",
            "Result:".bold(),
            m.participants[0].name.green(),
            tally.speaker1_wins,
            tally.speaker2_wins,
            m.participants[1].name.magenta(),
            tally.ties,
            debate.abandoned_count()
        );
    }

    fn on_learning(&self, _m: &Match, number: u32) {
        crate::print_info(&format!("Reviewing debate {} and revising strategies", number));
    }

    fn on_match_end(&self, m: &Match, summary: Option<&str>) {
        println!();
        let (a, b) = standings(m);
        println!(
            "{} {} {} - {} {}",
            "Final:".bold().cyan(),
            m.participants[0].name.green().bold(),
            a,
            b,
            m.participants[1].name.magenta().bold()
        );
        if let Some(summary) = summary {
            println!();
            println!("{}", summary);
        }
    }

    fn on_error(&self, error: &OrchestratorError) {
        match error {
            OrchestratorError::Learning { .. } => crate::print_warning(&describe_error(error)),
            _ => crate::print_error(&describe_error(error)),
        }
    }
}

/// Topics won by each side across all recorded debates
pub fn standings(m: &Match) -> (u32, u32) {
    m.debates.iter().fold((0, 0), |(a, b), d| {
        (a + d.tally.speaker1_wins, b + d.tally.speaker2_wins)
    })
}

/// Human-readable message distinguishing rate limits and transient outages
pub fn describe_error(error: &OrchestratorError) -> String {
    match error.llm_error() {
        Some(LlmError::RateLimited) => format!(
            "The model provider is rate limiting requests. Wait a minute, then resume. ({})",
            error
        ),
        Some(e) if e.is_retryable() => format!(
            "The model provider is temporarily unavailable. Check the connection, then resume. ({})",
            error
        ),
        _ => error.to_string(),
    }
}

fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max && !text.contains('\n') {
        return line.to_string();
    }
    let cut: String = line.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_error_classes() {
        let limited = OrchestratorError::TopicGeneration(LlmError::RateLimited);
        assert!(describe_error(&limited).starts_with("The model provider is rate limiting"));

        let outage = OrchestratorError::TopicGeneration(LlmError::ConnectionFailed("reset".into()));
        assert!(describe_error(&outage).contains("temporarily unavailable"));

        let other = OrchestratorError::AllTopicsFailed { debate: 2 };
        assert_eq!(describe_error(&other), other.to_string());
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdefghij klm", 10), "abcdefghij…");
        assert_eq!(preview("one\ntwo", 10), "one…");
    }
}
