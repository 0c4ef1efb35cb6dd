//! Stdin front end for the human-controlled side

use agon_runtime::{HumanContext, HumanPrompt};
use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Answer human prompts from stdin until the gate is dropped
pub fn spawn(prompts: mpsc::UnboundedReceiver<HumanPrompt>, name: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        serve(prompts, stdin, &name).await;
    })
}

async fn serve<R: AsyncBufRead + Unpin>(
    mut prompts: mpsc::UnboundedReceiver<HumanPrompt>,
    input: R,
    name: &str,
) {
    let mut lines = input.lines();
    while let Some(prompt) = prompts.recv().await {
        match prompt {
            HumanPrompt::Input { context, reply } => {
                show_context(&context, name);
                println!(
                    "{}",
                    "Your notes (finish with an empty line):".bold().yellow()
                );
                let answer = match read_block(&mut lines).await {
                    Some(text) if !text.trim().is_empty() => Ok(text),
                    Some(_) => Err("no argument given".to_string()),
                    None => Err("input closed".to_string()),
                };
                let _ = reply.send(answer);
            }
            HumanPrompt::Continue { ack, .. } => {
                println!("{}", "Press Enter to continue".dimmed());
                let answer = match lines.next_line().await {
                    Ok(Some(_)) => Ok(()),
                    _ => Err("input closed".to_string()),
                };
                let _ = ack.send(answer);
            }
        }
    }
}

fn show_context(context: &HumanContext, name: &str) {
    println!();
    println!(
        "{} {} (turn {} of {})",
        format!("[{}]", context.topic_index + 1).dimmed(),
        context.topic.bold(),
        context.turn,
        context.turns_per_topic
    );
    match &context.opponent_last {
        Some(message) => println!("{}\n{}", "Your opponent said:".bold(), message),
        None => println!("{}, you open this topic.", name.bold()),
    }
}

/// Lines up to the first empty one; `None` once input is exhausted
async fn read_block<R: AsyncBufRead + Unpin>(
    lines: &mut tokio::io::Lines<R>,
) -> Option<String> {
    let mut block = Vec::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => break,
            Ok(Some(line)) => block.push(line),
            Ok(None) | Err(_) if block.is_empty() => return None,
            Ok(None) | Err(_) => break,
        }
    }
    Some(block.join("\n"))
}
