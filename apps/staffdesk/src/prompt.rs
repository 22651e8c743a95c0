use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use async_trait::async_trait;
use client_core::ConfirmPrompt;
use tracing::warn;

/// Runs a blocking yes/no question on tokio's blocking pool.
pub struct BlockingPrompt<F> {
    ask: Arc<F>,
}

impl<F> BlockingPrompt<F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    pub fn new(ask: F) -> Self {
        Self { ask: Arc::new(ask) }
    }
}

#[async_trait]
impl<F> ConfirmPrompt for BlockingPrompt<F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    async fn confirm(&self, question: &str) -> bool {
        let ask = Arc::clone(&self.ask);
        let question = question.to_string();
        match tokio::task::spawn_blocking(move || ask(&question)).await {
            Ok(answer) => answer,
            Err(error) => {
                warn!(%error, "confirmation prompt did not finish");
                false
            }
        }
    }
}

/// Asks on stderr and reads the answer from stdin.
pub fn stdin_prompt() -> BlockingPrompt<fn(&str) -> bool> {
    BlockingPrompt::new(ask_on_terminal as fn(&str) -> bool)
}

fn ask_on_terminal(question: &str) -> bool {
    ask(io::stdin().lock(), io::stderr().lock(), question)
}

/// Anything but yes declines, including a read error.
fn ask<I: BufRead, O: Write>(mut input: I, mut output: O, question: &str) -> bool {
    let _ = write!(output, "{question} [y/N] ");
    let _ = output.flush();

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => is_affirmative(&answer),
        Err(error) => {
            warn!(%error, "could not read confirmation answer");
            false
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
