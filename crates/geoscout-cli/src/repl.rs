//! Interactive chat loop over stdin and stdout.

use anyhow::Context;
use geoscout_rig::chat::{ChatResponse, ChatSession};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::TRACING_TARGET_REPL;

const PROMPT: &str = "> ";

/// Commands that end the chat.
const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

/// What to do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Quit,
    Message(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Skip
        } else if QUIT_COMMANDS.contains(&line) {
            Self::Quit
        } else {
            Self::Message(line)
        }
    }
}

/// Answers a single question and returns.
pub async fn ask_once(session: &mut ChatSession, query: &str) -> anyhow::Result<()> {
    let response = session
        .send(query)
        .await
        .context("failed to answer question")?;
    print_response(&response)
}

/// Runs the chat until end of input, a quit command or Ctrl+C.
///
/// A failed message is reported and the chat continues with the next one.
pub async fn run(session: &mut ChatSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!(
        target: TRACING_TARGET_REPL,
        session = %session.id(),
        "Chat started, type /quit to leave"
    );

    loop {
        prompt().await?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: TRACING_TARGET_REPL, "Interrupted");
                break;
            }
        };

        let Some(line) = line else {
            break;
        };

        let message = match Input::parse(&line) {
            Input::Skip => continue,
            Input::Quit => break,
            Input::Message(message) => message,
        };

        match session.send(message).await {
            Ok(response) => print_response(&response)?,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_REPL,
                    error = %err,
                    retryable = err.is_retryable(),
                    "Message failed"
                );
                eprintln!("Error: {err}");
            }
        }
    }

    tracing::info!(
        target: TRACING_TARGET_REPL,
        session = %session.id(),
        turns = session.history().len(),
        "Chat ended"
    );
    Ok(())
}

async fn prompt() -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(PROMPT.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

fn print_response(response: &ChatResponse) -> anyhow::Result<()> {
    println!("{}", response.text);

    let payload = &response.payload;
    if !payload.features.is_empty() || !payload.errors.is_empty() {
        let json =
            serde_json::to_string_pretty(payload).context("failed to serialize tool results")?;
        println!("{json}");
    }

    if payload.is_partial() {
        eprintln!("Note: some results are incomplete.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_input() {
        assert_eq!(Input::parse("   "), Input::Skip);
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(Input::parse(" /exit\n"), Input::Quit);
        assert_eq!(
            Input::parse(" Find marinas "),
            Input::Message("Find marinas")
        );
    }
}
