//! `chat` and `ask` command handlers.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use busroute_lib::ConversationEngine;
use busroute_cli::output::{render_reply, OutputFormat};
use busroute_cli::terminal::ColorPalette;

const EXIT_COMMANDS: &[&str] = &["quit", "exit", "bye"];

/// Answer a single message.
pub fn handle_ask<W: Write>(
    engine: &ConversationEngine,
    user: &str,
    message: &str,
    format: OutputFormat,
    palette: ColorPalette,
    out: &mut W,
) -> Result<()> {
    let reply = engine.process_message(user, message);
    write!(out, "{}", render_reply(&reply, format, palette)?).context("failed to write reply")?;
    Ok(())
}

/// Answer one message per input line until EOF or an exit command.
pub fn handle_chat<R: BufRead, W: Write>(
    engine: &ConversationEngine,
    user: &str,
    input: R,
    format: OutputFormat,
    palette: ColorPalette,
    out: &mut W,
) -> Result<()> {
    let mut turns = 0usize;
    for line in input.lines() {
        let line = line.context("failed to read from stdin")?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&text.to_lowercase().as_str()) {
            break;
        }

        handle_ask(engine, user, text, format, palette, out)?;
        writeln!(out).context("failed to write reply")?;
        out.flush().context("failed to flush output")?;
        turns += 1;
    }
    debug!(user, turns, "chat session ended");
    Ok(())
}
