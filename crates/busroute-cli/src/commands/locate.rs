//! Locate command handler.

use std::io::Write;

use anyhow::{Context, Result};

use busroute_lib::ConversationEngine;
use busroute_cli::output::{render_locate, LocateReport, OutputFormat};
use busroute_cli::terminal::ColorPalette;

/// Print the known location that best matches `query`.
pub fn handle_locate<W: Write>(
    engine: &ConversationEngine,
    query: &str,
    format: OutputFormat,
    palette: ColorPalette,
    out: &mut W,
) -> Result<()> {
    let found = engine.resolver().find_best_location_match(query);
    let report = LocateReport {
        query: query.to_string(),
        exact: found.is_exact(),
        name: found.name,
        score: found.score,
    };
    write!(out, "{}", render_locate(&report, format, palette)?)
        .context("failed to write location")?;
    Ok(())
}
