//! Rendering of engine replies and command reports.
//!
//! Every renderer returns a `String` so commands decide where it is written
//! and tests can inspect it directly.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use busroute_lib::response::rupees;
use busroute_lib::{PathResult, ResponsePayload, RouteSummary};

use crate::terminal::ColorPalette;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Result of a `route` command.
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub source: String,
    pub destination: String,
    /// "distance" or "fare".
    pub objective: &'static str,
    /// Graph path, when one exists.
    pub path: Option<PathResult>,
    /// Routes serving the pair directly, used when no graph path exists.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<RouteSummary>,
}

/// Result of a `locate` command.
#[derive(Debug, Clone, Serialize)]
pub struct LocateReport {
    pub query: String,
    pub name: String,
    pub score: f64,
    pub exact: bool,
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialise output as JSON")
}

/// Render one assistant reply.
pub fn render_reply(
    payload: &ResponsePayload,
    format: OutputFormat,
    palette: ColorPalette,
) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(payload);
    }

    let mut out = String::new();
    let mut lines = payload.message.lines();
    if let Some(first) = lines.next() {
        let _ = writeln!(out, "{}{}{}", palette.heading, first, palette.reset);
    }
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    if !payload.suggestions.is_empty() {
        let _ = writeln!(
            out,
            "\n{}Suggestions: {}{}",
            palette.gray,
            payload.suggestions.join(" | "),
            palette.reset
        );
    }
    Ok(out)
}

/// Render the outcome of a graph search.
pub fn render_route(
    report: &RouteReport,
    format: OutputFormat,
    palette: ColorPalette,
) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    let Some(path) = &report.path else {
        let _ = writeln!(
            out,
            "{}No connected path from {} to {} (by {}){}",
            palette.heading, report.source, report.destination, report.objective, palette.reset
        );
        if !report.routes.is_empty() {
            out.push_str("Routes serving this journey:\n");
            for route in &report.routes {
                let _ = writeln!(
                    out,
                    "- Route {}: {} → {} ({}{}{})",
                    route.route_number,
                    route.start_location,
                    route.end_location,
                    palette.green,
                    rupees(route.fare),
                    palette.reset
                );
            }
        }
        return Ok(out);
    };

    let _ = writeln!(
        out,
        "{}{} → {} (by {}){}",
        palette.heading, report.source, report.destination, report.objective, palette.reset
    );
    let _ = writeln!(
        out,
        "Path: {}{}{}",
        palette.cyan,
        path.path.join(" → "),
        palette.reset
    );
    let _ = writeln!(out, "Hops: {}", path.hops());
    match report.objective {
        "fare" => {
            let _ = writeln!(
                out,
                "Total fare: {}{}{}",
                palette.green,
                rupees(path.total_weight),
                palette.reset
            );
        }
        _ => {
            let _ = writeln!(out, "Total distance: {:.2} km", path.total_weight);
        }
    }
    if let Some(route) = &path.route {
        let _ = writeln!(out, "Final route: {}", route.route_number);
    }
    Ok(out)
}

/// Render a location lookup.
pub fn render_locate(
    report: &LocateReport,
    format: OutputFormat,
    palette: ColorPalette,
) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }
    let kind = if report.exact { "exact" } else { "approximate" };
    Ok(format!(
        "{}{}{} (score {}{:.2}{}, {kind})\n",
        palette.cyan, report.name, palette.reset, palette.green, report.score, palette.reset
    ))
}
