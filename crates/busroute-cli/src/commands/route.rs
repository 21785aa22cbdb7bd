//! Route command handler for graph searches between two places.

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

use busroute_lib::{ConversationEngine, RouteObjective, RouteSummary};
use busroute_cli::output::{render_route, OutputFormat, RouteReport};
use busroute_cli::terminal::ColorPalette;

/// Edge weight to minimise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RouteBy {
    #[default]
    Distance,
    Fare,
}

impl RouteBy {
    fn name(self) -> &'static str {
        match self {
            RouteBy::Distance => "distance",
            RouteBy::Fare => "fare",
        }
    }

    fn objective(self) -> RouteObjective {
        match self {
            RouteBy::Distance => RouteObjective::Distance,
            RouteBy::Fare => RouteObjective::Fare,
        }
    }
}

/// Arguments for the route command.
#[derive(Debug, Clone)]
pub struct RouteCommandArgs {
    pub from: String,
    pub to: String,
    pub by: RouteBy,
}

/// Resolve both places, run the graph search, and fall back to matching
/// routes by name when the graph has no connection.
pub fn handle_route<W: Write>(
    engine: &ConversationEngine,
    args: &RouteCommandArgs,
    format: OutputFormat,
    palette: ColorPalette,
    out: &mut W,
) -> Result<()> {
    let source = engine.resolver().find_best_location_match(&args.from).name;
    let destination = engine.resolver().find_best_location_match(&args.to).name;

    let path = match args.by.objective() {
        RouteObjective::Distance => engine.paths().shortest_by_distance(&source, &destination),
        RouteObjective::Fare => engine.paths().cheapest_by_fare(&source, &destination),
    }
    .context("failed to load the route graph")?;

    let mut routes = Vec::new();
    if path.is_none() {
        let matches = engine
            .search()
            .find_routes(&args.from, &args.to)
            .context("failed to search routes")?;
        for route in &matches {
            let bus = engine
                .search()
                .bus_for(route)
                .context("failed to load bus details")?;
            routes.push(RouteSummary::new(route, bus.as_ref()));
        }
        if routes.is_empty() {
            bail!("no route found between {source} and {destination}");
        }
    }

    let report = RouteReport {
        source,
        destination,
        objective: args.by.name(),
        path,
        routes,
    };
    write!(out, "{}", render_route(&report, format, palette)?).context("failed to write route")?;
    Ok(())
}
