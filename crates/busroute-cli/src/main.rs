mod commands;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use busroute_cli::logging::{init_logging, LogFormat, LoggingConfig};
use busroute_cli::output::OutputFormat;
use busroute_cli::terminal::ColorPalette;

use crate::commands::route::{RouteBy, RouteCommandArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bus route assistant")]
struct Cli {
    /// Transit database file, or a directory containing `transit.db`.
    #[arg(long, global = true, env = "BUSROUTE_DATABASE")]
    database: Option<PathBuf>,

    /// JSON file overriding engine tunables.
    #[arg(long, global = true, env = "BUSROUTE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format for command results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log output format (logs are written to stderr).
    #[arg(
        long,
        global = true,
        env = "LOG_FORMAT",
        value_enum,
        ignore_case = true,
        default_value_t = LogFormat::Text
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Converse with the assistant, one message per line on stdin.
    Chat {
        /// Conversation identifier.
        #[arg(long, default_value = "cli")]
        user: String,
    },
    /// Send one message and print the reply.
    Ask {
        /// Conversation identifier.
        #[arg(long, default_value = "cli")]
        user: String,
        /// Message text.
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Compute the best path between two places over the route graph.
    Route {
        /// Starting place.
        #[arg(long = "from")]
        from: String,
        /// Destination place.
        #[arg(long = "to")]
        to: String,
        /// Weight to minimise.
        #[arg(long, value_enum, default_value_t = RouteBy::Distance)]
        by: RouteBy,
    },
    /// Resolve a place name against the network's known locations.
    Locate {
        /// Place name as a rider would type it.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LoggingConfig::from_env().with_format(cli.log_format));

    let config = commands::load_config(cli.config.as_deref())?;
    let engine = commands::open_engine(cli.database.as_deref(), config)?;
    let palette = match cli.format {
        OutputFormat::Json => ColorPalette::plain(),
        OutputFormat::Text => ColorPalette::detect(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Chat { user } => {
            let stdin = io::stdin();
            commands::chat::handle_chat(&engine, &user, stdin.lock(), cli.format, palette, &mut out)
        }
        Command::Ask { user, message } => commands::chat::handle_ask(
            &engine,
            &user,
            &message.join(" "),
            cli.format,
            palette,
            &mut out,
        ),
        Command::Route { from, to, by } => commands::route::handle_route(
            &engine,
            &RouteCommandArgs { from, to, by },
            cli.format,
            palette,
            &mut out,
        ),
        Command::Locate { query } => commands::locate::handle_locate(
            &engine,
            &query.join(" "),
            cli.format,
            palette,
            &mut out,
        ),
    }?;

    out.flush().context("failed to flush output")
}
