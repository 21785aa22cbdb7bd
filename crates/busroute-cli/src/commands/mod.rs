//! Handlers for the CLI subcommands.
//!
//! main.rs parses arguments and opens the engine; each module here renders
//! one subcommand's output to a writer.

pub mod chat;
pub mod locate;
pub mod route;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use busroute_lib::{
    resolve_database_path, ConversationEngine, EngineConfig, InMemorySessionStore, SqliteStore,
};

/// Load engine tunables from a JSON file, or the defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Open the transit database and build an engine over it.
pub fn open_engine(database: Option<&Path>, config: EngineConfig) -> Result<ConversationEngine> {
    let path = resolve_database_path(database).context("failed to locate the transit database")?;
    let store = SqliteStore::open(&path)
        .with_context(|| format!("failed to open transit database at {}", path.display()))?;
    Ok(ConversationEngine::new(
        Arc::new(store),
        Arc::new(InMemorySessionStore::new()),
        config,
    ))
}
