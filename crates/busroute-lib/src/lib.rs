//! Bus route assistant library entry points.
//!
//! This crate resolves colloquial place names, builds route graphs from a
//! transit store, runs distance and fare pathfinding, and drives the
//! multi-turn conversation that ties them together. Front-ends (the CLI)
//! should depend on the items exported here instead of reimplementing
//! behavior.

pub mod config;
pub mod conversation;
pub mod dataset;
pub mod db;
pub mod error;
pub mod graph;
pub mod location;
pub mod model;
pub mod path;
pub mod response;
pub mod search;
pub mod session;
pub mod store;

pub use config::EngineConfig;
pub use conversation::{classify_intent, ConversationEngine, Intent};
pub use dataset::{default_database_path, resolve_database_path};
pub use db::SqliteStore;
pub use error::{Error, Result};
pub use graph::{build_graph, Graph, RouteObjective};
pub use location::{extract_locations, normalize_location, LocationMatch, LocationResolver};
pub use model::{BusRecord, LiveLocation, RouteRecord, StopRecord};
pub use path::{find_best_path, PathFinder, PathResult};
pub use response::{ResponseKind, ResponsePayload, RouteSummary};
pub use search::RouteSearch;
pub use session::{ConversationState, InMemorySessionStore, Session, SessionStore};
pub use store::{InMemoryStore, TransitStore};
