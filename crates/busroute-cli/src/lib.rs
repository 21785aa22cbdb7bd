//! Bus route assistant CLI library.
//!
//! Logging setup, terminal styling, and rendering of engine replies for the
//! `busroute-cli` binary.

pub mod logging;
pub mod output;
pub mod terminal;
