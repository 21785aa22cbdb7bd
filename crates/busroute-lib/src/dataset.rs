use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::error::{Error, Result};

/// Default filename for the transit database.
const DATABASE_FILENAME: &str = "transit.db";

/// Resolve the default database location using platform-specific project directories.
pub fn default_database_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("com", "busroute", "busroute").ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(DATABASE_FILENAME))
}

/// Resolve the database to open from an optional user override.
///
/// A directory override is joined with the default filename; a file override
/// is used as-is. Without an override the platform default is used. The
/// returned path is guaranteed to exist.
pub fn resolve_database_path(target: Option<&Path>) -> Result<PathBuf> {
    let path = match target {
        Some(path) if path.is_dir() => path.join(DATABASE_FILENAME),
        Some(path) => path.to_path_buf(),
        None => default_database_path()?,
    };
    debug!(path = %path.display(), "resolved transit database path");

    if !path.exists() {
        return Err(Error::DatabaseNotFound { path });
    }
    Ok(path)
}
