//! Core implementation of the cmdshelf command shelf
//!
//! cmdshelf keeps a list of named shell commands in a JSON file and runs them
//! one at a time, streaming their merged output. Commands that call `sudo`
//! get the password fed on standard input, asked for once and cached for the
//! rest of the session.

use std::path::PathBuf;

use log::debug;

pub mod logger;
pub mod runner;
pub mod store;
pub mod theme;
pub mod tui;

use crate::store::{CommandStore, StoreError};

/// Open the command store at `path`, or at the default location when `None`.
///
/// Returns the store and, if the file was corrupt, the error describing it.
/// The store is empty in that case.
///
/// # Errors
///
/// Returns `StoreError::Persistence` if the file cannot be read or created,
/// or if no configuration directory is known and no path was given.
pub fn open_store(
    path: Option<PathBuf>,
) -> Result<(CommandStore, Option<StoreError>), StoreError> {
    let path = match path {
        Some(path) => path,
        None => store::file::default_path().ok_or_else(|| StoreError::Persistence {
            path: PathBuf::from("commands.json"),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no configuration directory; pass --store",
            ),
        })?,
    };
    debug!("Using command store {}", path.display());
    CommandStore::open(path)
}
