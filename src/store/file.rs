//! Reading and writing command lists as JSON files

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::{CommandEntry, StoreError};

const APP_DIR: &str = "cmdshelf";
const FILE_NAME: &str = "commands.json";
const INDENT: &[u8] = b"    ";

/// Default location of the backing file, inside the user's configuration directory
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(FILE_NAME))
}

/// Read the backing file, creating it as an empty list if it does not exist.
///
/// An empty or whitespace-only file counts as an empty list.
///
/// # Errors
///
/// Returns `StoreError::Corrupt` if the content is not a list of entries, or
/// `StoreError::Persistence` if the file cannot be read or created.
pub fn load(path: &Path) -> Result<Vec<CommandEntry>, StoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("Creating empty command store at {}", path.display());
            create_empty(path)?;
            return Ok(Vec::new());
        }
        Err(e) => return Err(persistence(path, e)),
    };
    if contents.trim().is_empty() {
        debug!("Command store {} is empty", path.display());
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a list of entries from an arbitrary file, without creating it.
///
/// # Errors
///
/// Returns `StoreError::Persistence` if the file cannot be read, or
/// `StoreError::Import` if it does not parse as a list of entries.
pub fn read_import(path: &Path) -> Result<Vec<CommandEntry>, StoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| persistence(path, e))?;
    serde_json::from_str(&contents).map_err(|e| StoreError::Import {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write the whole list to `path`, replacing any previous content.
///
/// # Errors
///
/// Returns `StoreError::Persistence` if the file cannot be written.
pub fn write(path: &Path, entries: &[CommandEntry]) -> Result<(), StoreError> {
    let json =
        to_pretty_json(entries).map_err(|e| persistence(path, std::io::Error::other(e)))?;
    std::fs::write(path, json).map_err(|e| persistence(path, e))?;
    debug!("Wrote {} command(s) to {}", entries.len(), path.display());
    Ok(())
}

fn create_empty(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| persistence(parent, e))?;
    }
    write(path, &[])
}

fn to_pretty_json(entries: &[CommandEntry]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    entries.serialize(&mut serializer)?;
    Ok(buf)
}

fn persistence(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}
