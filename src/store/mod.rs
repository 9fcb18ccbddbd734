//! Persistent, ordered list of named shell commands
//!
//! The store keeps its entries in memory and rewrites the whole backing file
//! after every mutation. Entries are addressed by their position in the list,
//! so any index held by a caller is only valid until the next mutation.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

pub mod entry;
pub mod file;

pub use entry::CommandEntry;

/// Errors that can occur while reading, changing or writing the command store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Command store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unable to access {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid command{}: {reason}", position_suffix(.position))]
    Validation {
        position: Option<usize>,
        reason: String,
    },
    #[error("No command at index {index} (the store has {len})")]
    Index { index: usize, len: usize },
    #[error("Unable to import {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[allow(clippy::ref_option, reason = "thiserror passes fields by reference")]
fn position_suffix(position: &Option<usize>) -> String {
    position.map_or_else(String::new, |p| format!(" at position {p}"))
}

/// The command list together with the file it is persisted in
#[derive(Debug)]
pub struct CommandStore {
    path: PathBuf,
    entries: Vec<CommandEntry>,
}

impl CommandStore {
    /// Open the store backed by `path`.
    ///
    /// A missing file is created as an empty list. A corrupt file yields an
    /// empty store together with the `StoreError::Corrupt` describing it; the
    /// file itself is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if the file exists but cannot be read,
    /// or cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, Option<StoreError>), StoreError> {
        let path = path.into();
        match file::load(&path) {
            Ok(entries) => {
                debug!("Loaded {} command(s) from {}", entries.len(), path.display());
                Ok((Self { path, entries }, None))
            }
            Err(e @ StoreError::Corrupt { .. }) => {
                warn!("{e}");
                let store = Self {
                    path,
                    entries: Vec::new(),
                };
                Ok((store, Some(e)))
            }
            Err(e) => Err(e),
        }
    }

    /// Re-read the backing file, e.g. after it was changed by another program.
    /// Returns whether the entries differ from the ones held before.
    ///
    /// On error the in-memory entries are kept as they were.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` or `StoreError::Persistence` as `open` does.
    pub fn reload(&mut self) -> Result<bool, StoreError> {
        let entries = file::load(&self.path)?;
        if entries == self.entries {
            return Ok(false);
        }
        self.entries = entries;
        info!("Reloaded {} command(s)", self.entries.len());
        Ok(true)
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CommandEntry> {
        self.entries.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write all entries to the backing file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` on I/O failure.
    pub fn save(&self) -> Result<(), StoreError> {
        file::write(&self.path, &self.entries)
    }

    /// Append a new entry and save, returning its index.
    ///
    /// When `name` is blank the first line of `command` is used instead.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` (and changes nothing) if `command` is
    /// blank. Returns `StoreError::Persistence` if saving fails; the entry is
    /// still added in memory.
    pub fn add(&mut self, name: &str, command: &str) -> Result<usize, StoreError> {
        let entry = CommandEntry::new(name, command)?;
        info!("Adding command '{}'", entry.name);
        self.entries.push(entry);
        self.save()?;
        Ok(self.entries.len() - 1)
    }

    /// Replace the entry at `index` and save.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Index` if there is no entry at `index`, or
    /// `StoreError::Validation` if `command` is blank; in both cases nothing
    /// changes. Returns `StoreError::Persistence` if saving fails.
    pub fn update(&mut self, index: usize, name: &str, command: &str) -> Result<(), StoreError> {
        self.check_index(index)?;
        let entry = CommandEntry::new(name, command)?;
        info!("Updating command {index} to '{}'", entry.name);
        self.entries[index] = entry;
        self.save()
    }

    /// Remove the entry at `index` and save, returning the removed entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Index` if there is no entry at `index`, or
    /// `StoreError::Persistence` if saving fails.
    pub fn delete(&mut self, index: usize) -> Result<CommandEntry, StoreError> {
        self.check_index(index)?;
        let removed = self.entries.remove(index);
        info!("Deleted command '{}'", removed.name);
        self.save()?;
        Ok(removed)
    }

    /// Replace every entry and save.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if saving fails.
    pub fn replace_all(&mut self, entries: Vec<CommandEntry>) -> Result<(), StoreError> {
        info!("Replacing all commands ({} new)", entries.len());
        self.entries = entries;
        self.save()
    }

    /// Write the current entries to an arbitrary file.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if the file cannot be written.
    pub fn export_to(&self, path: &Path) -> Result<(), StoreError> {
        file::write(path, &self.entries)?;
        info!(
            "Exported {} command(s) to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Replace every entry with the validated content of `path`, returning the
    /// number of imported entries.
    ///
    /// Blank names are derived from the command as in [`CommandStore::add`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` if the file cannot be read,
    /// `StoreError::Import` if it is not a list of entries, or
    /// `StoreError::Validation` naming the first entry with a blank command.
    /// The store is unchanged in all these cases.
    pub fn import_from(&mut self, path: &Path) -> Result<usize, StoreError> {
        let raw = file::read_import(path)?;
        let entries = raw
            .iter()
            .enumerate()
            .map(|(position, e)| {
                CommandEntry::new(&e.name, &e.command).map_err(|_| StoreError::Validation {
                    position: Some(position),
                    reason: format!("entry '{}' has an empty command", e.name),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let count = entries.len();
        self.replace_all(entries)?;
        info!("Imported {count} command(s) from {}", path.display());
        Ok(count)
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(StoreError::Index {
                index,
                len: self.entries.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(dir: &Path, content: &str) -> CommandStore {
        let path = dir.join("commands.json");
        std::fs::write(&path, content).unwrap();
        let (store, warning) = CommandStore::open(path).unwrap();
        assert!(warning.is_none());
        store
    }

    #[test]
    fn test_add_appends_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(dir.path(), r#"[{"name": "a", "command": "echo 1"}]"#);
        let index = store.add("", "echo hi\nmore").unwrap();
        assert_eq!(index, 1);
        assert_eq!(store.get(0).unwrap().name, "a");
        assert_eq!(store.get(1).unwrap().name, "echo hi");

        let (reopened, _) = CommandStore::open(store.path().to_path_buf()).unwrap();
        assert_eq!(reopened.entries(), store.entries());
    }

    #[test]
    fn test_add_blank_command_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(dir.path(), r#"[{"name": "a", "command": "echo 1"}]"#);
        let before = std::fs::read_to_string(store.path()).unwrap();
        let result = store.add("x", "");
        assert!(matches!(result, Err(StoreError::Validation { .. })));
        assert_eq!(store.len(), 1);
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_update_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(dir.path(), r#"[{"name": "a", "command": "echo 1"}]"#);
        match store.update(1, "b", "echo 2") {
            Err(StoreError::Index { index, len }) => {
                assert_eq!(index, 1);
                assert_eq!(len, 1);
            }
            other => panic!("Expected StoreError::Index, got: {other:?}"),
        }
        assert_eq!(store.get(0).unwrap().command, "echo 1");
    }

    #[test]
    fn test_update_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(
            dir.path(),
            r#"[{"name": "a", "command": "echo 1"}, {"name": "b", "command": "echo 2"}]"#,
        );
        store.update(0, "", "ls -la").unwrap();
        assert_eq!(store.get(0).unwrap().name, "ls -la");
        assert_eq!(store.get(1).unwrap().name, "b");
    }

    #[test]
    fn test_update_blank_command_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(dir.path(), r#"[{"name": "a", "command": "echo 1"}]"#);
        assert!(matches!(
            store.update(0, "a", "  "),
            Err(StoreError::Validation { .. })
        ));
        assert_eq!(store.get(0).unwrap().command, "echo 1");
    }

    #[test]
    fn test_delete_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(dir.path(), "[]");
        assert!(matches!(
            store.delete(0),
            Err(StoreError::Index { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_validation_message_mentions_position() {
        let err = StoreError::Validation {
            position: Some(3),
            reason: "empty".into(),
        };
        assert_eq!(err.to_string(), "Invalid command at position 3: empty");
        let err = StoreError::Validation {
            position: None,
            reason: "empty".into(),
        };
        assert_eq!(err.to_string(), "Invalid command: empty");
    }

    #[test]
    fn test_reload_keeps_entries_on_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_with(dir.path(), r#"[{"name": "a", "command": "echo 1"}]"#);
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.reload(), Err(StoreError::Corrupt { .. })));
        assert_eq!(store.len(), 1);
    }
}
