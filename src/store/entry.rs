use serde::{Deserialize, Serialize};

use super::StoreError;

/// A named shell command as it is persisted in the backing file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub name: String,
    pub command: String,
}

impl CommandEntry {
    /// Build an entry from raw user input.
    ///
    /// Both fields are trimmed. An empty name is replaced by the first line of
    /// the command.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the command is empty after trimming.
    pub fn new(name: &str, command: &str) -> Result<Self, StoreError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(StoreError::Validation {
                position: None,
                reason: "command cannot be empty".into(),
            });
        }
        let name = match name.trim() {
            "" => first_line(command).to_string(),
            name => name.to_string(),
        };
        Ok(Self {
            name,
            command: command.to_string(),
        })
    }

    /// The command's first line, used as a one-line preview
    #[must_use]
    pub fn summary(&self) -> &str {
        first_line(&self.command)
    }

    /// Whether this entry's command is multi-line
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.command.contains('\n')
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim_end()
}
