//! Text inputs used by the modal dialogs

use crate::store::CommandEntry;

/// Editable text with a cursor, optionally allowing line breaks
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    text: String,
    /// Byte offset of the cursor, always on a char boundary
    cursor: usize,
    multiline: bool,
}

impl TextInput {
    #[must_use]
    pub fn single_line(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.len(),
            multiline: false,
        }
    }

    #[must_use]
    pub fn multi_line(text: &str) -> Self {
        Self {
            multiline: true,
            ..Self::single_line(text)
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn insert(&mut self, c: char) {
        if c == '\n' && !self.multiline {
            return;
        }
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.text.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn left(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    /// Move to the start of the current line
    pub fn home(&mut self) {
        self.cursor = self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
    }

    /// Move to the end of the current line
    pub fn end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |i| self.cursor + i);
    }

    /// Text split around the cursor: (before, after)
    #[must_use]
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.cursor)
    }
}

/// Which field of the entry form has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Command,
}

/// Add/edit dialog for a command entry
#[derive(Debug, Clone)]
pub struct EntryForm {
    /// Index being edited, `None` when adding
    pub editing: Option<usize>,
    pub name: TextInput,
    pub command: TextInput,
    pub focus: FormField,
}

impl EntryForm {
    #[must_use]
    pub fn add() -> Self {
        Self {
            editing: None,
            name: TextInput::single_line(""),
            command: TextInput::multi_line(""),
            focus: FormField::Name,
        }
    }

    #[must_use]
    pub fn edit(index: usize, entry: &CommandEntry) -> Self {
        Self {
            editing: Some(index),
            name: TextInput::single_line(&entry.name),
            command: TextInput::multi_line(&entry.command),
            focus: FormField::Command,
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            " Edit command "
        } else {
            " Add command "
        }
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            FormField::Name => &mut self.name,
            FormField::Command => &mut self.command,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FormField::Name => FormField::Command,
            FormField::Command => FormField::Name,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut input = TextInput::single_line("ab");
        input.left();
        input.insert('ø');
        assert_eq!(input.text(), "aøb");
        input.backspace();
        assert_eq!(input.text(), "ab");
        input.right();
        input.backspace();
        assert_eq!(input.text(), "a");
    }

    #[test]
    fn test_single_line_rejects_newline() {
        let mut input = TextInput::single_line("");
        input.insert('\n');
        assert_eq!(input.text(), "");
        let mut input = TextInput::multi_line("");
        input.insert('\n');
        assert_eq!(input.text(), "\n");
    }

    #[test]
    fn test_home_end_are_line_relative() {
        let mut input = TextInput::multi_line("first\nsecond");
        input.home();
        assert_eq!(input.split_at_cursor(), ("first\n", "second"));
        input.left();
        input.home();
        assert_eq!(input.split_at_cursor(), ("", "first\nsecond"));
        input.end();
        assert_eq!(input.split_at_cursor(), ("first", "\nsecond"));
    }

    #[test]
    fn test_edit_form_prefills() {
        let entry = CommandEntry {
            name: "list".into(),
            command: "ls -la".into(),
        };
        let mut form = EntryForm::edit(2, &entry);
        assert_eq!(form.editing, Some(2));
        assert_eq!(form.focus, FormField::Command);
        form.toggle_focus();
        form.focused_mut().insert('!');
        assert_eq!(form.name.text(), "list!");
    }
}
