use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Modal, PathAction};
use super::form::{FormField, TextInput};

/// Apply an editing key to a text input. Returns false if the key is not an
/// editing key.
fn edit_text(input: &mut TextInput, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        _ => return false,
    }
    true
}

impl App {
    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.modal {
            Modal::None => self.handle_main_key(key),
            Modal::Form(_) => self.handle_form_key(&key),
            Modal::Password { .. } => self.handle_password_key(&key),
            Modal::ConfirmDelete(_) => match key.code {
                KeyCode::Char('y' | 'Y') | KeyCode::Enter => self.confirm_delete(),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => self.modal = Modal::None,
                _ => {}
            },
            Modal::Path { .. } => self.handle_path_key(&key),
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) {
        let page = isize::try_from(self.output_height.max(1)).unwrap_or(isize::MAX);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Home | KeyCode::Char('g') => self.move_cursor(isize::MIN),
            KeyCode::End | KeyCode::Char('G') => self.move_cursor(isize::MAX),
            KeyCode::Enter | KeyCode::Char('r') => self.run_selected(),
            KeyCode::Char('s') => self.cancel_run(),
            KeyCode::Char('c') => {
                self.output.clear();
                self.status = None;
            }
            KeyCode::Char('a') => self.open_add(),
            KeyCode::Char('e') => self.open_edit(),
            KeyCode::Char('d') | KeyCode::Delete => self.open_delete(),
            KeyCode::Char('x') => self.open_path(PathAction::Export),
            KeyCode::Char('i') => self.open_path(PathAction::Import),
            KeyCode::Char('u') => self.clear_credential(),
            KeyCode::Char('L') => {
                self.show_logs = !self.show_logs;
                self.log_scroll = 0;
            }
            KeyCode::PageUp if self.show_logs => {
                self.log_scroll = self.log_scroll.saturating_add(page.unsigned_abs());
            }
            KeyCode::PageDown if self.show_logs => {
                self.log_scroll = self.log_scroll.saturating_sub(page.unsigned_abs());
            }
            KeyCode::PageUp => self.output.scroll_by(page),
            KeyCode::PageDown => self.output.scroll_by(-page),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: &KeyEvent) {
        let Modal::Form(ref mut form) = self.modal else {
            return;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.modal = Modal::None,
            KeyCode::Char('s') if ctrl => self.submit_form(),
            KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
            KeyCode::Enter if form.focus == FormField::Name => form.toggle_focus(),
            KeyCode::Enter => form.command.insert('\n'),
            _ => {
                edit_text(form.focused_mut(), key);
            }
        }
    }

    fn handle_password_key(&mut self, key: &KeyEvent) {
        let Modal::Password { ref mut input, .. } = self.modal else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.submit_password(None),
            KeyCode::Enter => {
                let password = input.text().to_string();
                self.submit_password(Some(password));
            }
            _ => {
                edit_text(input, key);
            }
        }
    }

    fn handle_path_key(&mut self, key: &KeyEvent) {
        let Modal::Path { ref mut input, .. } = self.modal else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.modal = Modal::None,
            KeyCode::Enter => self.submit_path(),
            _ => {
                edit_text(input, key);
            }
        }
    }
}
