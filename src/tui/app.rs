use std::path::PathBuf;

use log::{debug, warn};
use ratatui::widgets::ListState;
use tokio::sync::mpsc;

use crate::runner::messages::finished_label;
use crate::runner::{RunError, RunEvent, Runner, SudoCredential};
use crate::store::{CommandEntry, CommandStore, StoreError};

use super::form::{EntryForm, TextInput};
use super::log_state::LogBuffer;
use super::output_state::OutputBuffer;

/// Events dispatched to the main application loop
pub enum AppEvent {
    LogUpdated,
    StoreChanged,
}

/// What a path dialog does with the path once accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAction {
    Export,
    Import,
}

/// Dialog currently drawn over the main view
#[derive(Debug, Default)]
pub enum Modal {
    #[default]
    None,
    Form(EntryForm),
    /// Sudo password for `entry`, which runs once the password is accepted
    Password { entry: CommandEntry, input: TextInput },
    ConfirmDelete(usize),
    Path {
        action: PathAction,
        input: TextInput,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// One-line feedback shown above the toolbar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Main application state for the TUI
pub struct App {
    pub store: CommandStore,
    pub runner: Runner,
    pub list_state: ListState,
    pub output: OutputBuffer,
    pub modal: Modal,
    pub status: Option<StatusMessage>,
    /// Name of the entry that is (or was last) running
    pub running_name: Option<String>,
    pub last_exit: Option<Option<i32>>,
    pub event_tx: mpsc::Sender<AppEvent>,
    pub event_rx: mpsc::Receiver<AppEvent>,
    pub run_rx: mpsc::Receiver<RunEvent>,
    pub should_quit: bool,
    /// Whether the log panel is shown instead of the output
    pub show_logs: bool,
    pub log_buffer: LogBuffer,
    /// Scroll offset for the log panel (0 = bottom / newest)
    pub log_scroll: usize,
    /// Height of the output panel at the last render, for page scrolling
    pub(super) output_height: usize,
}

impl App {
    #[must_use]
    pub fn new(store: CommandStore, log_buffer: LogBuffer) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (run_tx, run_rx) = mpsc::channel(256);
        let mut list_state = ListState::default();
        if !store.is_empty() {
            list_state.select(Some(0));
        }
        App {
            store,
            runner: Runner::new(run_tx),
            list_state,
            output: OutputBuffer::new(),
            modal: Modal::None,
            status: None,
            running_name: None,
            last_exit: None,
            event_tx,
            event_rx,
            run_rx,
            should_quit: false,
            show_logs: false,
            log_buffer,
            log_scroll: 0,
            output_height: 0,
        }
    }

    /// Index of the highlighted entry
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.list_state.selected()
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.store.is_empty() {
            self.list_state.select(None);
            return;
        }
        let last = self.store.len() - 1;
        let next = self
            .cursor()
            .map_or(0, |c| c.saturating_add_signed(delta).min(last));
        self.list_state.select(Some(next));
    }

    /// Keep the cursor on an existing entry after the list changed
    fn clamp_cursor(&mut self) {
        let selected = match (self.store.len(), self.cursor()) {
            (0, _) => None,
            (len, Some(c)) => Some(c.min(len - 1)),
            (_, None) => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            kind: StatusKind::Info,
            text: text.into(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        warn!("{text}");
        self.status = Some(StatusMessage {
            kind: StatusKind::Error,
            text,
        });
    }

    /// Run the highlighted entry, asking for a sudo password first if needed
    pub fn run_selected(&mut self) {
        let Some(entry) = self.cursor().and_then(|i| self.store.get(i)).cloned() else {
            self.set_error("Please select a command to run");
            return;
        };
        if self.runner.is_running() {
            self.report_run_error(&RunError::AlreadyRunning);
            return;
        }
        if self.runner.needs_prompt(&entry.command) {
            self.modal = Modal::Password {
                entry,
                input: TextInput::single_line(""),
            };
            return;
        }
        self.start_run(entry, None);
    }

    /// Answer to the password dialog: `None` when it was dismissed
    pub fn submit_password(&mut self, password: Option<String>) {
        let Modal::Password { entry, .. } = std::mem::take(&mut self.modal) else {
            return;
        };
        self.start_run(entry, password.map(SudoCredential::new));
    }

    fn start_run(&mut self, entry: CommandEntry, credential: Option<SudoCredential>) {
        match self.runner.run(&entry.command, || credential) {
            Ok(()) => {
                self.running_name = Some(entry.name);
                self.status = None;
                self.last_exit = None;
                self.output.scroll_to_bottom();
            }
            Err(e) => self.report_run_error(&e),
        }
    }

    fn report_run_error(&mut self, e: &RunError) {
        match e {
            RunError::Cancelled => self.set_info(e.to_string()),
            RunError::AlreadyRunning => {
                self.set_info("A command is already running. Please wait for it to finish.");
            }
            _ => self.set_error(e.to_string()),
        }
    }

    /// Stop the running command
    pub fn cancel_run(&mut self) {
        match self.runner.cancel() {
            Ok(()) => self.set_info("Stopping command..."),
            Err(e) => self.set_info(e.to_string()),
        }
    }

    pub fn clear_credential(&mut self) {
        if self.runner.has_credential() {
            self.runner.clear_credential();
            self.set_info("Forgot the cached sudo password");
        } else {
            self.set_info("No sudo password cached");
        }
    }

    pub fn open_add(&mut self) {
        self.modal = Modal::Form(EntryForm::add());
    }

    pub fn open_edit(&mut self) {
        match self.cursor().and_then(|i| Some((i, self.store.get(i)?))) {
            Some((index, entry)) => self.modal = Modal::Form(EntryForm::edit(index, entry)),
            None => self.set_error("Please select a command to update"),
        }
    }

    pub fn open_delete(&mut self) {
        match self.cursor() {
            Some(index) if index < self.store.len() => self.modal = Modal::ConfirmDelete(index),
            _ => self.set_error("Please select a command to delete"),
        }
    }

    pub fn open_path(&mut self, action: PathAction) {
        let default = match action {
            PathAction::Export => "commands-export.json",
            PathAction::Import => "",
        };
        self.modal = Modal::Path {
            action,
            input: TextInput::single_line(default),
        };
    }

    /// Save the entry form. The form stays open when validation fails.
    pub fn submit_form(&mut self) {
        let Modal::Form(ref form) = self.modal else {
            return;
        };
        let (editing, name, command) = (
            form.editing,
            form.name.text().to_string(),
            form.command.text().to_string(),
        );
        let result = match editing {
            Some(index) => self.store.update(index, &name, &command).map(|()| index),
            None => self.store.add(&name, &command),
        };
        match result {
            Ok(index) => {
                self.modal = Modal::None;
                self.list_state.select(Some(index));
                let verb = if editing.is_some() { "updated" } else { "added" };
                self.set_info(format!("Command {verb} successfully"));
            }
            Err(e @ StoreError::Validation { .. }) => self.set_error(e.to_string()),
            Err(e) => {
                self.modal = Modal::None;
                self.clamp_cursor();
                self.set_error(e.to_string());
            }
        }
    }

    pub fn confirm_delete(&mut self) {
        let Modal::ConfirmDelete(index) = std::mem::take(&mut self.modal) else {
            return;
        };
        match self.store.delete(index) {
            Ok(removed) => {
                self.clamp_cursor();
                self.set_info(format!("Deleted '{}'", removed.name));
            }
            Err(e) => {
                self.clamp_cursor();
                self.set_error(e.to_string());
            }
        }
    }

    pub fn submit_path(&mut self) {
        let Modal::Path { action, input } = std::mem::take(&mut self.modal) else {
            return;
        };
        let path = PathBuf::from(input.text().trim());
        if path.as_os_str().is_empty() {
            self.set_error("Please enter a file path");
            return;
        }
        match action {
            PathAction::Export => match self.store.export_to(&path) {
                Ok(()) => self.set_info(format!("Commands exported to {}", path.display())),
                Err(e) => self.set_error(e.to_string()),
            },
            PathAction::Import => match self.store.import_from(&path) {
                Ok(count) => {
                    self.list_state.select(None);
                    self.clamp_cursor();
                    self.set_info(format!(
                        "Imported {count} command(s) from {}",
                        path.display()
                    ));
                }
                Err(e) => {
                    self.clamp_cursor();
                    self.set_error(e.to_string());
                }
            },
        }
    }

    /// Apply one event from the runner
    pub fn handle_run_event(&mut self, event: RunEvent) {
        match event {
            RunEvent::Started { command } => {
                debug!("Run started");
                self.output.push_banner(&command);
            }
            RunEvent::Output(text) => self.output.push_output(&text),
            RunEvent::Finished { exit_code } => {
                self.output.push_footer(&finished_label(exit_code));
                self.last_exit = Some(exit_code);
            }
        }
    }

    /// Handle app events (called from event loop)
    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LogUpdated => {
                // Redraw happens automatically on next frame
            }
            AppEvent::StoreChanged => self.reload_store(),
        }
    }

    /// Reload the store after the backing file changed on disk
    fn reload_store(&mut self) {
        match self.store.reload() {
            Ok(true) => {
                self.clamp_cursor();
                self.set_info("Command list changed on disk and was reloaded");
            }
            Ok(false) => debug!("Command store unchanged on disk"),
            Err(e) => self.set_error(format!("Failed to reload command store: {e}")),
        }
    }

    /// Stop the running command, if any, before exiting
    pub fn shutdown(&mut self) {
        if self.runner.is_running()
            && let Err(e) = self.runner.cancel()
        {
            warn!("Failed to stop running command: {e}");
        }
        self.runner.clear_credential();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(content: &str) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");
        std::fs::write(&path, content).unwrap();
        let (store, _) = CommandStore::open(path).unwrap();
        (dir, App::new(store, LogBuffer::new()))
    }

    const TWO: &str = r#"[{"name": "a", "command": "echo 1"}, {"name": "b", "command": "echo 2"}]"#;

    #[test]
    fn test_cursor_starts_on_first_entry() {
        let (_dir, app) = app_with(TWO);
        assert_eq!(app.cursor(), Some(0));
        let (_dir, app) = app_with("[]");
        assert_eq!(app.cursor(), None);
    }

    #[test]
    fn test_move_cursor_is_clamped() {
        let (_dir, mut app) = app_with(TWO);
        app.move_cursor(5);
        assert_eq!(app.cursor(), Some(1));
        app.move_cursor(-5);
        assert_eq!(app.cursor(), Some(0));
    }

    #[test]
    fn test_delete_last_entry_moves_cursor_up() {
        let (_dir, mut app) = app_with(TWO);
        app.move_cursor(1);
        app.open_delete();
        assert!(matches!(app.modal, Modal::ConfirmDelete(1)));
        app.confirm_delete();
        assert_eq!(app.store.len(), 1);
        assert_eq!(app.cursor(), Some(0));
    }

    #[test]
    fn test_invalid_form_stays_open() {
        let (_dir, mut app) = app_with("[]");
        app.open_add();
        app.submit_form();
        assert!(matches!(app.modal, Modal::Form(_)));
        assert_eq!(app.status.as_ref().unwrap().kind, StatusKind::Error);
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_dismissed_password_does_not_run() {
        let (_dir, mut app) = app_with(r#"[{"name": "up", "command": "sudo apt update"}]"#);
        app.run_selected();
        assert!(matches!(app.modal, Modal::Password { .. }));
        app.submit_password(None);
        assert!(matches!(app.modal, Modal::None));
        assert!(!app.runner.is_running());
        assert!(app.running_name.is_none());
        assert_eq!(
            app.status.as_ref().unwrap().text,
            "Sudo password entry cancelled"
        );
    }

    #[test]
    fn test_finished_event_writes_footer() {
        let (_dir, mut app) = app_with("[]");
        app.handle_run_event(RunEvent::Started {
            command: "make".into(),
        });
        app.handle_run_event(RunEvent::Output("ok\n".into()));
        app.handle_run_event(RunEvent::Finished { exit_code: Some(2) });
        assert_eq!(
            app.output.text(),
            "$ make\nok\n[Command Finished: exit code 2]"
        );
        assert_eq!(app.last_exit, Some(Some(2)));
    }
}
