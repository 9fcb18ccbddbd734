use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use super::app::{App, Modal};
use crate::theme;

struct Shortcut {
    key: &'static str,
    desc: &'static str,
    enabled: bool,
}

impl Shortcut {
    fn new(key: &'static str, desc: &'static str) -> Self {
        Self {
            key,
            desc,
            enabled: true,
        }
    }

    fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Width this shortcut occupies: " key " (padded badge) + space + desc
    fn width(&self) -> usize {
        1 + self.key.len() + 1 + 1 + self.desc.len()
    }
}

fn get_shortcuts(app: &App) -> Vec<Shortcut> {
    match app.modal {
        Modal::Form(_) => vec![
            Shortcut::new("TAB", "Next field"),
            Shortcut::new("^S", "Save"),
            Shortcut::new("ESC", "Cancel"),
        ],
        Modal::Password { .. } | Modal::Path { .. } => vec![
            Shortcut::new("ENTER", "OK"),
            Shortcut::new("ESC", "Cancel"),
        ],
        Modal::ConfirmDelete(_) => vec![Shortcut::new("Y", "Delete"), Shortcut::new("N", "Keep")],
        Modal::None => {
            let running = app.runner.is_running();
            let has_selection = app.cursor().is_some();
            let log_label = if app.show_logs { "Hide logs" } else { "Logs" };
            vec![
                Shortcut::new("R", "Run").enabled(has_selection && !running),
                Shortcut::new("S", "Stop").enabled(running),
                Shortcut::new("A", "Add"),
                Shortcut::new("E", "Edit").enabled(has_selection),
                Shortcut::new("D", "Delete").enabled(has_selection),
                Shortcut::new("C", "Clear"),
                Shortcut::new("X", "Export"),
                Shortcut::new("I", "Import"),
                Shortcut::new("U", "Forget sudo").enabled(app.runner.has_credential()),
                Shortcut::new("L", log_label),
                Shortcut::new("Q", "Quit"),
            ]
        }
    }
}

/// Separator between shortcuts
const SEP: &str = "  ";

pub fn build_toolbar_line(app: &App, width: u16) -> Line<'static> {
    let max_width = width as usize;

    let key_style = Style::default()
        .fg(theme::TOOLBAR_KEY_FG)
        .bg(theme::TOOLBAR_KEY_BG)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default()
        .fg(theme::TOOLBAR_DESC)
        .bg(theme::TOOLBAR_BG);
    let disabled_style = Style::default()
        .fg(theme::TOOLBAR_DISABLED)
        .bg(theme::TOOLBAR_BG);
    let bg_style = Style::default().bg(theme::TOOLBAR_BG);

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut x = 0usize;

    for (i, shortcut) in get_shortcuts(app).iter().enumerate() {
        let sep_width = if i > 0 { SEP.len() } else { 0 };
        if x + sep_width + shortcut.width() > max_width {
            break;
        }
        if i > 0 {
            spans.push(Span::styled(SEP, bg_style));
        }

        // Key rendered as a badge: " KEY " on dark background
        spans.push(Span::styled(format!(" {} ", shortcut.key), key_style));
        spans.push(Span::styled(" ", bg_style));
        spans.push(Span::styled(
            shortcut.desc,
            if shortcut.enabled {
                desc_style
            } else {
                disabled_style
            },
        ));
        x += sep_width + shortcut.width();
    }

    // Fill remaining width with background
    if x < max_width {
        spans.push(Span::styled(" ".repeat(max_width - x), bg_style));
    }

    Line::from(spans)
}
