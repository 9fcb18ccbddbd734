use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
    ScrollbarState,
};

use super::app::{App, Modal, PathAction, StatusKind};
use super::form::{EntryForm, FormField, TextInput};
use super::output_widget::OutputView;
use super::toolbar;
use crate::{logger, theme};

const CURSOR: &str = "█";
const MASK: char = '•';

fn render_scrollbar(frame: &mut Frame, area: Rect, total: usize, position: usize) {
    let mut state = ScrollbarState::new(total).position(position);
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_style(Style::default().fg(theme::ACCENT)),
        area,
        &mut state,
    );
}

fn panel(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { theme::ACCENT } else { theme::DIM };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
}

/// A rectangle of `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Lines of a text input with a block cursor drawn when `focused`
fn input_lines(input: &TextInput, focused: bool, mask: bool) -> Vec<Line<'static>> {
    let (before, after) = input.split_at_cursor();
    let hide = |s: &str| -> String {
        if mask {
            s.chars().map(|_| MASK).collect()
        } else {
            s.to_string()
        }
    };
    let cursor_style = Style::default().fg(theme::ACCENT);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let push_text = |text: &str,
                     lines: &mut Vec<Line<'static>>,
                     current: &mut Vec<Span<'static>>| {
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            current.push(Span::raw(hide(first)));
        }
        for part in parts {
            lines.push(Line::from(std::mem::take(current)));
            current.push(Span::raw(hide(part)));
        }
    };

    push_text(before, &mut lines, &mut current);
    if focused {
        current.push(Span::styled(CURSOR, cursor_style));
    }
    push_text(after, &mut lines, &mut current);
    lines.push(Line::from(current));
    lines
}

impl App {
    /// Render the app
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Outer vertical split: main area + status line + toolbar
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(size);

        frame.render_widget(
            Paragraph::new(toolbar::build_toolbar_line(self, outer[2].width)),
            outer[2],
        );
        self.render_status(frame, outer[1]);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Min(20)])
            .split(outer[0]);

        self.render_list(frame, chunks[0]);
        if self.show_logs {
            self.render_log_panel(frame, chunks[1]);
        } else {
            self.render_output(frame, chunks[1]);
        }

        self.render_modal(frame, size);
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect) {
        let running = self.runner.is_running();
        let items: Vec<ListItem> = self
            .store
            .entries()
            .iter()
            .map(|entry| {
                let mut spans = vec![Span::styled(
                    entry.name.clone(),
                    Style::default().fg(Color::White),
                )];
                if entry.is_multiline() {
                    spans.push(Span::styled(" ⏎", Style::default().fg(theme::DIM)));
                }
                if running && self.running_name.as_deref() == Some(entry.name.as_str()) {
                    spans.push(Span::styled(" ●", Style::default().fg(theme::RUNNING)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let title = format!(" Commands ({}) ", self.store.len());
        let list = List::new(items)
            .block(panel(&title, matches!(self.modal, Modal::None)))
            .highlight_style(
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            )
            .highlight_symbol("❱ ");

        if self.store.is_empty() {
            let empty = Paragraph::new("No commands yet. Press 'a' to add one.")
                .style(Style::default().fg(theme::DIM))
                .block(panel(&title, true));
            frame.render_widget(empty, area);
            return;
        }
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_output(&mut self, frame: &mut Frame, area: Rect) {
        let title = match (self.runner.running_pid(), self.last_exit) {
            (Some(pid), _) => format!(" Output (running, pid {pid}) "),
            (None, Some(Some(0))) => " Output (done) ".to_string(),
            (None, Some(Some(code))) => format!(" Output (exit {code}) "),
            (None, Some(None)) => " Output (killed) ".to_string(),
            (None, None) => " Output ".to_string(),
        };
        let block = panel(&title, false);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.output_height = inner.height as usize;
        self.output.resize(inner.height, inner.width);

        if self.output.is_empty() {
            let placeholder = Paragraph::new("No output yet. Press 'r' to run a command.")
                .style(Style::default().fg(theme::DIM));
            frame.render_widget(placeholder, inner);
            return;
        }

        let following = self.output.scroll_position() == 0;
        frame.render_widget(
            OutputView::new(self.output.screen()).show_cursor(following && self.runner.is_running()),
            inner,
        );

        let scrollback_len = self.output.scrollback_len();
        if scrollback_len > 0 {
            let scrollback_pos = self.output.scroll_position();
            render_scrollbar(frame, inner, scrollback_len, scrollback_len - scrollback_pos);
        }
    }

    fn render_log_panel(&self, frame: &mut Frame, area: Rect) {
        let count = self.log_buffer.len();
        let block = panel(" Logs ", false).title(Span::styled(
            format!("({count}) "),
            Style::default().fg(theme::DIM),
        ));
        let content_area = block.inner(area);
        frame.render_widget(block, area);

        if self.log_buffer.is_empty() {
            let empty =
                Paragraph::new("No log messages yet.").style(Style::default().fg(theme::DIM));
            frame.render_widget(empty, content_area);
            return;
        }

        let visible_height = content_area.height as usize;
        let max_scroll = count.saturating_sub(visible_height);
        let scroll = self.log_scroll.min(max_scroll);

        let log_start = self.log_buffer.start();
        let lines: Vec<Line> = self
            .log_buffer
            .window(visible_height, scroll)
            .into_iter()
            .map(|entry| {
                let elapsed = entry.timestamp.duration_since(log_start).as_secs_f64();
                Line::from(vec![
                    Span::styled(format!("{elapsed:>6.1}s "), Style::default().fg(theme::DIM)),
                    Span::styled(
                        format!("{:5}", entry.level),
                        Style::default().fg(logger::level_color(entry.level)),
                    ),
                    Span::raw(" "),
                    Span::styled(
                        format!("{}: ", entry.target),
                        Style::default().fg(theme::DIM),
                    ),
                    Span::raw(entry.message),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), content_area);

        if count > visible_height {
            render_scrollbar(frame, content_area, max_scroll, max_scroll - scroll);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let line = match self.status {
            Some(ref status) => {
                let color = match status.kind {
                    StatusKind::Info => theme::SUCCESS,
                    StatusKind::Error => theme::FAILURE,
                };
                Line::from(Span::styled(
                    format!(" {}", status.text),
                    Style::default().fg(color),
                ))
            }
            None => Line::from(Span::styled(
                format!(" {}", self.store.path().display()),
                Style::default().fg(theme::DIM),
            )),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_modal(&self, frame: &mut Frame, size: Rect) {
        match self.modal {
            Modal::None => {}
            Modal::Form(ref form) => render_form(frame, size, form),
            Modal::Password { ref input, .. } => {
                let area = centered(size, 50, 3);
                frame.render_widget(Clear, area);
                frame.render_widget(
                    Paragraph::new(input_lines(input, true, true))
                        .block(panel(" Enter sudo password ", true)),
                    area,
                );
            }
            Modal::ConfirmDelete(index) => {
                let name = self.store.get(index).map_or("", |e| e.name.as_str());
                let area = centered(size, 60, 5);
                frame.render_widget(Clear, area);
                let lines = vec![
                    Line::from(format!("Are you sure you want to delete '{name}'?")),
                    Line::from(""),
                    Line::from(Span::styled("[y]es / [n]o", Style::default().fg(theme::DIM))),
                ];
                frame.render_widget(
                    Paragraph::new(lines).block(panel(" Confirm delete ", true)),
                    area,
                );
            }
            Modal::Path {
                action,
                ref input,
            } => {
                let title = match action {
                    PathAction::Export => " Export commands to ",
                    PathAction::Import => " Import commands from ",
                };
                let area = centered(size, 70, 3);
                frame.render_widget(Clear, area);
                frame.render_widget(
                    Paragraph::new(input_lines(input, true, false)).block(panel(title, true)),
                    area,
                );
            }
        }
    }
}

fn render_form(frame: &mut Frame, size: Rect, form: &EntryForm) {
    let area = centered(size, 80, 16);
    frame.render_widget(Clear, area);
    let block = panel(form.title(), true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(inner);

    let name_focused = form.focus == FormField::Name;
    frame.render_widget(
        Paragraph::new(input_lines(&form.name, name_focused, false))
            .block(panel(" Name (optional) ", name_focused)),
        rows[0],
    );

    let command_area = rows[1];
    let command_lines = input_lines(&form.command, !name_focused, false);
    // Keep the cursor line in view for long commands
    let visible = command_area.height.saturating_sub(2) as usize;
    let cursor_line = form.command.split_at_cursor().0.matches('\n').count();
    let skip = (cursor_line + 1).saturating_sub(visible);
    frame.render_widget(
        Paragraph::new(command_lines.into_iter().skip(skip).collect::<Vec<_>>())
            .block(panel(" Command ", !name_focused)),
        command_area,
    );
}
