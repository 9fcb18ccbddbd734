use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Widget;

use crate::theme;

/// Map a vt100 color to a ratatui color, using `default` for the terminal default
fn map_color(color: vt100::Color, default: Color) -> Color {
    match color {
        vt100::Color::Default => default,
        vt100::Color::Idx(i) => Color::Indexed(i),
        vt100::Color::Rgb(r, g, b) => Color::Rgb(r, g, b),
    }
}

/// Widget that draws the run output screen into a ratatui buffer
pub struct OutputView<'a> {
    screen: &'a vt100::Screen,
    show_cursor: bool,
}

impl<'a> OutputView<'a> {
    #[must_use]
    pub fn new(screen: &'a vt100::Screen) -> Self {
        Self {
            screen,
            show_cursor: false,
        }
    }

    /// Mark where the next output will appear
    #[must_use]
    pub fn show_cursor(mut self, show: bool) -> Self {
        self.show_cursor = show;
        self
    }
}

impl Widget for OutputView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (screen_rows, screen_cols) = self.screen.size();
        let rows = area.height.min(screen_rows);
        let cols = area.width.min(screen_cols);

        for row in 0..rows {
            for col in 0..cols {
                let Some(cell) = self.screen.cell(row, col) else {
                    continue;
                };
                let Some(buf_cell) = buf.cell_mut((area.x + col, area.y + row)) else {
                    continue;
                };

                // Wide chars occupy the first cell; the continuation cell is empty
                buf_cell.set_char(cell.contents().chars().next().unwrap_or(' '));

                let mut modifier = Modifier::empty();
                if cell.bold() {
                    modifier |= Modifier::BOLD;
                }
                if cell.italic() {
                    modifier |= Modifier::ITALIC;
                }
                if cell.underline() {
                    modifier |= Modifier::UNDERLINED;
                }
                if cell.inverse() {
                    modifier |= Modifier::REVERSED;
                }

                buf_cell.set_style(
                    Style::default()
                        .fg(map_color(cell.fgcolor(), theme::OUTPUT))
                        .bg(map_color(cell.bgcolor(), Color::Reset))
                        .add_modifier(modifier),
                );
            }
        }

        if self.show_cursor && !self.screen.hide_cursor() {
            let (cursor_row, cursor_col) = self.screen.cursor_position();
            let cx = area.x + cursor_col;
            let cy = area.y + cursor_row;
            if cx < area.right()
                && cy < area.bottom()
                && let Some(cell) = buf.cell_mut((cx, cy))
            {
                cell.set_style(Style::default().fg(Color::Black).bg(theme::OUTPUT));
            }
        }
    }
}
