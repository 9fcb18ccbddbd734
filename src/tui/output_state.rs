use anstyle::{AnsiColor, Effects, Reset, RgbColor, Style};

use crate::theme;

const DEFAULT_SCROLLBACK_SIZE: usize = 3500;
const DEFAULT_ROWS: u16 = 24;
const DEFAULT_COLS: u16 = 80;

const BANNER_STYLE: Style = Style::new()
    .fg_color(Some(anstyle::Color::Rgb(RgbColor(
        theme::ACCENT_RGB.0,
        theme::ACCENT_RGB.1,
        theme::ACCENT_RGB.2,
    ))))
    .effects(Effects::BOLD);
const FOOTER_STYLE: Style =
    Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::BrightBlack)));

/// Everything the runner printed, kept in a `vt100` terminal emulator.
///
/// Chunks are fed to the parser as they arrive, so escape sequences, colors
/// and carriage-return progress lines render as they would in a terminal.
/// Runs are separated by a `$ command` banner and a status footer.
pub struct OutputBuffer {
    parser: vt100::Parser,
    written: bool,
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: vt100::Parser::new(DEFAULT_ROWS, DEFAULT_COLS, DEFAULT_SCROLLBACK_SIZE),
            written: false,
        }
    }

    /// Match the emulator to the panel it is drawn in
    pub fn resize(&mut self, rows: u16, cols: u16) {
        let size = (rows.max(1), cols.max(1));
        if self.parser.screen().size() != size {
            self.parser.screen_mut().set_size(size.0, size.1);
        }
    }

    /// Append raw process output.
    ///
    /// Pipes end lines with a bare `\n`, which a terminal treats as a line
    /// feed only; the carriage return is added here.
    pub fn push_output(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.written = true;
        self.parser.process(text.replace('\n', "\r\n").as_bytes());
    }

    /// Start a run: write a `$ command` header on a fresh line.
    pub fn push_banner(&mut self, command: &str) {
        self.start_line();
        let banner: String = command
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let prefix = if i == 0 { "$ " } else { "  " };
                format!("{BANNER_STYLE}{prefix}{line}{Reset}\r\n")
            })
            .collect();
        self.parser.process(banner.as_bytes());
        self.written = true;
    }

    /// Finish a run: write `label` on its own line.
    pub fn push_footer(&mut self, label: &str) {
        self.start_line();
        self.parser
            .process(format!("{FOOTER_STYLE}{label}{Reset}\r\n").as_bytes());
        self.written = true;
    }

    pub fn clear(&mut self) {
        let (rows, cols) = self.parser.screen().size();
        self.parser = vt100::Parser::new(rows, cols, DEFAULT_SCROLLBACK_SIZE);
        self.written = false;
    }

    #[must_use]
    pub fn screen(&self) -> &vt100::Screen {
        self.parser.screen()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.written
    }

    /// Scroll by `delta` rows; positive values move back into the scrollback
    pub fn scroll_by(&mut self, delta: isize) {
        let pos = self.parser.screen().scrollback();
        let new_pos = pos.saturating_add_signed(delta);
        if pos != new_pos {
            self.parser.screen_mut().set_scrollback(new_pos);
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.parser.screen_mut().set_scrollback(0);
    }

    /// Rows scrolled up from the bottom (0 = follow output)
    #[must_use]
    pub fn scroll_position(&self) -> usize {
        self.parser.screen().scrollback()
    }

    /// Number of rows kept above the screen
    pub fn scrollback_len(&mut self) -> usize {
        let pos = self.parser.screen().scrollback();
        // set_scrollback clamps to the rows actually kept
        self.parser.screen_mut().set_scrollback(usize::MAX);
        let len = self.parser.screen().scrollback();
        self.parser.screen_mut().set_scrollback(pos);
        len
    }

    /// Plain text of the visible rows
    #[must_use]
    pub fn text(&self) -> String {
        self.parser.screen().contents()
    }

    fn start_line(&mut self) {
        if self.parser.screen().cursor_position().1 != 0 {
            self.parser.process(b"\r\n");
        }
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("size", &self.parser.screen().size())
            .field("scrollback", &self.parser.screen().scrollback())
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_are_joined_without_breaks() {
        let mut buffer = OutputBuffer::new();
        assert!(buffer.is_empty());
        buffer.push_output("hel");
        buffer.push_output("lo\nwor");
        buffer.push_output("ld\n");
        assert_eq!(buffer.text(), "hello\nworld");
        assert!(!buffer.is_empty());
    }

    #[test]
    fn test_banner_and_footer() {
        let mut buffer = OutputBuffer::new();
        buffer.push_banner("echo 1 && echo 2");
        buffer.push_output("1\n2");
        buffer.push_footer("[Command Finished]");
        assert_eq!(
            buffer.text(),
            "$ echo 1 && echo 2\n1\n2\n[Command Finished]"
        );
        let banner = buffer.screen().cell(0, 0).unwrap();
        assert!(banner.bold());
        assert_eq!(
            banner.fgcolor(),
            vt100::Color::Rgb(theme::ACCENT_RGB.0, theme::ACCENT_RGB.1, theme::ACCENT_RGB.2)
        );
    }

    #[test]
    fn test_multiline_banner_is_indented() {
        let mut buffer = OutputBuffer::new();
        buffer.push_banner("cd /tmp\nls");
        assert_eq!(buffer.text(), "$ cd /tmp\n  ls");
    }

    #[test]
    fn test_colors_are_kept_and_escapes_hidden() {
        let mut buffer = OutputBuffer::new();
        buffer.push_output("\x1b[31mred\x1b[0m \x1b]0;title\x07ok\n");
        assert_eq!(buffer.text(), "red ok");
        let cell = buffer.screen().cell(0, 0).unwrap();
        assert_eq!(cell.fgcolor(), vt100::Color::Idx(1));
        assert_eq!(buffer.screen().cell(0, 4).unwrap().fgcolor(), vt100::Color::Default);
    }

    #[test]
    fn test_carriage_return_rewinds_line() {
        let mut buffer = OutputBuffer::new();
        buffer.push_output("10%\r");
        buffer.push_output("50%\r100%\r\ndone\n");
        assert_eq!(buffer.text(), "100%\ndone");
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut buffer = OutputBuffer::new();
        buffer.resize(2, 20);
        buffer.push_output("1\n2\n3\n4\n5\n");
        assert_eq!(buffer.scrollback_len(), 4);

        buffer.scroll_by(10);
        assert_eq!(buffer.scroll_position(), 4);
        assert_eq!(buffer.text(), "1\n2");

        buffer.scroll_by(-1);
        assert_eq!(buffer.scroll_position(), 3);
        buffer.scroll_to_bottom();
        assert_eq!(buffer.scroll_position(), 0);
        assert_eq!(buffer.text(), "5");
    }

    #[test]
    fn test_clear_keeps_size() {
        let mut buffer = OutputBuffer::new();
        buffer.resize(10, 40);
        buffer.push_output("old\n");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.screen().size(), (10, 40));
    }
}
