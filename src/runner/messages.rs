//! Banners printed around a command's output in the terminal

use anstyle::{AnsiColor, Reset, RgbColor, Style};

use crate::theme;

const PRIMARY_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Rgb(RgbColor(
    theme::ACCENT_RGB.0,
    theme::ACCENT_RGB.1,
    theme::ACCENT_RGB.2,
))));
const SUCCESS_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)));
const ERROR_COLOR: Style = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)));

fn render_arrow() -> String {
    format!("{PRIMARY_COLOR}❱{Reset}")
}

#[must_use]
pub fn format_start_message(command: &str) -> String {
    format!("{} $ {}\n", render_arrow(), command)
}

#[must_use]
pub fn format_finished_message(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(0) => format!(
            "\n{} Command finished {SUCCESS_COLOR}✓{Reset}\n",
            render_arrow()
        ),
        Some(code) => format!(
            "\n{} Command finished {ERROR_COLOR}✘{Reset} (exit code {code})\n",
            render_arrow()
        ),
        None => format!(
            "\n{} Command finished {ERROR_COLOR}✘{Reset} (killed by signal)\n",
            render_arrow()
        ),
    }
}

/// Plain-text status for a finished run, for places without ANSI styling
#[must_use]
pub fn finished_label(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(0) => "[Command Finished]".to_string(),
        Some(code) => format!("[Command Finished: exit code {code}]"),
        None => "[Command Finished: killed]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_label() {
        assert_eq!(finished_label(Some(0)), "[Command Finished]");
        assert_eq!(finished_label(Some(2)), "[Command Finished: exit code 2]");
        assert_eq!(finished_label(None), "[Command Finished: killed]");
    }

    #[test]
    fn test_failure_message_mentions_code() {
        assert!(format_finished_message(Some(7)).contains("exit code 7"));
    }
}
