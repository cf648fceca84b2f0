//! Terminal color detection and report styling.

use std::env::var_os;
use std::string::{String, ToString};

use owo_colors::{OwoColorize, Style};
use supports_color::Stream;

/// Determine if the report written to `stream` should be colored.
///
/// This respects the [`NO_COLOR`](https://no-color.org) and `FORCE_COLOR` environment variables.
pub fn should_use_color(stream: Stream) -> bool {
    // Snapshot runs compare plain text.
    var_os("INSTA_UPDATE").is_none()
        && var_os("INSTA_WORKSPACE").is_none()
        && var_os("INSTA_SNAPSHOT_UPDATE").is_none()
        && supports_color::on(stream).is_some()
}

/// Applies styles only when color is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Painter {
    enabled: bool,
}

impl Painter {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub(crate) fn paint(&self, text: &str, style: Style) -> String {
        if self.enabled {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    pub(crate) fn header(&self, text: &str) -> String {
        self.paint(text, Style::new().bold())
    }

    pub(crate) fn error(&self, text: &str) -> String {
        self.paint(text, Style::new().red().bold())
    }

    pub(crate) fn env(&self, text: &str) -> String {
        self.paint(text, Style::new().yellow())
    }

    pub(crate) fn flag(&self, text: &str) -> String {
        self.paint(text, Style::new().cyan())
    }

    pub(crate) fn value(&self, text: &str) -> String {
        self.paint(text, Style::new().green())
    }

    pub(crate) fn dim(&self, text: &str) -> String {
        self.paint(text, Style::new().bright_black())
    }

    pub(crate) fn path(&self, text: &str) -> String {
        self.paint(text, Style::new().magenta())
    }
}
