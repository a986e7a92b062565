//! Terminal color utilities for CLI output.
//!
//! Semantic helpers so every report line is colored the same way.

use std::io::IsTerminal;

use console::style;

use crate::types::{ColorMode, PageClassification};

/// Determines if colors should be used based on ColorMode and terminal detection.
pub fn is_enabled(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

/// Colorizer that can be passed around to format functions.
#[derive(Clone, Copy, Debug)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: is_enabled(mode),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn paint(
        &self,
        s: &str,
        f: impl FnOnce(console::StyledObject<&str>) -> console::StyledObject<&str>,
    ) -> String {
        if !self.enabled {
            return s.to_string();
        }
        f(style(s).force_styling(true)).to_string()
    }

    // === Semantic colors ===

    /// Error, failed page - RED
    pub fn error(&self, s: &str) -> String {
        self.paint(s, |st| st.red())
    }

    /// Warning, skipped page - YELLOW
    pub fn warn(&self, s: &str) -> String {
        self.paint(s, |st| st.yellow())
    }

    /// Success, bytes saved - GREEN
    pub fn ok(&self, s: &str) -> String {
        self.paint(s, |st| st.green())
    }

    /// File paths - CYAN
    pub fn path(&self, s: &str) -> String {
        self.paint(s, |st| st.cyan())
    }

    /// Headers, titles - BOLD
    pub fn header(&self, s: &str) -> String {
        self.paint(s, |st| st.bold())
    }

    /// Secondary info, hints - DIM
    pub fn dim(&self, s: &str) -> String {
        self.paint(s, |st| st.dim())
    }

    /// Numbers, counts - BRIGHT CYAN
    pub fn number(&self, n: impl std::fmt::Display) -> String {
        let text = n.to_string();
        self.paint(&text, |st| st.cyan().bright())
    }

    /// Classification label, colored by how much script survives.
    pub fn classification(&self, class: PageClassification) -> String {
        let label = class.as_str();
        match class {
            PageClassification::PureStatic => self.ok(label),
            PageClassification::RoutingOnly => self.paint(label, |st| st.blue()),
            PageClassification::Interactive => self.paint(label, |st| st.magenta()),
        }
    }

    // === Status indicators ===

    /// [OK] prefix
    pub fn status_ok(&self, msg: &str) -> String {
        format!("{} {}", self.ok("[OK]"), msg)
    }

    /// [WARN] prefix
    pub fn status_warn(&self, msg: &str) -> String {
        format!("{} {}", self.warn("[WARN]"), msg)
    }

    /// [FAIL] prefix
    pub fn status_fail(&self, msg: &str) -> String {
        format!("{} {}", self.error("[FAIL]"), msg)
    }
}
