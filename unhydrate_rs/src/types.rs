use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, clap::ValueEnum)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// How much client-side script a page needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageClassification {
    /// No hydration and no client navigation: every runtime script can go.
    PureStatic,
    /// Static content with client-side links: runtime goes, a small
    /// navigation helper is injected instead.
    RoutingOnly,
    /// Needs the framework runtime; left untouched.
    Interactive,
}

impl PageClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageClassification::PureStatic => "PURE_STATIC",
            PageClassification::RoutingOnly => "ROUTING_ONLY",
            PageClassification::Interactive => "INTERACTIVE",
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, PageClassification::Interactive)
    }
}

impl fmt::Display for PageClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signals collected for one page.
///
/// The four source flags describe the entry module itself.
/// `has_client_components` is the closure-wide aggregate produced by the
/// dependency crawl. Script and preload counts are taken from the page's
/// HTML and are informational only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub has_event_handlers: bool,
    pub uses_stateful_hooks: bool,
    pub is_client_module: bool,
    pub has_navigation_links: bool,
    pub has_client_components: bool,
    pub script_count: usize,
    pub preload_count: usize,
}

impl IndicatorSet {
    /// True when any hydration-requiring signal is present in this module.
    pub fn has_interactivity(&self) -> bool {
        self.has_event_handlers || self.uses_stateful_hooks || self.is_client_module
    }
}

/// One generated document paired with the module that rendered it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageInput {
    pub html_path: PathBuf,
    /// `None` when build detection found no source module for the route.
    pub entry_path: Option<PathBuf>,
}

impl PageInput {
    pub fn new(html_path: impl Into<PathBuf>, entry_path: Option<PathBuf>) -> Self {
        Self {
            html_path: html_path.into(),
            entry_path,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PageAnalysis {
    pub html_path: PathBuf,
    pub entry_path: PathBuf,
    pub classification: PageClassification,
    pub indicators: IndicatorSet,
    pub original_size: usize,
    /// Number of source modules read during the crawl (entry included).
    pub modules_inspected: usize,
    /// Module whose indicators made the page interactive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive_via: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_imports: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProcessedPage {
    #[serde(flatten)]
    pub analysis: PageAnalysis,
    pub new_size: usize,
    pub scripts_removed: usize,
    pub preloads_removed: usize,
    pub helper_injected: bool,
    /// Rewritten document, written back by the output stage.
    #[serde(skip)]
    pub html: String,
}

impl ProcessedPage {
    pub fn classification(&self) -> PageClassification {
        self.analysis.classification
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PageFailure {
    pub html_path: PathBuf,
    pub error: String,
}
