//! Classification-driven rewriting of generated HTML documents.
//!
//! - `Interactive`: returned byte-for-byte.
//! - `PureStatic`: framework runtime scripts and script preloads removed.
//! - `RoutingOnly`: same stripping, plus the navigation helper appended to `<body>`.

pub mod document;

use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;

use crate::analyzer::patterns::{
    PRELOAD_RELS, RuntimeMarkers, is_executable_type, is_structured_data_type,
    script_type_essence,
};
use crate::types::PageClassification;

pub use document::{Document, DocumentError, Element};

const DEFAULT_NAV_HELPER: &str = include_str!("nav_helper.js");

/// Attribute marking the injected helper so it can be recognized later.
pub const NAV_HELPER_ATTR: &str = "data-unhydrate-nav";

/// Client-side navigation script injected into `RoutingOnly` pages.
#[derive(Debug, Clone)]
pub struct NavigationHelper {
    source: String,
}

impl Default for NavigationHelper {
    fn default() -> Self {
        Self {
            source: DEFAULT_NAV_HELPER.to_string(),
        }
    }
}

impl NavigationHelper {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn from_file(path: &Path) -> io::Result<Self> {
        fs::read_to_string(path).map(Self::from_source)
    }

    /// Complete inline `<script>` element. `</` and `<!--` are escaped so the
    /// payload cannot terminate the element early.
    pub fn to_inline_script(&self) -> String {
        let escaped = self.source.replace("</", "<\\/").replace("<!--", "<\\!--");
        format!("<script {NAV_HELPER_ATTR}>{}</script>", escaped.trim_end())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub html: String,
    pub scripts_removed: usize,
    pub preloads_removed: usize,
    pub helper_injected: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Transformer {
    markers: RuntimeMarkers,
    helper: NavigationHelper,
}

impl Transformer {
    pub fn new(markers: RuntimeMarkers, helper: NavigationHelper) -> Self {
        Self { markers, helper }
    }

    pub fn transform(
        &self,
        html: &str,
        classification: PageClassification,
    ) -> Result<Transformed, DocumentError> {
        if classification.is_interactive() {
            return Ok(Transformed {
                html: html.to_string(),
                scripts_removed: 0,
                preloads_removed: 0,
                helper_injected: false,
            });
        }

        let doc = Document::parse(html)?;
        let mut removals: Vec<Range<usize>> = Vec::new();
        let mut scripts_removed = 0;
        let mut preloads_removed = 0;

        for script in doc.scripts() {
            // a helper left by an earlier run; RoutingOnly gets a fresh one below
            if is_nav_helper(script) {
                removals.push(script.span.clone());
            } else if self.is_runtime_script(script) {
                removals.push(script.span.clone());
                scripts_removed += 1;
            }
        }
        for link in doc.links() {
            if self.is_runtime_preload(link) {
                removals.push(link.span.clone());
                preloads_removed += 1;
            }
        }
        removals.sort_by_key(|r| r.start);

        let mut out = String::with_capacity(html.len());
        let mut cursor = 0;
        for span in &removals {
            out.push_str(&html[cursor..span.start]);
            cursor = span.end;
        }
        out.push_str(&html[cursor..]);

        let helper_injected = classification == PageClassification::RoutingOnly;
        if helper_injected {
            // the close tag is never inside a removed element
            let at = doc.body_close.or(doc.html_close).unwrap_or(html.len());
            let removed_before: usize = removals
                .iter()
                .filter(|r| r.end <= at)
                .map(|r| r.len())
                .sum();
            out.insert_str(at - removed_before, &self.helper.to_inline_script());
        }

        Ok(Transformed {
            html: out,
            scripts_removed,
            preloads_removed,
            helper_injected,
        })
    }

    /// Runtime scripts by `src`, or by inline body for executable types.
    /// Data scripts, unknown types and the navigation helper are never
    /// runtime.
    pub fn is_runtime_script(&self, script: &Element<'_>) -> bool {
        if let Some(src) = script.attrs.get("src") {
            return self.markers.matches_url(src);
        }
        if is_nav_helper(script) {
            return false;
        }
        let essence = script_type_essence(script.attrs.get("type").unwrap_or_default());
        if is_structured_data_type(&essence) || !is_executable_type(&essence) {
            return false;
        }
        self.markers.matches_inline(script.body)
    }

    /// `preload`/`modulepreload`/`prefetch` links that fetch a runtime script.
    pub fn is_runtime_preload(&self, link: &Element<'_>) -> bool {
        let rels: Vec<String> = link
            .attrs
            .get("rel")
            .unwrap_or_default()
            .split_ascii_whitespace()
            .map(|r| r.to_ascii_lowercase())
            .collect();
        if !rels.iter().any(|r| PRELOAD_RELS.contains(&r.as_str())) {
            return false;
        }
        let Some(href) = link.attrs.get("href") else {
            return false;
        };

        let path = href.split(['?', '#']).next().unwrap_or(href);
        let targets_script = rels.iter().any(|r| r == "modulepreload")
            || link
                .attrs
                .get("as")
                .is_some_and(|a| a.eq_ignore_ascii_case("script"))
            || path.ends_with(".js")
            || path.ends_with(".mjs");

        targets_script && self.markers.matches_url(href)
    }
}

fn is_nav_helper(script: &Element<'_>) -> bool {
    script.attrs.has(NAV_HELPER_ATTR) && !script.attrs.has("src")
}
