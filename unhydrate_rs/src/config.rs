//! Configuration file support for unhydrate.
//!
//! Loads optional `.unhydrate/config.toml` from project root.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

use crate::analyzer::patterns::RuntimeMarkers;
use crate::types::ColorMode;

/// Root configuration structure
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct UnhydrateConfig {
    /// Directory holding `app/` or `pages/`, relative to the project root.
    pub source_root: Option<PathBuf>,
    /// Import prefix → directory (relative to the project root).
    /// Example: `"~/" = "src"`
    pub aliases: BTreeMap<String, String>,
    /// Extra URL substrings identifying framework runtime scripts.
    pub runtime_url_markers: Vec<String>,
    /// Extra inline-script substrings identifying framework bootstrap code.
    pub runtime_inline_markers: Vec<String>,
    /// Glob patterns (relative to the build dir) of documents to leave alone.
    pub exclude: Vec<String>,
    /// Custom navigation helper script, relative to the project root.
    pub navigation_helper: Option<PathBuf>,
}

impl UnhydrateConfig {
    /// Load config from `.unhydrate/config.toml` in the given root directory.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(".unhydrate").join("config.toml");
        Self::load_from_path(&config_path)
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn runtime_markers(&self) -> RuntimeMarkers {
        RuntimeMarkers::default()
            .with_extra(&self.runtime_url_markers, &self.runtime_inline_markers)
    }

    /// Compiled exclude globs. Invalid patterns are reported and ignored.
    pub fn exclude_set(&self) -> GlobSet {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!("Ignoring exclude pattern {:?}: {}", pattern, e),
            }
        }
        builder.build().unwrap_or_else(|e| {
            warn!("Failed to compile exclude patterns: {}", e);
            GlobSet::empty()
        })
    }
}

/// Per-run options resolved from the command line.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    pub project_root: PathBuf,
    pub build_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
    pub color: ColorMode,
    pub verbose: bool,
}

impl AnalyzerOptions {
    /// Default `tracing` filter for this run.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }

    pub fn load_config(&self) -> UnhydrateConfig {
        match &self.config_path {
            Some(path) => UnhydrateConfig::load_from_path(path),
            None => UnhydrateConfig::load(&self.project_root),
        }
    }
}
