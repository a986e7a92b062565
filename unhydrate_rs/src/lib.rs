//! # unhydrate
//!
//! **Static-page hydration stripper** for Next.js-style build output.
//!
//! Component frameworks ship their runtime to every page, including pages
//! that render once and never change. unhydrate decides, per generated HTML
//! document, how much client-side script the page actually needs and rewrites
//! the document to match.
//!
//! ## Classifications
//!
//! - **`PURE_STATIC`** - no hydration, no client navigation: every framework
//!   runtime script and script preload is removed
//! - **`ROUTING_ONLY`** - static content using `next/link`: runtime removed,
//!   a small navigation helper injected
//! - **`INTERACTIVE`** - event handlers, stateful hooks or a `"use client"`
//!   module anywhere in the local import closure: left untouched
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,no_run
//! use unhydrate::analyzer::{Pipeline, SourceResolver};
//! use unhydrate::transform::Transformer;
//! use unhydrate::types::PageInput;
//! use std::path::PathBuf;
//!
//! let pipeline = Pipeline::new(SourceResolver::new("."), Transformer::default());
//! let batch = pipeline.run(&[PageInput::new(
//!     "out/about.html",
//!     Some(PathBuf::from("app/about/page.tsx")),
//! )]);
//! for page in &batch.processed {
//!     println!("{} {}", page.classification(), page.analysis.html_path.display());
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! unhydrate                      # detect build in ., write ./out-unhydrated
//! unhydrate site --dry-run -v    # classify only, with per-page indicators
//! unhydrate --json > report.json # machine-readable report
//! ```
//!
//! Classification is textual and conservative: a module that merely looks
//! interactive makes the page interactive. Component sources are never
//! modified, only generated HTML.

// ============================================================================
// Core Modules
// ============================================================================

/// Classification engine.
///
/// # Submodules
///
/// - [`analyzer::patterns`] - Marker tables and compiled regexes
/// - [`analyzer::resolvers`] - Local import resolution (relative, `@/`, tsconfig paths)
/// - [`analyzer::crawler`] - Dependency closure crawl
/// - [`analyzer::indicators`] - Indicator detection for one source/HTML pair
/// - [`analyzer::classify`] - Indicator set → classification
/// - [`analyzer::runner`] - Per-page pipeline and bounded parallel batch
pub mod analyzer;

/// HTML rewriting driven by a page's classification.
pub mod transform;

/// Run statistics folded from processed pages.
pub mod stats;

/// Build layout detection and route → entry module matching.
///
/// # Example
///
/// ```rust,no_run
/// use unhydrate::config::UnhydrateConfig;
/// use unhydrate::detect;
/// use std::path::Path;
///
/// let build = detect::detect_build(Path::new("."), None, &UnhydrateConfig::default()).unwrap();
/// println!("{} pages in {}", build.pages.len(), build.build_dir.display());
/// ```
pub mod detect;

/// Copies the build tree and writes rewritten documents.
pub mod output;

/// `.unhydrate/config.toml` and per-run options.
pub mod config;

/// Per-page error taxonomy.
pub mod error;

/// Common types used throughout the crate.
pub mod types;

// ============================================================================
// CLI Support
// ============================================================================

pub mod cli;
pub mod colors;
pub mod progress;
pub mod report;

// ============================================================================
// Re-exports for convenience
// ============================================================================

/// Color mode (Auto, Always, Never).
pub use types::ColorMode;

/// PURE_STATIC, ROUTING_ONLY or INTERACTIVE.
pub use types::PageClassification;

pub use types::{IndicatorSet, PageAnalysis, PageFailure, PageInput, ProcessedPage};

pub use analyzer::{BatchReport, Pipeline};
pub use error::PageError;
pub use stats::RunStats;
pub use transform::Transformer;
