use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::PageError;
use crate::stats::{RunStats, aggregate};
use crate::transform::Transformer;
use crate::types::{PageAnalysis, PageFailure, PageInput, ProcessedPage};

use super::classify::classify;
use super::crawler::DependencyCrawler;
use super::indicators::detect;
use super::resolvers::SourceResolver;

/// Maximum number of pages processed in parallel (bounded parallelism).
pub const MAX_PARALLEL_PAGES: usize = 8;

/// Outcome of one page.
#[derive(Debug)]
pub enum PageOutcome {
    Processed(Box<ProcessedPage>),
    Skipped(PathBuf),
    Failed(PageFailure),
}

/// Everything a batch produced, in input page order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<ProcessedPage>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<PageFailure>,
    pub stats: RunStats,
}

/// Analysis + transformation for a set of pages sharing one project.
pub struct Pipeline {
    resolver: SourceResolver,
    transformer: Transformer,
    max_parallel: usize,
}

impl Pipeline {
    pub fn new(resolver: SourceResolver, transformer: Transformer) -> Self {
        let max_parallel = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(1, MAX_PARALLEL_PAGES);
        Self {
            resolver,
            transformer,
            max_parallel,
        }
    }

    pub fn with_parallelism(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Crawl, detect and classify one page whose HTML is already loaded.
    pub fn analyze_page(&self, input: &PageInput, html: &str) -> Result<PageAnalysis, PageError> {
        let (entry_path, entry_content) = read_entry(input)?;
        Ok(self.analyze_entry(input, entry_path, &entry_content, html))
    }

    fn analyze_entry(
        &self,
        input: &PageInput,
        entry_path: &Path,
        entry_content: &str,
        html: &str,
    ) -> PageAnalysis {
        let closure = DependencyCrawler::new(&self.resolver).closure(entry_path, entry_content);
        let mut indicators = detect(entry_content, html);
        indicators.has_client_components = closure.interactive;
        let classification = classify(&indicators);

        debug!(
            page = %input.html_path.display(),
            %classification,
            modules = closure.modules_inspected,
            "classified"
        );

        PageAnalysis {
            html_path: input.html_path.clone(),
            entry_path: entry_path.to_path_buf(),
            classification,
            indicators,
            original_size: html.len(),
            modules_inspected: closure.modules_inspected,
            interactive_via: closure.triggered_by,
            unresolved_imports: closure.unresolved,
        }
    }

    /// Read, analyze and rewrite one page. A page without a readable entry
    /// is skipped before its document is touched.
    pub fn process_page(&self, input: &PageInput) -> Result<ProcessedPage, PageError> {
        let (entry_path, entry_content) = read_entry(input)?;
        let html = fs::read_to_string(&input.html_path).map_err(|source| PageError::ReadHtml {
            path: input.html_path.clone(),
            source,
        })?;
        let analysis = self.analyze_entry(input, entry_path, &entry_content, &html);

        let transformed = self
            .transformer
            .transform(&html, analysis.classification)
            .map_err(|err| PageError::MalformedHtml {
                path: input.html_path.clone(),
                reason: err.to_string(),
            })?;

        Ok(ProcessedPage {
            new_size: transformed.html.len(),
            scripts_removed: transformed.scripts_removed,
            preloads_removed: transformed.preloads_removed,
            helper_injected: transformed.helper_injected,
            html: transformed.html,
            analysis,
        })
    }

    fn outcome(&self, input: &PageInput) -> PageOutcome {
        match self.process_page(input) {
            Ok(page) => PageOutcome::Processed(Box::new(page)),
            Err(err) if err.is_skip() => PageOutcome::Skipped(input.html_path.clone()),
            Err(err) => {
                warn!(page = %input.html_path.display(), error = %err, "page failed");
                PageOutcome::Failed(PageFailure {
                    html_path: input.html_path.clone(),
                    error: err.to_string(),
                })
            }
        }
    }

    /// Process every page. Completion order is irrelevant: outcomes are
    /// folded in input order so reports are reproducible.
    pub fn run(&self, pages: &[PageInput]) -> BatchReport {
        let started = Instant::now();

        let outcomes: Vec<PageOutcome> = if pages.len() <= 1 || self.max_parallel == 1 {
            pages.iter().map(|p| self.outcome(p)).collect()
        } else {
            let mut outcomes = Vec::with_capacity(pages.len());
            thread::scope(|s| {
                for chunk in pages.chunks(self.max_parallel) {
                    let handles: Vec<_> = chunk
                        .iter()
                        .map(|page| s.spawn(|| self.outcome(page)))
                        .collect();

                    for (handle, page) in handles.into_iter().zip(chunk.iter()) {
                        let outcome = handle.join().unwrap_or_else(|_| {
                            PageOutcome::Failed(PageFailure {
                                html_path: page.html_path.clone(),
                                error: "thread panic".to_string(),
                            })
                        });
                        outcomes.push(outcome);
                    }
                }
            });
            outcomes
        };

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                PageOutcome::Processed(page) => report.processed.push(*page),
                PageOutcome::Skipped(path) => report.skipped.push(path),
                PageOutcome::Failed(failure) => report.failures.push(failure),
            }
        }

        report.stats = aggregate(&report.processed, started);
        report.stats.skipped_pages = report.skipped.len();
        report.stats.failed_pages = report.failures.len();
        report
    }
}

fn read_entry(input: &PageInput) -> Result<(&Path, String), PageError> {
    let entry_path = input
        .entry_path
        .as_deref()
        .ok_or_else(|| PageError::MissingEntry(input.html_path.clone()))?;
    let content = fs::read_to_string(entry_path).map_err(|err| {
        debug!(entry = %entry_path.display(), error = %err, "entry source unreadable");
        PageError::MissingEntry(input.html_path.clone())
    })?;
    Ok((entry_path, content))
}
