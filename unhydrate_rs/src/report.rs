//! Run reports: colored human summary and a JSON document.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::analyzer::BatchReport;
use crate::colors::Painter;
use crate::detect::DetectedBuild;
use crate::output::WriteSummary;
use crate::progress::{format_bytes, format_count, format_duration};
use crate::stats::RunStats;
use crate::types::{IndicatorSet, PageFailure, ProcessedPage};

/// Everything one run produced.
pub struct RunReport<'a> {
    pub build: &'a DetectedBuild,
    pub batch: &'a BatchReport,
    pub out_dir: Option<&'a Path>,
    pub written: Option<WriteSummary>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    version: &'static str,
    project_root: &'a Path,
    build_dir: &'a Path,
    layout: &'static str,
    source_root: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    out_dir: Option<&'a Path>,
    dry_run: bool,
    stats: &'a RunStats,
    pages: &'a [ProcessedPage],
    skipped: &'a [PathBuf],
    excluded: &'a [PathBuf],
    failures: &'a [PageFailure],
}

impl RunReport<'_> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        let report = JsonReport {
            generated_at: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            project_root: &self.build.project_root,
            build_dir: &self.build.build_dir,
            layout: self.build.layout.description(),
            source_root: &self.build.source_root,
            out_dir: self.out_dir,
            dry_run: self.written.is_none(),
            stats: &self.batch.stats,
            pages: &self.batch.processed,
            skipped: &self.batch.skipped,
            excluded: &self.build.excluded,
            failures: &self.batch.failures,
        };
        serde_json::to_string_pretty(&report)
    }

    fn relative<'p>(&self, path: &'p Path) -> std::borrow::Cow<'p, str> {
        path.strip_prefix(&self.build.build_dir)
            .unwrap_or(path)
            .to_string_lossy()
    }

    pub fn render_human(&self, painter: &Painter, verbose: bool) -> String {
        let mut out = String::new();
        let stats = &self.batch.stats;

        let _ = writeln!(
            out,
            "{} {} ({})",
            painter.header("unhydrate"),
            painter.path(&self.build.build_dir.display().to_string()),
            painter.dim(self.build.layout.description())
        );

        for page in &self.batch.processed {
            self.render_page(&mut out, painter, verbose, page);
        }
        for path in &self.batch.skipped {
            let line = format!("{} (no entry source, skipped)", self.relative(path));
            let _ = writeln!(out, "  {}", painter.status_warn(&line));
        }
        for failure in &self.batch.failures {
            let line = format!("{}: {}", self.relative(&failure.html_path), failure.error);
            let _ = writeln!(out, "  {}", painter.status_fail(&line));
        }
        if verbose {
            for path in &self.build.excluded {
                let line = format!("{} (excluded)", self.relative(path));
                let _ = writeln!(out, "  {}", painter.dim(&line));
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} {}: {} pure static, {} routing only, {} interactive",
            painter.header("Summary"),
            format_count(stats.total_pages, "page", "pages"),
            painter.number(stats.pure_static),
            painter.number(stats.routing_only),
            painter.number(stats.interactive),
        );
        let _ = writeln!(
            out,
            "  saved {} of {} ({:.1}%), removed {} and {}, {} injected",
            painter.ok(&format_bytes(stats.bytes_saved())),
            format_bytes(stats.original_bytes as i64),
            stats.savings_percent(),
            format_count(stats.scripts_removed, "script", "scripts"),
            format_count(stats.preloads_removed, "preload", "preloads"),
            format_count(
                stats.helpers_injected,
                "navigation helper",
                "navigation helpers",
            ),
        );
        if stats.skipped_pages > 0 || stats.failed_pages > 0 {
            let _ = writeln!(
                out,
                "  {} skipped, {} failed",
                painter.warn(&stats.skipped_pages.to_string()),
                painter.error(&stats.failed_pages.to_string()),
            );
        }

        match (self.out_dir, self.written) {
            (Some(dir), Some(written)) => {
                let _ = writeln!(
                    out,
                    "  wrote {} ({}) to {} in {}",
                    format_count(written.pages_written, "page", "pages"),
                    format_count(written.files_copied, "file copied", "files copied"),
                    painter.path(&dir.display().to_string()),
                    format_duration(stats.elapsed),
                );
            }
            _ => {
                let _ = writeln!(
                    out,
                    "  {} in {}",
                    painter.dim("dry run, nothing written"),
                    format_duration(stats.elapsed)
                );
            }
        }
        out
    }

    fn render_page(
        &self,
        out: &mut String,
        painter: &Painter,
        verbose: bool,
        page: &ProcessedPage,
    ) {
        let analysis = &page.analysis;
        let mut line = format!(
            "  {:<12} {}",
            painter.classification(analysis.classification),
            painter.path(&self.relative(&analysis.html_path))
        );
        if !analysis.classification.is_interactive() {
            let _ = write!(
                line,
                "  {} → {}",
                format_bytes(analysis.original_size as i64),
                format_bytes(page.new_size as i64)
            );
            if page.helper_injected {
                let _ = write!(line, " {}", painter.dim("+nav"));
            }
        } else if let Some(via) = &analysis.interactive_via {
            let via = project_relative(&self.build.project_root, via);
            let _ = write!(line, "  {}", painter.dim(&format!("via {via}")));
        }
        let _ = writeln!(out, "{line}");

        if verbose {
            let _ = writeln!(
                out,
                "      {}",
                painter.dim(&format!(
                    "{} modules={} scripts={}/-{} preloads={}/-{}",
                    indicator_flags(&analysis.indicators),
                    analysis.modules_inspected,
                    analysis.indicators.script_count,
                    page.scripts_removed,
                    analysis.indicators.preload_count,
                    page.preloads_removed,
                ))
            );
            if !analysis.unresolved_imports.is_empty() {
                let _ = writeln!(
                    out,
                    "      {}",
                    painter.dim(&format!("unresolved: {}", analysis.unresolved_imports.join(", ")))
                );
            }
        }
    }
}

/// Crawled paths are canonical; the project root may not be.
fn project_relative(root: &Path, path: &Path) -> String {
    if let Ok(rel) = path.strip_prefix(root) {
        return rel.display().to_string();
    }
    let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    path.strip_prefix(&canonical)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn indicator_flags(set: &IndicatorSet) -> String {
    let flag = |on: bool| if on { "yes" } else { "no" };
    format!(
        "handlers={} hooks={} client={} nav={} closure={}",
        flag(set.has_event_handlers),
        flag(set.uses_stateful_hooks),
        flag(set.is_client_module),
        flag(set.has_navigation_links),
        flag(set.has_client_components),
    )
}
