//! Output stage: mirror the build directory and write rewritten documents.
//!
//! The build directory itself is never modified.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;
use walkdir::WalkDir;

use crate::types::ProcessedPage;

/// Output directory name used when none is given, created next to the build.
pub const DEFAULT_OUT_DIR: &str = "out-unhydrated";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub files_copied: usize,
    pub pages_written: usize,
}

pub fn default_out_dir(project_root: &Path) -> PathBuf {
    project_root.join(DEFAULT_OUT_DIR)
}

/// Refuse output directories that overlap the build directory.
pub fn ensure_disjoint(build_dir: &Path, out_dir: &Path) -> Result<()> {
    let build = normalize(build_dir);
    let out = normalize(out_dir);
    if out.starts_with(&build) {
        bail!(
            "Output directory {} must not be inside the build directory {}",
            out_dir.display(),
            build_dir.display()
        );
    }
    if build.starts_with(&out) {
        bail!(
            "Output directory {} must not contain the build directory {}",
            out_dir.display(),
            build_dir.display()
        );
    }
    Ok(())
}

/// Canonical form of `path` even when its tail does not exist yet.
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

/// Copy every file of `build_dir` into `out_dir`, then overwrite each
/// rewritten document. Interactive pages keep their copied bytes.
pub fn write_output(
    build_dir: &Path,
    out_dir: &Path,
    pages: &[ProcessedPage],
) -> Result<WriteSummary> {
    ensure_disjoint(build_dir, out_dir)?;
    let mut summary = WriteSummary::default();

    for entry in WalkDir::new(build_dir).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", build_dir.display()))?;
        let relative = entry.path().strip_prefix(build_dir).unwrap_or(entry.path());
        let target = out_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            summary.files_copied += 1;
        }
    }

    for page in pages {
        if page.classification().is_interactive() {
            continue;
        }
        let html_path = &page.analysis.html_path;
        let Ok(relative) = html_path.strip_prefix(build_dir) else {
            debug!(page = %html_path.display(), "page outside build dir, not written");
            continue;
        };
        let target = out_dir.join(relative);
        fs::write(&target, &page.html)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        summary.pages_written += 1;
    }

    debug!(
        out_dir = %out_dir.display(),
        copied = summary.files_copied,
        written = summary.pages_written,
        "output written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndicatorSet, PageAnalysis, PageClassification};
    use tempfile::TempDir;

    fn processed(html_path: PathBuf, class: PageClassification, html: &str) -> ProcessedPage {
        ProcessedPage {
            analysis: PageAnalysis {
                html_path,
                entry_path: PathBuf::from("app/page.tsx"),
                classification: class,
                indicators: IndicatorSet::default(),
                original_size: 100,
                modules_inspected: 1,
                interactive_via: None,
                unresolved_imports: Vec::new(),
            },
            new_size: html.len(),
            scripts_removed: 0,
            preloads_removed: 0,
            helper_injected: false,
            html: html.to_string(),
        }
    }

    #[test]
    fn test_copies_tree_and_overwrites_pages() {
        let tmp = TempDir::new().expect("temp dir");
        let build = tmp.path().join("out");
        fs::create_dir_all(build.join("_next/static")).unwrap();
        fs::write(
            build.join("index.html"),
            "<script src=/_next/a.js></script>",
        )
        .unwrap();
        fs::write(build.join("app.html"), "interactive").unwrap();
        fs::write(build.join("_next/static/a.js"), "js").unwrap();

        let out = default_out_dir(tmp.path());
        let pages = vec![
            processed(
                build.join("index.html"),
                PageClassification::PureStatic,
                "<p>static</p>",
            ),
            processed(
                build.join("app.html"),
                PageClassification::Interactive,
                "ignored",
            ),
        ];
        let summary = write_output(&build, &out, &pages).unwrap();

        assert_eq!(summary.files_copied, 3);
        assert_eq!(summary.pages_written, 1);
        assert_eq!(
            fs::read_to_string(out.join("index.html")).unwrap(),
            "<p>static</p>"
        );
        assert_eq!(
            fs::read_to_string(out.join("app.html")).unwrap(),
            "interactive"
        );
        assert_eq!(
            fs::read_to_string(out.join("_next/static/a.js")).unwrap(),
            "js"
        );
        assert_eq!(
            fs::read_to_string(build.join("index.html")).unwrap(),
            "<script src=/_next/a.js></script>"
        );
    }

    #[test]
    fn test_rejects_overlapping_directories() {
        let tmp = TempDir::new().expect("temp dir");
        let build = tmp.path().join("out");
        fs::create_dir_all(&build).unwrap();

        assert!(ensure_disjoint(&build, &build.join("stripped")).is_err());
        assert!(ensure_disjoint(&build, &build).is_err());
        assert!(ensure_disjoint(&build, tmp.path()).is_err());
        assert!(ensure_disjoint(&build, &tmp.path().join("out-unhydrated")).is_ok());
    }
}
