//! Dependency closure crawl over locally-imported source modules.
//!
//! The crawl answers one question: does any module reachable from the page's
//! entry through local imports need hydration? It stops at the first module
//! that does. Any branch reaching an interactive module makes the whole page
//! interactive, regardless of which render path runs.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::indicators::has_interactivity;
use super::patterns::{regex_dynamic_import, regex_import, regex_reexport, regex_side_effect_import};
use super::resolvers::SourceResolver;

/// What the crawl learned about one page's dependency closure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosureReport {
    pub interactive: bool,
    /// First module found with an interactivity indicator.
    pub triggered_by: Option<PathBuf>,
    pub modules_inspected: usize,
    /// Local specifiers that did not resolve to a source file.
    pub unresolved: Vec<String>,
}

pub struct DependencyCrawler<'a> {
    resolver: &'a SourceResolver,
}

impl<'a> DependencyCrawler<'a> {
    pub fn new(resolver: &'a SourceResolver) -> Self {
        Self { resolver }
    }

    /// Crawl from the entry module. `visited` lives for this call only, so
    /// each module is inspected at most once per page.
    pub fn closure(&self, entry_path: &Path, entry_content: &str) -> ClosureReport {
        let mut report = ClosureReport::default();
        let entry_key = entry_path
            .canonicalize()
            .unwrap_or_else(|_| entry_path.to_path_buf());

        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(entry_key.clone());

        if self.inspect(&entry_key, entry_content, &mut report) {
            return report;
        }

        let mut pending = self.local_imports(&entry_key, entry_content, &mut visited, &mut report);
        while let Some(module) = pending.pop() {
            let content = match fs::read_to_string(&module) {
                Ok(content) => content,
                Err(err) => {
                    debug!(module = %module.display(), error = %err, "skipping unreadable import");
                    continue;
                }
            };
            if self.inspect(&module, &content, &mut report) {
                return report;
            }
            pending.extend(self.local_imports(&module, &content, &mut visited, &mut report));
        }

        report
    }

    /// Record one module; true when it ends the crawl.
    fn inspect(&self, module: &Path, content: &str, report: &mut ClosureReport) -> bool {
        report.modules_inspected += 1;
        if has_interactivity(content) {
            debug!(module = %module.display(), "interactive module in closure");
            report.interactive = true;
            report.triggered_by = Some(module.to_path_buf());
            return true;
        }
        false
    }

    /// Resolved, not-yet-visited local imports of `module`. Newly returned
    /// paths are marked visited immediately (first arrival wins).
    fn local_imports(
        &self,
        module: &Path,
        content: &str,
        visited: &mut HashSet<PathBuf>,
        report: &mut ClosureReport,
    ) -> Vec<PathBuf> {
        let mut next = Vec::new();
        for spec in import_specifiers(content) {
            if !self.resolver.is_local(&spec) {
                continue;
            }
            match self.resolver.resolve(module, &spec) {
                Some(resolved) => {
                    if visited.insert(resolved.clone()) {
                        next.push(resolved);
                    }
                }
                None => {
                    debug!(from = %module.display(), spec = %spec, "unresolved local import");
                    if !report.unresolved.contains(&spec) {
                        report.unresolved.push(spec);
                    }
                }
            }
        }
        next
    }
}

/// Every module specifier named by an import-like statement, in source order.
pub(crate) fn import_specifiers(content: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();
    for caps in regex_import().captures_iter(content) {
        if let Some(m) = caps.get(2) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }
    for re in [
        regex_side_effect_import(),
        regex_reexport(),
        regex_dynamic_import(),
    ] {
        for caps in re.captures_iter(content) {
            if let Some(m) = caps.get(1) {
                found.push((m.start(), m.as_str().to_string()));
            }
        }
    }
    found.sort_by_key(|(pos, _)| *pos);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, spec)| spec)
        .filter(|spec| seen.insert(spec.clone()))
        .collect()
}
