use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::patterns::SOURCE_EXTENSIONS;

/// Prefix every project gets unless configured otherwise: `@/` → source root.
pub const DEFAULT_ROOT_ALIAS: &str = "@/";

/// Resolves local import specifiers to source files on disk.
///
/// Relative specifiers resolve against the importing module's directory,
/// alias-prefixed ones against the alias target. Package specifiers are
/// never resolved.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    aliases: Vec<AliasMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AliasMapping {
    /// `@/` for a `@/*` wildcard, the full specifier for an exact alias.
    pattern: String,
    targets: Vec<PathBuf>,
    wildcard: bool,
}

impl SourceResolver {
    /// Resolver with only the default `@/` alias.
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        let mut resolver = Self {
            aliases: Vec::new(),
        };
        resolver.push_alias(DEFAULT_ROOT_ALIAS, vec![source_root.into()], true);
        resolver
    }

    /// Default alias, then `tsconfig.json`/`jsconfig.json` paths, then
    /// configured aliases. Later entries override earlier ones.
    pub fn for_project(
        project_root: &Path,
        source_root: &Path,
        configured: &BTreeMap<String, String>,
    ) -> Self {
        let mut resolver = Self::new(source_root);

        if let Some(ts_path) = find_tsconfig(project_root) {
            for (pattern, targets, wildcard) in aliases_from_tsconfig(&ts_path) {
                resolver.push_alias(&pattern, targets, wildcard);
            }
        }

        for (prefix, target) in configured {
            let target = project_root.join(target);
            let wildcard = prefix.ends_with('/') || prefix.ends_with('*');
            let pattern = prefix.trim_end_matches('*');
            resolver.push_alias(pattern, vec![target], wildcard);
        }

        resolver
    }

    fn push_alias(&mut self, pattern: &str, targets: Vec<PathBuf>, wildcard: bool) {
        self.aliases.retain(|a| a.pattern != pattern);
        self.aliases.push(AliasMapping {
            pattern: pattern.to_string(),
            targets,
            wildcard,
        });
        // longest prefix wins
        self.aliases
            .sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
    }

    /// True for `./`, `../` and alias-prefixed specifiers.
    pub fn is_local(&self, spec: &str) -> bool {
        is_relative(spec) || self.match_alias(spec).is_some()
    }

    fn match_alias<'s>(&self, spec: &'s str) -> Option<(&AliasMapping, &'s str)> {
        self.aliases.iter().find_map(|alias| {
            if alias.wildcard {
                spec.strip_prefix(alias.pattern.as_str())
                    .map(|rest| (alias, rest))
            } else if spec == alias.pattern {
                Some((alias, ""))
            } else {
                None
            }
        })
    }

    /// Canonical path of the module `spec` refers to, or `None` for
    /// package imports and misses.
    pub fn resolve(&self, importer: &Path, spec: &str) -> Option<PathBuf> {
        let spec = spec.split(['?', '#']).next().unwrap_or(spec);

        if is_relative(spec) {
            let parent = importer.parent()?;
            return resolve_with_extensions(&parent.join(spec));
        }

        let (alias, rest) = self.match_alias(spec)?;
        alias.targets.iter().find_map(|target| {
            let candidate = if rest.is_empty() {
                target.clone()
            } else {
                target.join(rest)
            };
            resolve_with_extensions(&candidate)
        })
    }
}

fn is_relative(spec: &str) -> bool {
    spec.starts_with("./") || spec.starts_with("../") || spec == "." || spec == ".."
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Literal file, then `<path>.<ext>`, then `<path>/index.<ext>`, extensions in
/// [`SOURCE_EXTENSIONS`] order. First existing source file wins.
pub fn resolve_with_extensions(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() && has_source_extension(candidate) {
        return canonical(candidate);
    }

    for ext in SOURCE_EXTENSIONS {
        let with_ext = append_extension(candidate, ext);
        if with_ext.is_file() {
            return canonical(&with_ext);
        }
    }

    if candidate.is_dir() {
        for ext in SOURCE_EXTENSIONS {
            let index = candidate.join(format!("index.{ext}"));
            if index.is_file() {
                return canonical(&index);
            }
        }
    }

    None
}

fn canonical(path: &Path) -> Option<PathBuf> {
    path.canonicalize().ok()
}

pub(crate) fn find_tsconfig(project_root: &Path) -> Option<PathBuf> {
    ["tsconfig.json", "jsconfig.json"]
        .iter()
        .map(|name| project_root.join(name))
        .find(|p| p.is_file())
}

pub(crate) fn parse_tsconfig_value(content: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str(content) {
        return Some(v);
    }
    if let Ok(v) = json_five::from_str::<serde_json::Value>(content) {
        return Some(v);
    }
    None
}

/// `compilerOptions.paths` as (pattern, targets, wildcard). Only trailing
/// `*` wildcards are understood; anything fancier is ignored.
fn aliases_from_tsconfig(ts_path: &Path) -> Vec<(String, Vec<PathBuf>, bool)> {
    let Some(json) = std::fs::read_to_string(ts_path)
        .ok()
        .and_then(|content| parse_tsconfig_value(&content))
    else {
        debug!(path = %ts_path.display(), "unreadable tsconfig, ignoring path aliases");
        return Vec::new();
    };

    let Some(compiler) = json.get("compilerOptions").and_then(|v| v.as_object()) else {
        return Vec::new();
    };

    let config_dir = ts_path.parent().unwrap_or(Path::new("."));
    let base_url = compiler
        .get("baseUrl")
        .and_then(|v| v.as_str())
        .unwrap_or(".");
    let base_dir = config_dir.join(base_url);

    let Some(paths) = compiler.get("paths").and_then(|p| p.as_object()) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (alias, targets) in paths {
        let alias = alias.replace('\\', "/");
        let wildcard_count = alias.matches('*').count();
        if wildcard_count > 1 || (wildcard_count == 1 && !alias.ends_with('*')) {
            continue;
        }
        let wildcard = wildcard_count == 1;

        let targets: Vec<PathBuf> = targets
            .as_array()
            .into_iter()
            .flat_map(|arr| arr.iter())
            .filter_map(|v| v.as_str())
            .map(|s| s.replace('\\', "/"))
            .filter(|s| !wildcard || s.ends_with('*'))
            .map(|s| base_dir.join(s.trim_end_matches('*')))
            .collect();
        if targets.is_empty() {
            continue;
        }

        out.push((alias.trim_end_matches('*').to_string(), targets, wildcard));
    }
    out
}
