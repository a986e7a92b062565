//! Build detection: locate the generated documents and the source module
//! that rendered each one.
//!
//! Layouts are checked in order:
//! - `out/` → static export
//! - `.next/server/app` → prerendered App Router pages
//! - `.next/server/pages` → prerendered Pages Router pages

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use globset::GlobSet;
use tracing::debug;
use walkdir::WalkDir;

use crate::analyzer::patterns::SOURCE_EXTENSIONS;
use crate::config::UnhydrateConfig;
use crate::types::PageInput;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildLayout {
    StaticExport,
    AppRouter,
    PagesRouter,
}

impl BuildLayout {
    const CANDIDATES: [(BuildLayout, &'static str); 3] = [
        (BuildLayout::StaticExport, "out"),
        (BuildLayout::AppRouter, ".next/server/app"),
        (BuildLayout::PagesRouter, ".next/server/pages"),
    ];

    pub fn description(&self) -> &'static str {
        match self {
            BuildLayout::StaticExport => "static export",
            BuildLayout::AppRouter => "prerendered app router",
            BuildLayout::PagesRouter => "prerendered pages router",
        }
    }
}

/// Result of build detection
#[derive(Clone, Debug)]
pub struct DetectedBuild {
    pub layout: BuildLayout,
    pub project_root: PathBuf,
    pub build_dir: PathBuf,
    pub source_root: PathBuf,
    /// Every document found, in path order. `entry_path` is `None` when no
    /// source module matched the route.
    pub pages: Vec<PageInput>,
    /// Documents matched by an exclude pattern.
    pub excluded: Vec<PathBuf>,
}

impl DetectedBuild {
    pub fn unmatched(&self) -> impl Iterator<Item = &PageInput> {
        self.pages.iter().filter(|p| p.entry_path.is_none())
    }
}

/// Route a generated document serves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// URL path segments; empty for `/`.
    Path(Vec<String>),
    NotFound,
    ServerError,
}

impl Route {
    /// `index.html` → `/`, `about.html` and `about/index.html` → `/about`.
    pub fn from_html_path(relative: &Path) -> Option<Route> {
        let mut segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let file = segments.pop()?;
        let stem = file
            .strip_suffix(".html")
            .or_else(|| file.strip_suffix(".htm"))?
            .to_string();
        if stem != "index" {
            segments.push(stem);
        }

        match segments.as_slice() {
            [only] if only == "404" || only == "_not-found" => Some(Route::NotFound),
            [only] if only == "500" || only == "_error" => Some(Route::ServerError),
            _ => Some(Route::Path(segments)),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Path(segments) => write!(f, "/{}", segments.join("/")),
            Route::NotFound => f.write_str("(not found)"),
            Route::ServerError => f.write_str("(server error)"),
        }
    }
}

/// Detect the build layout under `project_root` and pair every document
/// with its entry source module.
pub fn detect_build(
    project_root: &Path,
    build_override: Option<&Path>,
    config: &UnhydrateConfig,
) -> Result<DetectedBuild> {
    let (layout, build_dir) = match build_override {
        Some(dir) => {
            let dir = if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                project_root.join(dir)
            };
            if !dir.is_dir() {
                bail!("Build directory {} does not exist", dir.display());
            }
            (BuildLayout::StaticExport, dir)
        }
        None => match BuildLayout::CANDIDATES
            .iter()
            .map(|(layout, rel)| (*layout, project_root.join(rel)))
            .find(|(_, dir)| dir.is_dir())
        {
            Some(found) => found,
            None => bail!(
                "No build output found in {} (looked for out/, .next/server/app, .next/server/pages)",
                project_root.display()
            ),
        },
    };

    let source_root = detect_source_root(project_root, config.source_root.as_deref());
    let excludes = config.exclude_set();
    debug!(
        layout = layout.description(),
        build_dir = %build_dir.display(),
        source_root = %source_root.display(),
        "build detected"
    );

    let mut pages = Vec::new();
    let mut excluded = Vec::new();
    for html_path in html_documents(&build_dir) {
        let relative = html_path.strip_prefix(&build_dir).unwrap_or(&html_path);
        if is_excluded(relative, &excludes) {
            excluded.push(html_path);
            continue;
        }
        let entry = Route::from_html_path(relative).and_then(|route| {
            let entry = find_entry(&source_root, &route);
            if entry.is_none() {
                debug!(page = %relative.display(), %route, "no entry source for route");
            }
            entry
        });
        pages.push(PageInput::new(html_path, entry));
    }

    Ok(DetectedBuild {
        layout,
        project_root: project_root.to_path_buf(),
        build_dir,
        source_root,
        pages,
        excluded,
    })
}

/// Configured root, else `<project>/src` when it holds `app/` or `pages/`,
/// else the project root.
pub fn detect_source_root(project_root: &Path, configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return project_root.join(dir);
    }
    let src = project_root.join("src");
    if src.join("app").is_dir() || src.join("pages").is_dir() {
        src
    } else {
        project_root.to_path_buf()
    }
}

/// All `.html` documents under `build_dir`, skipping `_next/` internals.
pub fn html_documents(build_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(build_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != "_next")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        })
        .collect()
}

fn is_excluded(relative: &Path, excludes: &GlobSet) -> bool {
    let normalized = relative.to_string_lossy().replace('\\', "/");
    excludes.is_match(normalized.as_str())
}

/// App Router first, then Pages Router.
pub fn find_entry(source_root: &Path, route: &Route) -> Option<PathBuf> {
    let app = source_root.join("app");
    let pages = source_root.join("pages");

    match route {
        Route::Path(segments) => {
            let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
            match_app_route(&app, &segments).or_else(|| match_pages_route(&pages, &segments))
        }
        Route::NotFound => {
            source_file(&app.join("not-found")).or_else(|| source_file(&pages.join("404")))
        }
        Route::ServerError => {
            source_file(&pages.join("500")).or_else(|| source_file(&pages.join("_error")))
        }
    }
}

/// `<base>.<ext>` in extension order.
fn source_file(base: &Path) -> Option<PathBuf> {
    SOURCE_EXTENSIONS.iter().find_map(|ext| {
        let mut raw = base.as_os_str().to_owned();
        raw.push(".");
        raw.push(ext);
        let candidate = PathBuf::from(raw);
        candidate.is_file().then_some(candidate)
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SegmentKind {
    Group,
    Dynamic,
    CatchAll,
    OptionalCatchAll,
}

fn segment_kind(name: &str) -> Option<SegmentKind> {
    if name.starts_with('(') && name.ends_with(')') {
        Some(SegmentKind::Group)
    } else if name.starts_with("[[...") && name.ends_with("]]") {
        Some(SegmentKind::OptionalCatchAll)
    } else if name.starts_with("[...") && name.ends_with(']') {
        Some(SegmentKind::CatchAll)
    } else if name.starts_with('[') && name.ends_with(']') {
        Some(SegmentKind::Dynamic)
    } else {
        None
    }
}

/// Special children of `dir` (groups, dynamic and catch-all segments),
/// sorted by name so matching is deterministic.
fn special_children(dir: &Path, want: SegmentKind) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|e| segment_kind(&e.file_name().to_string_lossy()) == Some(want))
        .map(|e| e.path())
        .collect();
    found.sort();
    found
}

/// Literal segments beat groups, groups beat dynamic segments, catch-alls
/// match last.
fn match_app_route(dir: &Path, segments: &[&str]) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    let Some((head, rest)) = segments.split_first() else {
        return source_file(&dir.join("page"))
            .or_else(|| {
                special_children(dir, SegmentKind::Group)
                    .iter()
                    .find_map(|group| match_app_route(group, segments))
            })
            .or_else(|| {
                special_children(dir, SegmentKind::OptionalCatchAll)
                    .iter()
                    .find_map(|child| source_file(&child.join("page")))
            });
    };

    match_app_route(&dir.join(head), rest)
        .or_else(|| {
            special_children(dir, SegmentKind::Group)
                .iter()
                .find_map(|group| match_app_route(group, segments))
        })
        .or_else(|| {
            special_children(dir, SegmentKind::Dynamic)
                .iter()
                .find_map(|child| match_app_route(child, rest))
        })
        .or_else(|| {
            special_children(dir, SegmentKind::CatchAll)
                .iter()
                .chain(special_children(dir, SegmentKind::OptionalCatchAll).iter())
                .find_map(|child| source_file(&child.join("page")))
        })
}

/// Pages Router: `<route>.<ext>`, then `<route>/index.<ext>`, then dynamic
/// `[x].<ext>` files and directories.
fn match_pages_route(dir: &Path, segments: &[&str]) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    let Some((head, rest)) = segments.split_first() else {
        return source_file(&dir.join("index")).or_else(|| optional_catch_all_file(dir));
    };

    if rest.is_empty()
        && let Some(found) = source_file(&dir.join(head))
    {
        return Some(found);
    }

    match_pages_route(&dir.join(head), rest)
        .or_else(|| {
            if rest.is_empty() {
                dynamic_files(dir, SegmentKind::Dynamic).into_iter().next()
            } else {
                None
            }
        })
        .or_else(|| {
            special_children(dir, SegmentKind::Dynamic)
                .iter()
                .find_map(|child| match_pages_route(child, rest))
        })
        .or_else(|| {
            dynamic_files(dir, SegmentKind::CatchAll)
                .into_iter()
                .chain(dynamic_files(dir, SegmentKind::OptionalCatchAll))
                .next()
        })
}

fn optional_catch_all_file(dir: &Path) -> Option<PathBuf> {
    dynamic_files(dir, SegmentKind::OptionalCatchAll)
        .into_iter()
        .next()
}

/// Source files in `dir` whose stem is a special segment of kind `want`.
fn dynamic_files(dir: &Path, want: SegmentKind) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
        })
        .filter(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| segment_kind(stem) == Some(want))
        })
        .collect();
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "export default () => null;").unwrap();
        path
    }

    fn route(rel: &str) -> Route {
        Route::from_html_path(Path::new(rel)).unwrap()
    }

    #[test]
    fn test_route_from_html_path() {
        assert_eq!(route("index.html"), Route::Path(vec![]));
        assert_eq!(route("about.html"), Route::Path(vec!["about".into()]));
        assert_eq!(route("about/index.html"), Route::Path(vec!["about".into()]));
        assert_eq!(
            route("blog/hello.html"),
            Route::Path(vec!["blog".into(), "hello".into()])
        );
        assert_eq!(route("404.html"), Route::NotFound);
        assert_eq!(route("_not-found.html"), Route::NotFound);
        assert_eq!(route("500.html"), Route::ServerError);
        assert!(Route::from_html_path(Path::new("index.txt")).is_none());
        assert_eq!(route("blog/hello.html").to_string(), "/blog/hello");
    }

    #[test]
    fn test_app_router_matching() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let home = touch(root, "app/page.tsx");
        let about = touch(root, "app/about/page.tsx");
        let pricing = touch(root, "app/(marketing)/pricing/page.jsx");
        let post = touch(root, "app/blog/[slug]/page.tsx");
        let docs = touch(root, "app/docs/[...path]/page.tsx");
        let not_found = touch(root, "app/not-found.tsx");

        assert_eq!(find_entry(root, &route("index.html")), Some(home));
        assert_eq!(find_entry(root, &route("about.html")), Some(about));
        assert_eq!(
            find_entry(root, &route("pricing/index.html")),
            Some(pricing)
        );
        assert_eq!(find_entry(root, &route("blog/first-post.html")), Some(post));
        assert_eq!(find_entry(root, &route("docs/a/b/c.html")), Some(docs));
        assert_eq!(find_entry(root, &route("404.html")), Some(not_found));
        assert_eq!(find_entry(root, &route("missing.html")), None);
    }

    #[test]
    fn test_literal_segment_beats_dynamic() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let literal = touch(root, "app/blog/archive/page.tsx");
        touch(root, "app/blog/[slug]/page.tsx");

        assert_eq!(find_entry(root, &route("blog/archive.html")), Some(literal));
    }

    #[test]
    fn test_pages_router_matching() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let index = touch(root, "pages/index.js");
        let about = touch(root, "pages/about.tsx");
        let team = touch(root, "pages/team/index.tsx");
        let product = touch(root, "pages/products/[id].tsx");
        let not_found = touch(root, "pages/404.tsx");

        assert_eq!(find_entry(root, &route("index.html")), Some(index));
        assert_eq!(find_entry(root, &route("about.html")), Some(about));
        assert_eq!(find_entry(root, &route("team.html")), Some(team));
        assert_eq!(find_entry(root, &route("products/42.html")), Some(product));
        assert_eq!(find_entry(root, &route("404.html")), Some(not_found));
    }

    #[test]
    fn test_app_router_takes_precedence() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let app = touch(root, "app/about/page.tsx");
        touch(root, "pages/about.tsx");

        assert_eq!(find_entry(root, &route("about.html")), Some(app));
    }

    #[test]
    fn test_source_root_prefers_src_with_router() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        assert_eq!(detect_source_root(root, None), root);

        touch(root, "src/app/page.tsx");
        assert_eq!(detect_source_root(root, None), root.join("src"));
        assert_eq!(
            detect_source_root(root, Some(Path::new("web"))),
            root.join("web")
        );
    }

    #[test]
    fn test_detect_static_export() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(root, "app/page.tsx");
        touch(root, "app/about/page.tsx");
        touch(root, "out/index.html");
        touch(root, "out/about.html");
        touch(root, "out/orphan.html");
        touch(root, "out/admin/index.html");
        touch(root, "out/_next/static/chunks/inline.html");
        touch(root, "out/index.txt");

        let config = UnhydrateConfig {
            exclude: vec!["admin/**".to_string()],
            ..UnhydrateConfig::default()
        };
        let build = detect_build(root, None, &config).unwrap();

        assert_eq!(build.layout, BuildLayout::StaticExport);
        assert_eq!(build.build_dir, root.join("out"));
        assert_eq!(build.excluded, vec![root.join("out/admin/index.html")]);

        let out = root.join("out");
        let names: Vec<_> = build
            .pages
            .iter()
            .map(|p| p.html_path.strip_prefix(&out).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("about.html"),
                PathBuf::from("index.html"),
                PathBuf::from("orphan.html"),
            ]
        );
        assert_eq!(build.unmatched().count(), 1);
    }

    #[test]
    fn test_detect_prerendered_app_router() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(root, "src/app/page.tsx");
        touch(root, ".next/server/app/index.html");

        let build = detect_build(root, None, &UnhydrateConfig::default()).unwrap();
        assert_eq!(build.layout, BuildLayout::AppRouter);
        assert_eq!(build.source_root, root.join("src"));
        assert_eq!(
            build.pages[0].entry_path,
            Some(root.join("src/app/page.tsx"))
        );
    }

    #[test]
    fn test_detect_build_override_and_missing() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        assert!(detect_build(root, None, &UnhydrateConfig::default()).is_err());
        assert!(detect_build(root, Some(Path::new("dist")), &UnhydrateConfig::default()).is_err());

        touch(root, "dist/index.html");
        let build =
            detect_build(root, Some(Path::new("dist")), &UnhydrateConfig::default()).unwrap();
        assert_eq!(build.build_dir, root.join("dist"));
        assert_eq!(build.pages.len(), 1);
    }
}
