//! Marker tables and the compiled regexes built from them.
//!
//! Tables are plain constants. Extra runtime markers from the config file are
//! injected by value through [`RuntimeMarkers`]; nothing here mutates after
//! first use.

use std::sync::OnceLock;

use regex::Regex;

/// Source extensions, in resolution priority order.
pub const SOURCE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js", "mjs", "cjs"];

pub const EVENT_HANDLER_ATTRS: &[&str] = &[
    "onClick",
    "onDoubleClick",
    "onChange",
    "onInput",
    "onSubmit",
    "onReset",
    "onKeyDown",
    "onKeyUp",
    "onKeyPress",
    "onFocus",
    "onBlur",
    "onMouseEnter",
    "onMouseLeave",
    "onMouseDown",
    "onMouseUp",
    "onMouseOver",
    "onMouseOut",
    "onMouseMove",
    "onPointerDown",
    "onPointerUp",
    "onPointerMove",
    "onPointerEnter",
    "onPointerLeave",
    "onTouchStart",
    "onTouchEnd",
    "onTouchMove",
    "onScroll",
    "onWheel",
    "onDrag",
    "onDragStart",
    "onDragEnd",
    "onDragOver",
    "onDrop",
    "onContextMenu",
];

pub const STATEFUL_HOOKS: &[&str] = &[
    "useState",
    "useEffect",
    "useLayoutEffect",
    "useInsertionEffect",
    "useReducer",
    "useRef",
    "useContext",
    "useCallback",
    "useMemo",
    "useTransition",
    "useDeferredValue",
    "useImperativeHandle",
    "useSyncExternalStore",
    "useOptimistic",
    "useActionState",
    "useFormStatus",
    // client-only navigation hooks
    "useRouter",
    "usePathname",
    "useSearchParams",
    "useParams",
];

/// Module specifier of the framework's client-side link component.
pub const NAVIGATION_MODULE: &str = "next/link";

pub const RUNTIME_URL_MARKERS: &[&str] = &["/_next/", "_next/static/"];

pub const RUNTIME_INLINE_MARKERS: &[&str] = &[
    "self.__next_f",
    "__next_f.push",
    "__NEXT_DATA__",
    "__NEXT_P",
    "__next_s",
    "webpackChunk_N_E",
];

/// Script types carrying data rather than code. Always preserved verbatim.
pub const STRUCTURED_DATA_TYPES: &[&str] = &[
    "application/ld+json",
    "application/json",
    "importmap",
    "speculationrules",
];

/// Script types a browser executes. Anything else is treated as inert.
pub const EXECUTABLE_SCRIPT_TYPES: &[&str] = &[
    "",
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "text/ecmascript",
    "application/ecmascript",
    "text/jscript",
    "module",
];

pub const PRELOAD_RELS: &[&str] = &["preload", "modulepreload", "prefetch"];

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex literal")
}

fn alternation(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

pub(crate) fn regex_event_handler() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex(&format!(
            r#"\b(?:{})\s*=\s*\{{"#,
            alternation(EVENT_HANDLER_ATTRS)
        ))
    })
}

pub(crate) fn regex_stateful_hook() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // optional `React.` namespace; a call or an explicit type argument list
    // (which may itself hold function types) follows the hook name
    RE.get_or_init(|| {
        regex(&format!(
            r#"\b(?:React\.)?(?:{})\s*[<(]"#,
            alternation(STATEFUL_HOOKS)
        ))
    })
}

pub(crate) fn regex_client_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"(?m)^\s*["']use client["']\s*;?\s*$"#))
}

pub(crate) fn regex_navigation_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex(&format!(
            r#"(?m)^\s*import\s+[^;]*?\bfrom\s+["']{}["']"#,
            regex::escape(NAVIGATION_MODULE)
        ))
    })
}

pub(crate) fn regex_navigation_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"<Link[\s/>]"#))
}

pub(crate) fn regex_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"(?m)^\s*import\s+([^;]+?)\s+from\s+["']([^"']+)["']"#))
}

pub(crate) fn regex_side_effect_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"(?m)^\s*import\s+["']([^"']+)["']"#))
}

pub(crate) fn regex_reexport() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex(r#"(?m)^\s*export\s+(?:type\s+)?(?:\*(?:\s+as\s+\w+)?|\{[^}]*\})\s*from\s+["']([^"']+)["']"#)
    })
}

pub(crate) fn regex_dynamic_import() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"import\s*\(\s*["']([^"']+)["']\s*\)"#))
}

pub(crate) fn regex_html_script_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r#"(?i)<script\b"#))
}

pub(crate) fn regex_html_preload_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex(r#"(?i)<link\b[^>]*\brel\s*=\s*["']?[^"'>]*\b(?:preload|modulepreload|prefetch)\b"#)
    })
}

/// Framework-runtime markers, defaults plus configured extras.
#[derive(Debug, Clone)]
pub struct RuntimeMarkers {
    url: Vec<String>,
    inline: Vec<String>,
}

impl Default for RuntimeMarkers {
    fn default() -> Self {
        Self {
            url: owned(RUNTIME_URL_MARKERS),
            inline: owned(RUNTIME_INLINE_MARKERS),
        }
    }
}

fn owned(markers: &[&str]) -> Vec<String> {
    markers.iter().map(|m| m.to_string()).collect()
}

impl RuntimeMarkers {
    pub fn with_extra(mut self, url: &[String], inline: &[String]) -> Self {
        let present = |m: &&String| !m.is_empty();
        self.url.extend(url.iter().filter(present).cloned());
        self.inline.extend(inline.iter().filter(present).cloned());
        self
    }

    pub fn matches_url(&self, url: &str) -> bool {
        self.url.iter().any(|m| url.contains(m.as_str()))
    }

    pub fn matches_inline(&self, body: &str) -> bool {
        self.inline.iter().any(|m| body.contains(m.as_str()))
    }
}

/// Lowercased MIME essence of a `type` attribute
/// (`text/javascript; charset=x` → `text/javascript`).
pub fn script_type_essence(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_structured_data_type(essence: &str) -> bool {
    STRUCTURED_DATA_TYPES.contains(&essence)
}

pub fn is_executable_type(essence: &str) -> bool {
    EXECUTABLE_SCRIPT_TYPES.contains(&essence)
}
