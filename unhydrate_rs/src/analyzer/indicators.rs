//! Textual indicator detection for component sources and their HTML.

use crate::types::IndicatorSet;

use super::patterns::{
    regex_client_directive, regex_event_handler, regex_html_preload_link, regex_html_script_open,
    regex_navigation_import, regex_navigation_tag, regex_stateful_hook,
};

/// Indicators for one source module plus the script/preload counts of the
/// page's HTML. `has_client_components` is left unset; the crawl fills it.
pub fn detect(source: &str, html: &str) -> IndicatorSet {
    let mut set = detect_source(source);
    set.script_count = regex_html_script_open().find_iter(html).count();
    set.preload_count = regex_html_preload_link().find_iter(html).count();
    set
}

/// Source-only indicators. Each family is checked independently.
pub fn detect_source(source: &str) -> IndicatorSet {
    IndicatorSet {
        has_event_handlers: regex_event_handler().is_match(source),
        uses_stateful_hooks: regex_stateful_hook().is_match(source),
        is_client_module: regex_client_directive().is_match(source),
        has_navigation_links: regex_navigation_import().is_match(source)
            || regex_navigation_tag().is_match(source),
        ..IndicatorSet::default()
    }
}

/// Cheaper check used by the crawler: stops at the first interactivity family hit.
pub fn has_interactivity(source: &str) -> bool {
    regex_client_directive().is_match(source)
        || regex_stateful_hook().is_match(source)
        || regex_event_handler().is_match(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_server_component_has_no_signals() {
        let source = r#"
import Hero from "./Hero";

export default function Page() {
  return <main><Hero title="Hello" /></main>;
}
"#;
        let set = detect_source(source);
        assert_eq!(set, IndicatorSet::default());
        assert!(!has_interactivity(source));
    }

    #[test]
    fn families_are_reported_independently() {
        let source = r#"
"use client";
import Link from "next/link";
import { useState } from "react";

export default function Nav() {
  const [open, setOpen] = useState(false);
  return <button onClick={() => setOpen(!open)}><Link href="/">Home</Link></button>;
}
"#;
        let set = detect_source(source);
        assert!(set.has_event_handlers);
        assert!(set.uses_stateful_hooks);
        assert!(set.is_client_module);
        assert!(set.has_navigation_links);
        assert!(!set.has_client_components);
        assert!(set.has_interactivity());
    }

    #[test]
    fn link_tag_without_import_counts_as_navigation() {
        let set = detect_source(r#"export const A = () => <Link href="/about">About</Link>;"#);
        assert!(set.has_navigation_links);
        assert!(!set.has_interactivity());
    }

    #[test]
    fn link_import_alone_counts_as_navigation() {
        let set = detect_source("import NextLink from 'next/link'\n");
        assert!(set.has_navigation_links);
    }

    #[test]
    fn html_counts_scripts_and_preloads() {
        let html = r#"<html><head>
<link rel="preload" as="script" href="/_next/static/chunks/a.js">
<link rel="modulepreload" href="/_next/static/chunks/b.js">
<link rel="stylesheet" href="/_next/static/css/app.css">
<script src="/_next/static/chunks/main.js"></script>
</head><body><SCRIPT>self.__next_f.push([1,""])</SCRIPT></body></html>"#;
        let set = detect("export default function P() { return null }", html);
        assert_eq!(set.script_count, 2);
        assert_eq!(set.preload_count, 2);
    }

    #[test]
    fn hooks_typed_with_function_types_are_interactive() {
        for source in [
            "const [cb, setCb] = useState<(() => void) | null>(null);",
            "const [fn] = useState<() => void>(() => noop);",
            "const h = useCallback<(e: Event) => void>((e) => log(e), []);",
        ] {
            assert!(has_interactivity(source), "{source}");
            assert!(detect_source(source).uses_stateful_hooks, "{source}");
        }
    }

    #[test]
    fn detection_is_deterministic() {
        let source = "import { useRef } from 'react';\nconst r = useRef(null);";
        assert_eq!(detect(source, ""), detect(source, ""));
    }
}
