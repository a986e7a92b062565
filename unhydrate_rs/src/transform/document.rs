//! Minimal HTML scanner locating `<script>` and `<link>` elements.
//!
//! This is not a DOM. It walks the markup once, skips comments and raw-text
//! bodies, and records byte spans so whole elements can be spliced out. It
//! refuses documents whose tags or raw-text elements never terminate.

use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{reason} at byte {offset}")]
pub struct DocumentError {
    pub offset: usize,
    pub reason: &'static str,
}

impl DocumentError {
    fn new(offset: usize, reason: &'static str) -> Self {
        Self { offset, reason }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Script,
    Link,
}

/// Lowercased attribute names with raw values, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }
}

#[derive(Debug, Clone)]
pub struct Element<'a> {
    pub kind: ElementKind,
    /// Whole element: opening tag through closing tag for scripts.
    pub span: Range<usize>,
    pub attrs: Attributes,
    /// Inline script text; empty for links and external scripts.
    pub body: &'a str,
}

#[derive(Debug)]
pub struct Document<'a> {
    pub source: &'a str,
    pub elements: Vec<Element<'a>>,
    /// Offset of the last `</body>` outside comments and raw text.
    pub body_close: Option<usize>,
    pub html_close: Option<usize>,
}

impl<'a> Document<'a> {
    pub fn parse(source: &'a str) -> Result<Self, DocumentError> {
        Scanner::new(source).run()
    }

    pub fn scripts(&self) -> impl Iterator<Item = &Element<'a>> {
        self.of_kind(ElementKind::Script)
    }

    pub fn links(&self) -> impl Iterator<Item = &Element<'a>> {
        self.of_kind(ElementKind::Link)
    }

    fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Element<'a>> {
        self.elements.iter().filter(move |e| e.kind == kind)
    }
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    doc: Document<'a>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            doc: Document {
                source: src,
                elements: Vec::new(),
                body_close: None,
                html_close: None,
            },
        }
    }

    fn run(mut self) -> Result<Document<'a>, DocumentError> {
        while let Some(rel) = self.src[self.pos..].find('<') {
            let start = self.pos + rel;
            let rest = &self.bytes[start..];

            if rest.starts_with(b"<!--") {
                let end = self.src[start + 4..]
                    .find("-->")
                    .ok_or_else(|| DocumentError::new(start, "unterminated comment"))?;
                self.pos = start + 4 + end + 3;
            } else if rest.starts_with(b"<!") || rest.starts_with(b"<?") {
                let end = self.src[start..]
                    .find('>')
                    .ok_or_else(|| DocumentError::new(start, "unterminated declaration"))?;
                self.pos = start + end + 1;
            } else if rest.starts_with(b"</") {
                self.closing_tag(start)?;
            } else if rest.get(1).is_some_and(|b| b.is_ascii_alphabetic()) {
                self.opening_tag(start)?;
            } else {
                self.pos = start + 1;
            }
        }
        Ok(self.doc)
    }

    fn closing_tag(&mut self, start: usize) -> Result<(), DocumentError> {
        let name_start = start + 2;
        let name_end = self.name_end(name_start);
        let end = self.src[name_end..]
            .find('>')
            .ok_or_else(|| DocumentError::new(start, "unterminated closing tag"))?;
        let name = &self.src[name_start..name_end];
        if name.eq_ignore_ascii_case("body") {
            self.doc.body_close = Some(start);
        } else if name.eq_ignore_ascii_case("html") {
            self.doc.html_close = Some(start);
        }
        self.pos = name_end + end + 1;
        Ok(())
    }

    fn opening_tag(&mut self, start: usize) -> Result<(), DocumentError> {
        let name_start = start + 1;
        let name_end = self.name_end(name_start);
        let name = self.src[name_start..name_end].to_ascii_lowercase();
        let (attrs, tag_end) = self.attributes(start, name_end)?;

        match name.as_str() {
            "script" => {
                let close = find_ci(self.src, "</script", tag_end)
                    .ok_or_else(|| DocumentError::new(start, "script element is never closed"))?;
                let close_end = self.src[close..]
                    .find('>')
                    .map(|i| close + i + 1)
                    .ok_or_else(|| DocumentError::new(close, "unterminated closing tag"))?;
                self.doc.elements.push(Element {
                    kind: ElementKind::Script,
                    span: start..close_end,
                    attrs,
                    body: &self.src[tag_end..close],
                });
                self.pos = close_end;
            }
            "link" => {
                self.doc.elements.push(Element {
                    kind: ElementKind::Link,
                    span: start..tag_end,
                    attrs,
                    body: "",
                });
                self.pos = tag_end;
            }
            "style" | "textarea" | "title" => {
                let closing = format!("</{name}");
                let close = find_ci(self.src, &closing, tag_end)
                    .ok_or_else(|| DocumentError::new(start, "raw text element is never closed"))?;
                self.pos = close;
            }
            _ => self.pos = tag_end,
        }
        Ok(())
    }

    fn name_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|b| !(b.is_ascii_alphanumeric() || *b == b'-' || *b == b':' || *b == b'_'))
            .map_or(self.bytes.len(), |i| from + i)
    }

    /// Parse attributes after the tag name; returns them and the offset just
    /// past the closing `>`.
    fn attributes(
        &self,
        tag_start: usize,
        mut i: usize,
    ) -> Result<(Attributes, usize), DocumentError> {
        let b = self.bytes;
        let unterminated = || DocumentError::new(tag_start, "unterminated tag");
        let mut attrs = Vec::new();

        loop {
            while i < b.len() && (b[i].is_ascii_whitespace() || b[i] == b'/') {
                i += 1;
            }
            if i >= b.len() {
                return Err(unterminated());
            }
            if b[i] == b'>' {
                return Ok((Attributes(attrs), i + 1));
            }

            let name_start = i;
            while i < b.len() && !ends_attr_name(b[i]) {
                i += 1;
            }
            let name = self.src[name_start..i].to_ascii_lowercase();

            let mut j = i;
            while j < b.len() && b[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < b.len() && b[j] == b'=' {
                j += 1;
                while j < b.len() && b[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j >= b.len() {
                    return Err(unterminated());
                }
                let value = if b[j] == b'"' || b[j] == b'\'' {
                    let quote = b[j] as char;
                    let close = self.src[j + 1..]
                        .find(quote)
                        .ok_or_else(|| DocumentError::new(j, "unterminated attribute value"))?;
                    let v = &self.src[j + 1..j + 1 + close];
                    j = j + 1 + close + 1;
                    v
                } else {
                    let v_start = j;
                    while j < b.len() && !(b[j].is_ascii_whitespace() || b[j] == b'>') {
                        j += 1;
                    }
                    &self.src[v_start..j]
                };
                attrs.push((name, value.to_string()));
                i = j;
            } else {
                attrs.push((name, String::new()));
            }
        }
    }
}

/// ASCII case-insensitive search for `needle` in `haystack[from..]`.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || hay.len() < needle.len() {
        return None;
    }
    (from..=hay.len() - needle.len())
        .find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

fn ends_attr_name(c: u8) -> bool {
    c.is_ascii_whitespace() || matches!(c, b'=' | b'>' | b'/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locates_scripts_and_links() {
        let html = r#"<!DOCTYPE html><html><head>
<link rel="modulepreload" href="/_next/static/chunks/a.js"/>
<script src="/_next/static/chunks/main.js" async=""></script>
</head><body><p>Hi</p><script>self.__next_f.push([1,"x"])</script></body></html>"#;
        let doc = Document::parse(html).unwrap();

        let links: Vec<_> = doc.links().collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].attrs.get("rel"), Some("modulepreload"));
        assert!(html[links[0].span.clone()].starts_with("<link"));
        assert!(html[links[0].span.clone()].ends_with("/>"));

        let scripts: Vec<_> = doc.scripts().collect();
        assert_eq!(scripts.len(), 2);
        assert_eq!(
            scripts[0].attrs.get("src"),
            Some("/_next/static/chunks/main.js")
        );
        assert!(scripts[0].attrs.has("async"));
        assert_eq!(scripts[1].body, r#"self.__next_f.push([1,"x"])"#);
        assert!(html[scripts[1].span.clone()].ends_with("</script>"));

        let body_close = doc.body_close.unwrap();
        assert!(html[body_close..].starts_with("</body>"));
    }

    #[test]
    fn test_comments_hide_elements() {
        let html = "<body><!-- <script src=\"/_next/x.js\"></script> --></body>";
        let doc = Document::parse(html).unwrap();
        assert_eq!(doc.elements.len(), 0);
    }

    #[test]
    fn test_script_body_may_contain_markup() {
        let html = "<body><script>document.write('<div></body>')</script></BODY>";
        let doc = Document::parse(html).unwrap();
        assert_eq!(doc.scripts().count(), 1);
        assert!(html[doc.body_close.unwrap()..].starts_with("</BODY>"));
    }

    #[test]
    fn test_attribute_forms() {
        let html = r#"<script type='application/ld+json' data-x=plain defer id = "a>b">{}</script>"#;
        let doc = Document::parse(html).unwrap();
        let attrs = &doc.elements[0].attrs;
        assert_eq!(attrs.get("type"), Some("application/ld+json"));
        assert_eq!(attrs.get("data-x"), Some("plain"));
        assert_eq!(attrs.get("defer"), Some(""));
        assert_eq!(attrs.get("id"), Some("a>b"));
        assert_eq!(doc.elements[0].body, "{}");
    }

    #[test]
    fn test_uppercase_tags() {
        let html = r#"<SCRIPT SRC="/x.js"></SCRIPT><LINK REL="preload" HREF="/y.js">"#;
        let doc = Document::parse(html).unwrap();
        assert_eq!(doc.scripts().count(), 1);
        assert_eq!(doc.links().next().unwrap().attrs.get("href"), Some("/y.js"));
    }

    #[test]
    fn test_unclosed_script_is_malformed() {
        let err = Document::parse("<body><script>var a = 1;</body>").unwrap_err();
        assert_eq!(err.reason, "script element is never closed");
    }

    #[test]
    fn test_unterminated_tag_is_malformed() {
        assert!(Document::parse("<html><body><link rel=\"preload\"").is_err());
        assert!(Document::parse("<p>ok</p><!-- dangling").is_err());
    }

    #[test]
    fn test_stray_angle_brackets_are_text() {
        let doc = Document::parse("<p>1 < 2 and 3 > 2</p><title>a < b</title>").unwrap();
        assert!(doc.elements.is_empty());
    }

    #[test]
    fn test_style_body_is_skipped() {
        let doc = Document::parse("<style>a::after{content:'<link rel=x>'}</style>").unwrap();
        assert!(doc.elements.is_empty());
    }
}
