//! Text helpers shared by the portal parsers.

use scraper::ElementRef;
use scraper::node::Node;
use url::Url;

/// Texts with fewer meaningful characters than this are treated as layout noise.
pub const MIN_MEANINGFUL_CHARS: usize = 10;

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section", "table",
    "td", "th", "tr", "ul",
];

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Collapses whitespace inside each line and drops blank lines.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Counts alphanumeric and CJK characters.
#[must_use]
pub fn meaningful_char_count(text: &str) -> usize {
    text.chars()
        .filter(|&c| c.is_alphanumeric() || is_cjk(c))
        .count()
}

/// Whether `text` carries enough content to keep.
#[must_use]
pub fn is_meaningful_text(text: &str) -> bool {
    meaningful_char_count(text) >= MIN_MEANINGFUL_CHARS
}

/// Resolves `href` against `base`. Empty hrefs yield `None`.
#[must_use]
pub fn absolutize(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// Text of an element on a single line, whitespace collapsed.
#[must_use]
pub fn inline_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of an element with `<br>` and block boundaries turned into line
/// breaks, then passed through [`normalize_text`].
#[must_use]
pub fn block_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_block_text(element, &mut raw);
    normalize_text(&raw)
}

fn collect_block_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                let is_block = BLOCK_ELEMENTS.contains(&name);
                if is_block {
                    out.push('\n');
                }
                collect_block_text(child_element, out);
                if is_block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn is_cjk(c: char) -> bool {
    matches!(
        u32::from(c),
        0x3040..=0x30FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xAC00..=0xD7AF
            | 0xF900..=0xFAFF
            | 0x20000..=0x2A6DF
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use scraper::{Html, Selector};

    use super::*;

    #[test]
    fn test_normalize_text_collapses_and_drops_blank_lines() {
        let raw = "  Week 1 \t slides \n\n   \n  read   chapter 2  ";
        assert_eq!(normalize_text(raw), "Week 1 slides\nread chapter 2");
    }

    #[test]
    fn test_meaningful_char_count_ignores_punctuation() {
        assert_eq!(meaningful_char_count("-- | -- ..."), 0);
        assert_eq!(meaningful_char_count("ab 12"), 4);
        assert_eq!(meaningful_char_count("第一周：课件"), 5);
    }

    #[test]
    fn test_is_meaningful_text_threshold() {
        assert!(!is_meaningful_text("123456789"));
        assert!(is_meaningful_text("1234567890"));
        assert!(is_meaningful_text("请在周五之前提交第一次作业"));
        assert!(!is_meaningful_text("&nbsp; • • •"));
    }

    #[test]
    fn test_absolutize_relative_and_absolute() {
        let base = Url::parse("https://bb.example.edu/webapps/x/page").unwrap();
        assert_eq!(
            absolutize(&base, "/bbcswebdav/a.pdf").as_deref(),
            Some("https://bb.example.edu/bbcswebdav/a.pdf")
        );
        assert_eq!(
            absolutize(&base, "https://cdn.example.edu/b.pdf").as_deref(),
            Some("https://cdn.example.edu/b.pdf")
        );
        assert_eq!(absolutize(&base, "   "), None);
    }

    #[test]
    fn test_block_text_breaks_on_br_and_blocks() {
        let html = Html::parse_fragment(
            "<div id='t'><p>Line one</p>second<br>third <b>bold</b><ul><li>a</li><li>b</li></ul>\
             <script>ignored()</script></div>",
        );
        let selector = Selector::parse("#t").unwrap();
        let element = html.select(&selector).next().unwrap();
        assert_eq!(block_text(element), "Line one\nsecond\nthird bold\na\nb");
    }

    #[test]
    fn test_inline_text_single_line() {
        let html = Html::parse_fragment("<h3 id='h'>\n  Week\n  1 <span>Slides</span> </h3>");
        let selector = Selector::parse("#h").unwrap();
        let element = html.select(&selector).next().unwrap();
        assert_eq!(inline_text(element), "Week 1 Slides");
    }
}
