//! Content page parser: one [`PageSection`] per content item with files.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use super::text::{absolutize, block_text, inline_text, is_meaningful_text};

/// Selector contract for content pages.
///
/// | field        | selector                               |
/// |--------------|----------------------------------------|
/// | `item`       | `li.clearfix.liItem`                   |
/// | `heading`    | `h3` (required per item)               |
/// | `body`       | `div.details div.vtbegenerated`        |
/// | `attachment` | `div.details ul.attachments a[href]`   |
/// | `title_link` | `h3 a[href]`, used without attachments |
struct PageSelectors {
    item: Selector,
    heading: Selector,
    body: Selector,
    attachment: Selector,
    title_link: Selector,
}

#[allow(clippy::expect_used)]
static SELECTORS: LazyLock<PageSelectors> = LazyLock::new(|| {
    let parse = |s: &str| Selector::parse(s).expect("static selector is valid");
    PageSelectors {
        item: parse("li.clearfix.liItem"),
        heading: parse("h3"),
        body: parse("div.details div.vtbegenerated"),
        attachment: parse("div.details ul.attachments a[href]"),
        title_link: parse("h3 a[href]"),
    }
});

/// A downloadable attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLink {
    /// Display name, used as the local file name.
    pub name: String,
    /// Absolute download URL.
    pub url: String,
}

/// A named content block with at least one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSection {
    /// Item heading.
    pub title: String,
    /// Description text; empty when the block held only layout noise.
    pub text: String,
    /// Attachments, never empty.
    pub files: Vec<FileLink>,
}

/// Parses a content page. Items without a heading or without files are dropped.
#[must_use]
pub fn parse_page(html: &str, base: &Url) -> Vec<PageSection> {
    let document = Html::parse_document(html);
    document
        .select(&SELECTORS.item)
        .filter_map(|item| parse_item(item, base))
        .collect()
}

fn parse_item(item: ElementRef<'_>, base: &Url) -> Option<PageSection> {
    let heading = item.select(&SELECTORS.heading).next()?;
    let title = inline_text(heading);

    let mut files: Vec<FileLink> = item
        .select(&SELECTORS.attachment)
        .filter_map(|anchor| file_link(anchor, None, base))
        .collect();
    if files.is_empty() && item.select(&SELECTORS.attachment).next().is_none() {
        files = item
            .select(&SELECTORS.title_link)
            .take(1)
            .filter_map(|anchor| file_link(anchor, Some(&title), base))
            .collect();
    }
    if files.is_empty() {
        return None;
    }

    let text = item
        .select(&SELECTORS.body)
        .map(block_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let text = if is_meaningful_text(&text) {
        text
    } else {
        String::new()
    };

    Some(PageSection { title, text, files })
}

fn file_link(anchor: ElementRef<'_>, name: Option<&str>, base: &Url) -> Option<FileLink> {
    let href = anchor.value().attr("href")?.trim();
    if href.starts_with('#') || href.contains("close") {
        return None;
    }
    let name = name.map_or_else(|| inline_text(anchor), str::to_string);
    if name.is_empty() {
        return None;
    }
    let url = absolutize(base, href)?;
    Some(FileLink { name, url })
}
