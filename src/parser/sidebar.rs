//! Course navigation menu parser.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use super::text::{absolutize, inline_text};
use crate::endpoints::announcements_url_for;

/// Selector contract for the course menu.
///
/// The menu is `ul#courseMenuPalette_contents`; only its direct `li`
/// children are scanned. An `h3` inside an item starts a category, and an
/// item's first `a[href]` is its link.
struct SidebarSelectors {
    menu: Selector,
    heading: Selector,
    link: Selector,
}

#[allow(clippy::expect_used)]
static SELECTORS: LazyLock<SidebarSelectors> = LazyLock::new(|| {
    let parse = |s: &str| Selector::parse(s).expect("static selector is valid");
    SidebarSelectors {
        menu: parse("ul#courseMenuPalette_contents"),
        heading: parse("h3"),
        link: parse("a[href]"),
    }
});

#[allow(clippy::expect_used)]
static COURSE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"course_id=(_\d+_\d+)").expect("static regex is valid"));

const ANNOUNCEMENTS_TITLE: &str = "Announcements";

/// A titled link to a content page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Menu label.
    pub title: String,
    /// Absolute target URL.
    pub url: String,
}

/// A menu heading and the links under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarCategory {
    /// Heading text.
    pub title: String,
    /// Links in menu order.
    pub links: Vec<Link>,
}

/// Parsed course menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sidebar {
    /// Links that precede any heading, or follow an empty one.
    pub top_level: Vec<Link>,
    /// Categories in menu order.
    pub categories: Vec<SidebarCategory>,
}

impl Sidebar {
    /// Category named `title`.
    #[must_use]
    pub fn category(&self, title: &str) -> Option<&SidebarCategory> {
        self.categories.iter().find(|c| c.title == title)
    }

    /// Total number of links, top level included.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.top_level.len() + self.categories.iter().map(|c| c.links.len()).sum::<usize>()
    }

    /// Whether the menu had no links at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.link_count() == 0
    }

    /// Index of the category titled `title`, created when new.
    fn category_index(&mut self, title: String) -> usize {
        if let Some(index) = self.categories.iter().position(|c| c.title == title) {
            return index;
        }
        self.categories.push(SidebarCategory {
            title,
            links: Vec::new(),
        });
        self.categories.len() - 1
    }
}

/// Parses a course entry page into its navigation menu.
///
/// A page without the menu container yields an empty sidebar.
#[must_use]
pub fn parse_sidebar(html: &str, base: &Url) -> Sidebar {
    let document = Html::parse_document(html);
    let mut sidebar = Sidebar::default();

    let Some(menu) = document.select(&SELECTORS.menu).next() else {
        return sidebar;
    };
    let course_id = COURSE_ID
        .captures(html)
        .map(|caps| caps[1].to_string());

    let mut current: Option<usize> = None;
    for item in menu
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "li")
    {
        if let Some(heading) = item.select(&SELECTORS.heading).next() {
            let title = inline_text(heading);
            current = if title.is_empty() {
                None
            } else {
                Some(sidebar.category_index(title))
            };
            continue;
        }

        let Some(anchor) = item.select(&SELECTORS.link).next() else {
            continue;
        };
        let title = inline_text(anchor);
        let Some(mut url) = anchor.value().attr("href").and_then(|h| absolutize(base, h)) else {
            continue;
        };
        if title.contains(ANNOUNCEMENTS_TITLE)
            && let Some(course_id) = &course_id
        {
            url = announcements_url_for(base, course_id).to_string();
        }

        let link = Link { title, url };
        match current {
            Some(index) => sidebar.categories[index].links.push(link),
            None => sidebar.top_level.push(link),
        }
    }

    sidebar
}
