//! Course catalog parser for the portal's "My Courses" module.
//!
//! The module arrives as an XML envelope whose CDATA section holds an HTML
//! fragment: one heading per term, each followed by a list of courses.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::error::ParseError;
use super::term::term_id_from_heading;
use super::text::{absolutize, inline_text};

/// Selector contract for the course-list fragment.
///
/// | field           | selector                          |
/// |-----------------|-----------------------------------|
/// | `term_heading`  | `h3.termHeading-coursefakeclass`  |
/// | `anchor_with_id`| `a[id]` inside the heading        |
/// | `any_with_id`   | `[id]`, container lookup          |
/// | `course_item`   | `li` inside the term container    |
/// | `link`          | `a[href]`                         |
/// | `data_block`    | `div.courseDataBlock`             |
/// | `data_label`    | `span.dataBlockLabel`             |
struct CourseListSelectors {
    term_heading: Selector,
    anchor_with_id: Selector,
    any_with_id: Selector,
    course_item: Selector,
    link: Selector,
    data_block: Selector,
    data_label: Selector,
}

#[allow(clippy::expect_used)]
static SELECTORS: LazyLock<CourseListSelectors> = LazyLock::new(|| {
    let parse = |s: &str| Selector::parse(s).expect("static selector is valid");
    CourseListSelectors {
        term_heading: parse("h3.termHeading-coursefakeclass"),
        anchor_with_id: parse("a[id]"),
        any_with_id: parse("[id]"),
        course_item: parse("li"),
        link: parse("a[href]"),
        data_block: parse("div.courseDataBlock"),
        data_label: parse("span.dataBlockLabel"),
    }
});

#[allow(clippy::expect_used)]
static TERM_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"termCourses_+\d+_\d+").expect("static regex is valid"));

/// Prefix the portal puts in front of the anchor id to form the container id.
const CONTAINER_ID_PREFIX: &str = "_3_1";

/// Latest announcement shown next to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    /// Announcement title or text.
    pub content: String,
    /// Absolute link, when the block carries one.
    pub url: Option<String>,
}

/// One enrolled course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    /// Display name, trimmed.
    pub name: String,
    /// Absolute course entry URL.
    pub url: String,
    /// Latest announcement, if any.
    pub announcement: Option<Announcement>,
}

/// Courses of one term, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCourses {
    /// Normalized id such as `25spring`, or the raw heading.
    pub id: String,
    /// Heading text as shown by the portal.
    pub heading: String,
    /// Courses in document order.
    pub courses: Vec<Course>,
}

/// Ordered mapping from term id to courses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoursesByTerm {
    terms: Vec<TermCourses>,
}

impl CoursesByTerm {
    /// Courses of `term_id`, if present.
    #[must_use]
    pub fn get(&self, term_id: &str) -> Option<&[Course]> {
        self.terms
            .iter()
            .find(|t| t.id == term_id)
            .map(|t| t.courses.as_slice())
    }

    /// Whether `term_id` is present.
    #[must_use]
    pub fn contains(&self, term_id: &str) -> bool {
        self.terms.iter().any(|t| t.id == term_id)
    }

    /// Terms in document order.
    pub fn iter(&self) -> impl Iterator<Item = &TermCourses> {
        self.terms.iter()
    }

    /// Term ids in document order.
    pub fn term_ids(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.id.as_str())
    }

    /// Number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no term was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn entry(&mut self, id: String, heading: String) -> &mut TermCourses {
        let index = match self.terms.iter().position(|t| t.id == id) {
            Some(index) => index,
            None => {
                self.terms.push(TermCourses {
                    id,
                    heading,
                    courses: Vec::new(),
                });
                self.terms.len() - 1
            }
        };
        &mut self.terms[index]
    }
}

/// Parses the course-list XML envelope.
///
/// A malformed envelope or empty payload yields an empty catalog.
#[must_use]
pub fn parse_course_list(xml: &str, base: &Url) -> CoursesByTerm {
    match extract_payload(xml) {
        Ok(html) => parse_course_list_html(&html, base),
        Err(error) => {
            warn!(scope = "course", %error, "course list envelope unreadable");
            CoursesByTerm::default()
        }
    }
}

/// Parses the HTML fragment carried by the course-list envelope.
#[must_use]
pub fn parse_course_list_html(html: &str, base: &Url) -> CoursesByTerm {
    let document = Html::parse_fragment(html);
    let mut catalog = CoursesByTerm::default();

    for heading in document.select(&SELECTORS.term_heading) {
        let heading_text = inline_text(heading);
        let id = term_id_from_heading(&heading_text);

        let Some(container) = term_container(&document, heading) else {
            debug!(scope = "course", term = %id, "term has no course container");
            catalog.entry(id, heading_text);
            continue;
        };

        let courses: Vec<Course> = container
            .select(&SELECTORS.course_item)
            .filter_map(|item| parse_course_item(item, base))
            .collect();
        debug!(scope = "course", term = %id, courses = courses.len(), "parsed term");
        catalog.entry(id, heading_text).courses.extend(courses);
    }

    catalog
}

/// Concatenates the CDATA and text payload of the envelope.
pub(crate) fn extract_payload(xml: &str) -> Result<String, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut payload = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::CData(data)) => {
                payload.push_str(&String::from_utf8_lossy(&data.into_inner()));
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParseError::envelope(position(&reader), e))?;
                payload.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::envelope(position(&reader), e)),
            _ => {}
        }
        buf.clear();
    }

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(ParseError::EmptyPayload);
    }
    Ok(payload.to_string())
}

fn position(reader: &Reader<&[u8]>) -> u64 {
    u64::try_from(reader.buffer_position()).unwrap_or_default()
}

/// Resolves the list container belonging to a term heading.
fn term_container<'a>(document: &'a Html, heading: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let by_anchor = heading
        .select(&SELECTORS.anchor_with_id)
        .filter_map(|anchor| anchor.value().id())
        .find_map(|id| TERM_ANCHOR.find(id))
        .map(|m| format!("{CONTAINER_ID_PREFIX}{}", m.as_str()))
        .and_then(|container_id| {
            document
                .select(&SELECTORS.any_with_id)
                .find(|el| el.value().id() == Some(container_id.as_str()))
        });

    by_anchor.or_else(|| heading.next_siblings().find_map(ElementRef::wrap))
}

fn parse_course_item(item: ElementRef<'_>, base: &Url) -> Option<Course> {
    let link = item.select(&SELECTORS.link).next()?;
    let href = link.value().attr("href")?;
    if href.contains("announcement") {
        return None;
    }

    let name = inline_text(link);
    let url = absolutize(base, href)?;
    if name.is_empty() {
        return None;
    }

    let announcement = item
        .select(&SELECTORS.data_block)
        .next()
        .and_then(|block| parse_announcement(block, base));

    Some(Course {
        name,
        url,
        announcement,
    })
}

fn parse_announcement(block: ElementRef<'_>, base: &Url) -> Option<Announcement> {
    if let Some(link) = block.select(&SELECTORS.link).last() {
        let content = inline_text(link);
        let url = link.value().attr("href").and_then(|h| absolutize(base, h));
        return (!content.is_empty() || url.is_some()).then_some(Announcement { content, url });
    }

    let text = inline_text(block);
    let label = block
        .select(&SELECTORS.data_label)
        .next()
        .map(inline_text)
        .unwrap_or_default();
    let content = text
        .strip_prefix(label.as_str())
        .unwrap_or(&text)
        .trim()
        .to_string();
    (!content.is_empty()).then_some(Announcement { content, url: None })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://bb.example.edu").unwrap()
    }

    fn envelope(html: &str) -> String {
        format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?><contents><![CDATA[{html}]]></contents>")
    }

    const FRAGMENT: &str = r##"
<h3 class="termHeading-coursefakeclass"><a id="termCourses__254_1" href="#">（Fall 2024）</a></h3>
<div id="_3_1termCourses__254_1">
  <ul class="portletList-img courseListing coursefakeclass">
    <li>
      <a href=" /webapps/blackboard/execute/launcher?type=Course&amp;id=_100_1&amp;url=" target="_top">CS101 Intro to Programming</a>
      <div class="courseDataBlock">
        <span class="dataBlockLabel">公告:</span>
        <a href="/webapps/blackboard/execute/announcement?course_id=_100_1">Midterm moved</a>
      </div>
    </li>
    <li><a href="/webapps/blackboard/execute/announcement?method=search">All announcements</a></li>
    <li>No link here</li>
    <li>
      <a href="/webapps/blackboard/execute/launcher?type=Course&amp;id=_101_1">MA201 Linear Algebra</a>
      <div class="courseDataBlock"><span class="dataBlockLabel">公告:</span> Office hours cancelled</div>
    </li>
  </ul>
</div>
<h3 class="termHeading-coursefakeclass"><a id="termCourses__260_1" href="#">（Spring 2025）</a></h3>
<div id="_3_1termCourses__260_1">
  <ul><li><a href="/webapps/blackboard/execute/launcher?type=Course&amp;id=_200_1">PH110 Physics</a></li></ul>
</div>
"##;

    #[test]
    fn test_parse_course_list_terms_and_order() {
        let catalog = parse_course_list(&envelope(FRAGMENT), &base());
        assert_eq!(catalog.term_ids().collect::<Vec<_>>(), ["24fall", "25spring"]);

        let fall = catalog.get("24fall").unwrap();
        let names: Vec<_> = fall.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["CS101 Intro to Programming", "MA201 Linear Algebra"]);
        assert_eq!(
            fall[0].url,
            "https://bb.example.edu/webapps/blackboard/execute/launcher?type=Course&id=_100_1&url="
        );
    }

    #[test]
    fn test_parse_course_list_announcements() {
        let catalog = parse_course_list(&envelope(FRAGMENT), &base());
        let fall = catalog.get("24fall").unwrap();

        let linked = fall[0].announcement.as_ref().unwrap();
        assert_eq!(linked.content, "Midterm moved");
        assert_eq!(
            linked.url.as_deref(),
            Some("https://bb.example.edu/webapps/blackboard/execute/announcement?course_id=_100_1")
        );

        let plain = fall[1].announcement.as_ref().unwrap();
        assert_eq!(plain.content, "Office hours cancelled");
        assert_eq!(plain.url, None);

        assert_eq!(catalog.get("25spring").unwrap()[0].announcement, None);
    }

    #[test]
    fn test_container_falls_back_to_next_sibling() {
        let html = r#"
<h3 class="termHeading-coursefakeclass">Other Courses</h3>
<ul><li><a href="/course/a">Seminar</a></li></ul>
"#;
        let catalog = parse_course_list(&envelope(html), &base());
        assert_eq!(catalog.len(), 1);
        let courses = catalog.get("Other Courses").unwrap();
        assert_eq!(courses[0].name, "Seminar");
    }

    #[test]
    fn test_duplicate_term_ids_merge() {
        let html = r#"
<h3 class="termHeading-coursefakeclass">（Fall 2024）</h3>
<ul><li><a href="/a">First</a></li></ul>
<h3 class="termHeading-coursefakeclass">（Fall 2024）</h3>
<ul><li><a href="/b">Second</a></li></ul>
"#;
        let catalog = parse_course_list(&envelope(html), &base());
        assert_eq!(catalog.len(), 1);
        let names: Vec<_> = catalog
            .get("24fall")
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["First", "Second"]);
    }

    #[test]
    fn test_malformed_or_empty_envelope_yields_empty_catalog() {
        assert!(parse_course_list("<contents><![CDATA[", &base()).is_empty());
        assert!(parse_course_list("<contents></contents>", &base()).is_empty());
        assert!(parse_course_list("", &base()).is_empty());
    }

    #[test]
    fn test_extract_payload_reads_cdata() {
        let payload = extract_payload(&envelope("<h3>x</h3>")).unwrap();
        assert_eq!(payload, "<h3>x</h3>");
        assert!(matches!(
            extract_payload("<contents/>"),
            Err(ParseError::EmptyPayload)
        ));
    }
}
