//! Term id derivation from localized course-list headings.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static TERM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[（(]\s*(Spring|Summer|Fall|Winter)\s+([0-9]{4})\s*[）)]")
        .expect("static regex is valid")
});

/// Derives a compact term id such as `25spring` from a term heading.
///
/// The heading must contain `（Season Year）` with full-width or ASCII
/// parentheses. Any other heading is returned trimmed but otherwise unchanged.
#[must_use]
pub fn term_id_from_heading(heading: &str) -> String {
    let heading = heading.trim();
    let Some(caps) = TERM_PATTERN.captures(heading) else {
        return heading.to_string();
    };
    let season = caps[1].to_lowercase();
    let year = &caps[2];
    format!("{}{season}", &year[year.len() - 2..])
}
