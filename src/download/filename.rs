//! Path segment sanitization for the local vault.
//!
//! Every directory and file name derived from portal content passes through
//! [`sanitize_filename`] before it touches the filesystem.

use super::constants::MAX_SEGMENT_BYTES;

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turns arbitrary text into a single safe path segment.
///
/// - `<>:"/\|?*` and control characters `0x00..=0x1F` become `_`
/// - leading and trailing spaces and dots are trimmed
/// - an empty result becomes `_`
/// - reserved device names (`CON`, `COM1`, `lpt9.txt`, ...) gain a `_` prefix
/// - the result is cut to 255 bytes on a character boundary
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if u32::from(c) < 0x20 => '_',
            c => c,
        })
        .collect();

    let trimmed = trim_spaces_and_dots(&replaced);
    if trimmed.is_empty() {
        return "_".to_string();
    }

    let mut segment = if is_reserved_name(trimmed) {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    };

    truncate_on_char_boundary(&mut segment, MAX_SEGMENT_BYTES);
    segment
}

/// Appends ` (n)` to an already sanitized segment, shortening the stem so the
/// suffix survives the length cap.
#[must_use]
pub fn numbered_segment(segment: &str, n: usize) -> String {
    let suffix = format!(" ({n})");
    let mut stem = segment.to_string();
    truncate_on_char_boundary(&mut stem, MAX_SEGMENT_BYTES.saturating_sub(suffix.len()));
    stem.push_str(&suffix);
    stem
}

fn truncate_on_char_boundary(value: &mut String, max_bytes: usize) {
    if value.len() <= max_bytes {
        return;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value.truncate(end);
}

fn trim_spaces_and_dots(value: &str) -> &str {
    value.trim_matches(|c| c == ' ' || c == '.')
}

fn is_reserved_name(segment: &str) -> bool {
    let stem = segment.split('.').next().unwrap_or(segment).trim_end();
    RESERVED_NAMES
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_replaces_illegal_characters() {
        for c in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
            assert_eq!(sanitize_filename(&format!("a{c}b")), "a_b", "char {c:?}");
        }
    }

    #[test]
    fn test_sanitize_filename_replaces_control_range() {
        for code in 0x00u8..0x20 {
            let input = format!("a{}b", char::from(code));
            assert_eq!(sanitize_filename(&input), "a_b", "code {code:#04x}");
        }
    }

    #[test]
    fn test_sanitize_filename_prefixes_reserved_names() {
        assert_eq!(sanitize_filename("CON"), "_CON");
        assert_eq!(sanitize_filename("con"), "_con");
        assert_eq!(sanitize_filename("COM1"), "_COM1");
        assert_eq!(sanitize_filename("LPT9"), "_LPT9");
        assert_eq!(sanitize_filename("nul.txt"), "_nul.txt");
        assert_eq!(sanitize_filename("CONSOLE"), "CONSOLE");
        assert_eq!(sanitize_filename("COM10"), "COM10");
    }

    #[test]
    fn test_sanitize_filename_trims_spaces_and_dots() {
        assert_eq!(sanitize_filename("  name  "), "name");
        assert_eq!(sanitize_filename("..name.."), "name");
        assert_eq!(sanitize_filename(" .Lecture 1.pdf. "), "Lecture 1.pdf");
    }

    #[test]
    fn test_sanitize_filename_empty_results() {
        assert_eq!(sanitize_filename(""), "_");
        assert_eq!(sanitize_filename("..."), "_");
        assert_eq!(sanitize_filename("   "), "_");
    }

    #[test]
    fn test_sanitize_filename_truncates_to_255_chars() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_filename(&long).chars().count(), 255);
    }

    #[test]
    fn test_sanitize_filename_caps_multibyte_names_at_255_bytes() {
        let wide = sanitize_filename(&"课".repeat(120));
        assert_eq!(wide.len(), 255);
        assert_eq!(wide.chars().count(), 85);

        let mixed = sanitize_filename(&format!("a{}", "课".repeat(120)));
        assert!(mixed.len() <= 255);
        assert_eq!(mixed.chars().count(), 85);
        assert!(mixed.chars().all(|c| c == 'a' || c == '课'));
    }

    #[test]
    fn test_sanitize_filename_long_cjk_title_is_a_valid_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join(sanitize_filename(&"课".repeat(120)));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_numbered_segment_keeps_suffix_within_cap() {
        assert_eq!(numbered_segment("Week 1", 2), "Week 1 (2)");

        let long = sanitize_filename(&"课".repeat(120));
        let numbered = numbered_segment(&long, 3);
        assert!(numbered.len() <= 255);
        assert!(numbered.ends_with(" (3)"));
        assert_ne!(numbered, numbered_segment(&long, 4));
    }

    #[test]
    fn test_sanitize_filename_preserves_unicode_and_punctuation() {
        assert_eq!(sanitize_filename("第1周 课件 (PPT).pdf"), "第1周 课件 (PPT).pdf");
        assert_eq!(sanitize_filename("Lab_2-solutions.zip"), "Lab_2-solutions.zip");
    }
}
