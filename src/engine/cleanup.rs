//! Cleanup of machine-extracted text.
//!
//! The PDF text layer and external converters emit CRLF line endings,
//! trailing spaces, runs of blank lines from layout gaps, form feeds at page
//! breaks, and zero-width characters. These rules remove that noise without
//! touching content. Uploaded text and Markdown files never pass through
//! here.
//!
//! Rules run in order: line endings first so the per-line rules see `\n`
//! only, invisible characters before blank-line collapsing so lines that
//! held nothing but a zero-width space count as blank.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules.
///
/// 1. Normalise line endings (CRLF/CR → LF) and drop form feeds
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line
/// 4. Collapse 3+ consecutive blank lines down to 2
/// 5. Trim leading and trailing blank lines
pub fn clean_extracted_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    s.trim_matches('\n').to_string()
}

fn normalise_line_endings(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{000C}', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings_and_form_feeds() {
        assert_eq!(normalise_line_endings("a\r\nb\rc\u{000C}d"), "a\nb\nc\nd");
    }

    #[test]
    fn trailing_whitespace() {
        assert_eq!(trim_trailing_whitespace("  x   \ny\t"), "  x\ny");
    }

    #[test]
    fn blank_runs_collapse() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn invisible_only_line_becomes_blank() {
        let out = clean_extracted_text("a\n\u{200B}\n\n\n\nb");
        assert_eq!(out, "a\n\n\nb");
    }

    #[test]
    fn full_pipeline() {
        let raw = "\r\n\r\nTitle  \r\n\r\n\r\n\r\n\r\nBody\u{00AD}text \r\n\u{000C}";
        assert_eq!(clean_extracted_text(raw), "Title\n\n\nBodytext");
    }
}
