//! Backends for formats that are already text.

use super::{ConvertedDocument, DocumentFormat};
use crate::error::ConvertError;
use std::path::Path;

const UTF8_BOM: char = '\u{FEFF}';

/// Read a UTF-8 text or Markdown file and pass it through unchanged.
///
/// A leading byte-order mark is dropped; nothing else is touched.
pub async fn read_text(path: &Path, format: DocumentFormat) -> Result<ConvertedDocument, ConvertError> {
    let bytes = tokio::fs::read(path).await?;
    let text = decode_utf8(bytes)?;
    Ok(ConvertedDocument::single(format, text))
}

/// Read a delimited file and render it as a GFM table.
///
/// The first record is the header row. Ragged rows are padded to the widest
/// record. An empty file yields an empty document.
pub async fn read_delimited(
    path: &Path,
    delimiter: u8,
    format: DocumentFormat,
) -> Result<ConvertedDocument, ConvertError> {
    let bytes = tokio::fs::read(path).await?;
    let text = decode_utf8(bytes)?;
    let markdown = delimited_to_markdown(&text, delimiter).map_err(|e| ConvertError::CorruptDocument {
        format: format.to_string(),
        detail: e.to_string(),
    })?;
    Ok(ConvertedDocument::single(format, markdown))
}

fn decode_utf8(bytes: Vec<u8>) -> Result<String, ConvertError> {
    let text = String::from_utf8(bytes).map_err(|e| ConvertError::InvalidEncoding {
        detail: e.utf8_error().to_string(),
    })?;
    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

/// Render delimited records as a Markdown table.
pub fn delimited_to_markdown(input: &str, delimiter: u8) -> Result<String, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(escape_cell).collect());
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Ok(String::new());
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        let mut cells = row.clone();
        cells.resize(width, String::new());
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            let sep: Vec<&str> = std::iter::repeat_n("---", width).collect();
            lines.push(format!("| {} |", sep.join(" | ")));
        }
    }
    Ok(lines.join("\n"))
}

fn escape_cell(cell: &str) -> String {
    cell.trim()
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_to_table() {
        let md = delimited_to_markdown("name,qty\napple,3\npear,10\n", b',').unwrap();
        assert_eq!(
            md,
            "| name | qty |\n| --- | --- |\n| apple | 3 |\n| pear | 10 |"
        );
    }

    #[test]
    fn ragged_rows_are_padded() {
        let md = delimited_to_markdown("a\tb\tc\n1\n", b'\t').unwrap();
        assert_eq!(md, "| a | b | c |\n| --- | --- | --- |\n| 1 |  |  |");
    }

    #[test]
    fn pipes_and_newlines_escaped() {
        let md = delimited_to_markdown("h\n\"x|y\nz\"\n", b',').unwrap();
        assert!(md.contains("x\\|y<br>z"), "got: {md}");
    }

    #[test]
    fn empty_input_is_empty_table() {
        assert_eq!(delimited_to_markdown("", b',').unwrap(), "");
    }

    #[test]
    fn bom_is_stripped() {
        let mut bytes = "\u{FEFF}".as_bytes().to_vec();
        bytes.extend_from_slice(b"hello");
        assert_eq!(decode_utf8(bytes).unwrap(), "hello");
    }

    #[tokio::test]
    async fn text_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "hello\n\n\n\n  world  ").unwrap();

        let doc = read_text(&path, DocumentFormat::Text).await.unwrap();
        assert_eq!(doc.pages, vec!["hello\n\n\n\n  world  ".to_string()]);
    }

    #[tokio::test]
    async fn invalid_utf8_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.txt");
        std::fs::write(&path, [0x66, 0x6f, 0xff, 0xfe]).unwrap();

        let err = read_text(&path, DocumentFormat::Text).await.unwrap_err();
        assert!(matches!(err, ConvertError::InvalidEncoding { .. }), "got: {err:?}");
        assert!(err.to_string().contains("invalid utf-8"), "got: {err}");
    }
}
