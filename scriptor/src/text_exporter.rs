//! Plain text exporter
//!
//! Renders the body HTML as wrapped plain text with `html2text`.

use crate::document_model::Document;
use crate::html_exporter::{write_output, ExportFileError};
use crate::renderer::render_body;
use std::path::Path;

/// Line width of the text output
pub const TEXT_WIDTH: usize = 80;

/// Convert a document to plain text
pub fn text_string(doc: &Document) -> String {
    html2text::from_read(render_body(doc).as_bytes(), TEXT_WIDTH)
}

/// Export a document to a plain text file
pub fn to_text(doc: &Document, output_path: &Path) -> Result<(), ExportFileError> {
    write_output(output_path, &text_string(doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_output() {
        let mut doc = Document::new("Plain", "");
        doc.structure = vec!["One".to_string()];
        doc.contents.clear();
        doc.set_content("One", "<p>Some <em>plain</em> text &amp; more</p>".to_string());

        let text = text_string(&doc);
        assert!(text.contains("Plain"));
        assert!(text.contains("text & more"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_lines_are_wrapped() {
        let mut doc = Document::new("Wrap", "");
        doc.structure = vec!["Long".to_string()];
        doc.contents.clear();
        doc.set_content("Long", format!("<p>{}</p>", "word ".repeat(60)));

        let text = text_string(&doc);
        assert!(text.lines().all(|line| line.chars().count() <= TEXT_WIDTH));
    }

    #[test]
    fn test_to_text_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.txt");
        to_text(&Document::new("T", ""), &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains('T'));
    }
}
