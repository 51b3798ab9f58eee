//! Markdown exporter
//!
//! Converts the rendered body (title, subtitle, one heading per section)
//! to Markdown with `html2md`. The stylesheet and pagination markers are
//! left out since Markdown has no use for them.

use crate::document_model::Document;
use crate::html_exporter::{write_output, ExportFileError};
use crate::renderer::render_body;
use std::path::Path;

/// Convert a document to a Markdown string
pub fn markdown_string(doc: &Document) -> String {
    let mut markdown = html2md::parse_html(&render_body(doc));
    if !markdown.ends_with('\n') {
        markdown.push('\n');
    }
    markdown
}

/// Export a document to markdown format
///
/// # Parameters
/// * `doc` - The flushed document to export
/// * `output_path` - Path where the markdown file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to markdown
/// * `Err(ExportFileError)` - Error writing the file
pub fn to_markdown(doc: &Document, output_path: &Path) -> Result<(), ExportFileError> {
    write_output(output_path, &markdown_string(doc))
}
