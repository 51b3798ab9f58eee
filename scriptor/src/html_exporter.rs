//! HTML exporter
//!
//! Writes the rendered document to a standalone `.html` file. The output is
//! the same document the PDF service receives, so printing it from a
//! browser gives the same pagination.

use crate::document_model::Document;
use crate::geometry::PageGeometry;
use crate::renderer::{render_with_geometry, ExportTarget};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing an export file
#[derive(Error, Debug)]
pub enum ExportFileError {
    #[error("Failed to write {path}: {source}", path = .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Export a document to HTML format
///
/// # Parameters
/// * `doc` - The flushed document to export
/// * `geometry` - Page geometry for the print stylesheet
/// * `output_path` - Path where the HTML file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to HTML
/// * `Err(ExportFileError)` - Error writing the file
pub fn to_html(
    doc: &Document,
    geometry: &PageGeometry,
    output_path: &Path,
) -> Result<(), ExportFileError> {
    let html = render_with_geometry(doc, ExportTarget::Pdf, geometry);
    write_output(output_path, &html)
}

/// Write an export file, creating parent directories if they don't exist
pub fn write_output(output_path: &Path, content: &str) -> Result<(), ExportFileError> {
    let wrap = |source| ExportFileError::Write {
        path: output_path.to_path_buf(),
        source,
    };

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
    }
    let mut file = fs::File::create(output_path).map_err(wrap)?;
    file.write_all(content.as_bytes()).map_err(wrap)?;

    log::info!(
        "Wrote {} ({} bytes)",
        output_path.display(),
        content.len()
    );
    Ok(())
}
