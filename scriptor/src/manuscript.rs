//! Manuscript upload: DOCX file to section HTML
//!
//! Reads the main document part (`word/document.xml`) out of the DOCX zip
//! and converts its paragraphs into simple HTML. Heading and title styles
//! become `<h1>`..`<h6>`, everything else becomes `<p>`. Bold and italic
//! runs, line breaks and tabs are kept; images, tables and other
//! structure are reduced to their text.

use crate::html_tree::escape_text;
use crate::session::EditorSession;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::read::ZipArchive;

/// Main document part inside a DOCX archive
const DOCUMENT_PART: &str = "word/document.xml";

/// Errors that can occur while importing a manuscript
#[derive(Error, Debug)]
pub enum ManuscriptError {
    #[error("Only .docx files can be imported: {path}", path = .0.display())]
    NotDocx(PathBuf),

    #[error("Select a section before importing a manuscript")]
    NoActiveSection,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a valid DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("DOCX archive has no word/document.xml")]
    MissingDocumentPart,

    #[error("Malformed document XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Whether a path names a `.docx` file (extension compared case-insensitively)
pub fn is_docx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"))
}

/// Import a DOCX file into the open section
///
/// The converted HTML is appended to whatever the section already holds.
///
/// # Returns
/// * `Ok(String)` - The HTML that was appended
/// * `Err(ManuscriptError)` - No section open, not a DOCX, or unreadable file
pub fn import_manuscript(
    session: &mut EditorSession,
    path: &Path,
) -> Result<String, ManuscriptError> {
    if session.active_section().is_none() {
        return Err(ManuscriptError::NoActiveSection);
    }
    let html = docx_to_html(path)?;
    session.append(&html);
    log::info!(
        "Imported {} into '{}' ({} bytes of HTML)",
        path.display(),
        session.active_section().unwrap_or_default(),
        html.len()
    );
    Ok(html)
}

/// Convert a DOCX file to HTML
pub fn docx_to_html(path: &Path) -> Result<String, ManuscriptError> {
    if !is_docx(path) {
        return Err(ManuscriptError::NotDocx(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut xml = String::new();
    match archive.by_name(DOCUMENT_PART) {
        Ok(mut part) => {
            part.read_to_string(&mut xml)?;
        }
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(ManuscriptError::MissingDocumentPart)
        }
        Err(e) => return Err(e.into()),
    }

    document_xml_to_html(&xml)
}

/// Convert WordprocessingML body XML to HTML
///
/// # Returns
/// * `Ok(String)` - One block element per non-empty paragraph
/// * `Err(ManuscriptError::Xml)` - The part is not well-formed XML
pub fn document_xml_to_html(xml: &str) -> Result<String, ManuscriptError> {
    let mut reader = Reader::from_str(xml);
    // Runs carry significant spaces (xml:space="preserve")
    reader.trim_text(false);

    let mut walker = BodyWalker::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => walker.start(&e),
            Event::Empty(e) => walker.empty(&e),
            Event::Text(e) => {
                if walker.in_text {
                    walker.text(&e.unescape()?);
                }
            }
            Event::End(e) => walker.end(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(walker.html)
}

/// Paragraph being collected
#[derive(Debug)]
struct Paragraph {
    tag: String,
    inner: String,
    has_text: bool,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self {
            tag: "p".to_string(),
            inner: String::new(),
            has_text: false,
        }
    }
}

/// Run being collected
#[derive(Debug, Default)]
struct Run {
    bold: bool,
    italic: bool,
    content: String,
}

/// State carried across the XML events of the document body
#[derive(Debug, Default)]
struct BodyWalker {
    html: String,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_paragraph_props: bool,
    in_run_props: bool,
    in_text: bool,
}

impl BodyWalker {
    fn start(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:p" => self.paragraph = Some(Paragraph::default()),
            b"w:pPr" => self.in_paragraph_props = true,
            b"w:r" if self.paragraph.is_some() => self.run = Some(Run::default()),
            b"w:rPr" => self.in_run_props = true,
            b"w:t" => self.in_text = self.run.is_some(),
            _ => self.empty(e),
        }
    }

    /// Self-closing elements, and properties written with an end tag
    fn empty(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:pStyle" if self.in_paragraph_props => {
                if let (Some(paragraph), Some(style)) = (&mut self.paragraph, get_attr(e, b"w:val")) {
                    paragraph.tag = block_tag(&style);
                }
            }
            b"w:b" if self.in_run_props => {
                if let Some(run) = &mut self.run {
                    run.bold = !check_val_off(e);
                }
            }
            b"w:i" if self.in_run_props => {
                if let Some(run) = &mut self.run {
                    run.italic = !check_val_off(e);
                }
            }
            b"w:tab" if !self.in_run_props => {
                if let Some(run) = &mut self.run {
                    run.content.push(' ');
                }
            }
            b"w:br" | b"w:cr" => {
                if let Some(run) = &mut self.run {
                    run.content.push_str("<br>");
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let (Some(paragraph), Some(run)) = (&mut self.paragraph, &mut self.run) {
            paragraph.has_text |= !text.trim().is_empty();
            run.content.push_str(&escape_text(text));
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:rPr" => self.in_run_props = false,
            b"w:pPr" => self.in_paragraph_props = false,
            b"w:r" => self.finish_run(),
            b"w:p" => self.finish_paragraph(),
            _ => {}
        }
    }

    fn finish_run(&mut self) {
        let (Some(run), Some(paragraph)) = (self.run.take(), &mut self.paragraph) else {
            return;
        };
        if run.content.is_empty() {
            return;
        }
        let mut content = run.content;
        if run.bold {
            content = format!("<strong>{}</strong>", content);
        }
        if run.italic {
            content = format!("<em>{}</em>", content);
        }
        paragraph.inner.push_str(&content);
    }

    fn finish_paragraph(&mut self) {
        self.run = None;
        if let Some(paragraph) = self.paragraph.take().filter(|p| p.has_text) {
            self.html
                .push_str(&format!("<{tag}>{}</{tag}>", paragraph.inner, tag = paragraph.tag));
        }
    }
}

/// Block element for a paragraph style (`Title`, `Heading1`..`Heading6`)
fn block_tag(style: &str) -> String {
    if style.eq_ignore_ascii_case("title") {
        return "h1".to_string();
    }
    let level = style
        .get(..7)
        .filter(|prefix| prefix.eq_ignore_ascii_case("heading"))
        .and_then(|_| style[7..].trim().parse::<u8>().ok())
        .filter(|level| (1..=6).contains(level));
    match level {
        Some(level) => format!("h{}", level),
        None => "p".to_string(),
    }
}

/// Extract an attribute value by its qualified name
fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(Result::ok)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Whether a toggle property (`<w:b w:val="0"/>`) is explicitly switched off
fn check_val_off(e: &BytesStart) -> bool {
    get_attr(e, b"w:val").is_some_and(|value| matches!(value.as_str(), "0" | "false" | "off"))
}
