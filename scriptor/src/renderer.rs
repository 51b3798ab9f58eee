//! Full-document HTML rendering
//!
//! Assembles the normalized HTML of every section into one self-contained
//! HTML document for a downstream renderer:
//! - Title (`<h1>`) and optional subtitle (`<h2>`) open the body
//! - One `<section class="chapter">` per section, in structure order
//! - A fixed stylesheet whose print media block breaks the page before every
//!   `<h1>` and carries the `@page` size/margin rule
//!
//! The DOCX converter does not reliably honor CSS break rules, so the `docx`
//! target additionally gets explicit page-break blocks around sections and a
//! break style stamped on each chapter heading.

use crate::document_model::Document;
use crate::geometry::PageGeometry;
use crate::html_tree::escape_html;
use crate::normalizer::normalize;

/// Title used when the document has none
pub const UNTITLED: &str = "Untitled Document";

/// Inline style forcing a page break before an element
pub const BREAK_BEFORE_STYLE: &str = "page-break-before: always; break-before: page;";

/// Inline style forcing a page break after an element
pub const BREAK_AFTER_STYLE: &str = "page-break-after: always; break-after: page;";

/// Content emitted for a section with no content
const EMPTY_SECTION: &str = "<p></p>";

const BASE_STYLES: &str = "\
body{font-family:'Merriweather',serif;font-size:12pt;line-height:1.5;}
h1,h2,h3{font-family:'Lato',sans-serif;}
img{max-width:100%;height:auto;}
p{margin:0 0 12pt;}
ul,ol{margin:0 0 12pt 24pt;}
li{margin:4pt 0;}
blockquote{margin:12pt 24pt;border-left:3px solid #ccc;padding-left:12pt;color:#555;}
pre,code{font-family:ui-monospace,SFMono-Regular,Menlo,Monaco,Consolas,'Liberation Mono','Courier New',monospace;}
pre{background:#f6f8fa;border:1px solid #e1e4e8;border-radius:4px;padding:8pt;overflow:auto;margin:0 0 12pt;}
table{border-collapse:collapse;margin:0 0 12pt;width:100%;}
th,td{border:1px solid #ddd;padding:6pt;}
";

const PRINT_STYLES: &str = "\
h1{break-before:page;page-break-before:always;margin-top:0;padding-top:0;}
body{font-size:12pt;line-height:1.5;word-spacing:normal;letter-spacing:normal;white-space:normal;}
p{margin:0 0 12pt;}
";

/// Downstream renderer a document is prepared for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// Headless-browser print to PDF (CSS pagination only)
    Pdf,
    /// HTML-to-DOCX conversion (CSS plus explicit break blocks)
    Docx,
}

impl ExportTarget {
    /// File extension of the exported artifact
    pub fn extension(self) -> &'static str {
        match self {
            ExportTarget::Pdf => "pdf",
            ExportTarget::Docx => "docx",
        }
    }

    /// MIME type of the exported artifact
    pub fn content_type(self) -> &'static str {
        match self {
            ExportTarget::Pdf => "application/pdf",
            ExportTarget::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl std::fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Render a document for `target` on a Letter page with 1in margins
pub fn render(document: &Document, target: ExportTarget) -> String {
    render_with_geometry(document, target, &PageGeometry::default())
}

/// Render a document for `target`
///
/// # Parameters
/// * `document` - Flushed document to render
/// * `target` - Downstream renderer
/// * `geometry` - Page size and margin for the `@page` rule
///
/// # Returns
/// * A complete HTML document string
pub fn render_with_geometry(
    document: &Document,
    target: ExportTarget,
    geometry: &PageGeometry,
) -> String {
    log::debug!(
        "Rendering {} section(s) for {}",
        document.structure.len(),
        target
    );

    let title = display_title(document);
    let mut output = String::new();
    output.push_str("<!doctype html><html><head>");
    output.push_str(&format!("<title>{}</title>", escape_html(title)));
    output.push_str(&stylesheet(geometry));
    output.push_str("</head><body>");
    write_body(&mut output, document, target);
    output.push_str("</body></html>");
    output
}

/// Render only the body content (title, subtitle and sections)
///
/// Used by the local exporters that convert HTML into another text format
/// and have no use for the stylesheet or pagination markers.
pub fn render_body(document: &Document) -> String {
    let mut output = String::new();
    write_body(&mut output, document, ExportTarget::Pdf);
    output
}

/// Title shown in the document, falling back to [`UNTITLED`]
pub fn display_title(document: &Document) -> &str {
    if document.title.trim().is_empty() {
        UNTITLED
    } else {
        &document.title
    }
}

/// The `<style>` block for a page geometry
pub fn stylesheet(geometry: &PageGeometry) -> String {
    format!(
        "<style>{}@media print{{{}{}}}</style>",
        BASE_STYLES,
        PRINT_STYLES,
        geometry.css_page_rule()
    )
}

fn write_body(output: &mut String, document: &Document, target: ExportTarget) {
    output.push_str(&format!("<h1>{}</h1>", escape_html(display_title(document))));
    if !document.subtitle.trim().is_empty() {
        output.push_str(&format!("<h2>{}</h2>", escape_html(&document.subtitle)));
    }

    let count = document.structure.len();
    for (idx, (name, html)) in document.sections().enumerate() {
        let first = idx == 0;
        let last = idx + 1 == count;
        let docx = target == ExportTarget::Docx;

        if docx && !first {
            output.push_str(&break_block(BREAK_BEFORE_STYLE));
        }

        output.push_str(if first {
            "<section class=\"chapter first\">"
        } else {
            "<section class=\"chapter\">"
        });
        if docx && !first {
            output.push_str(&format!(
                "<h1 class=\"chapter-title\" style=\"{}\">{}</h1>",
                BREAK_BEFORE_STYLE,
                escape_html(name)
            ));
        } else {
            output.push_str(&format!(
                "<h1 class=\"chapter-title\">{}</h1>",
                escape_html(name)
            ));
        }
        output.push_str(&section_html(html));
        output.push_str("</section>");

        if docx && !last {
            output.push_str(&break_block(BREAK_AFTER_STYLE));
        }
    }
}

fn section_html(raw: &str) -> String {
    if raw.trim().is_empty() {
        return EMPTY_SECTION.to_string();
    }
    let normalized = normalize(raw);
    if normalized.trim().is_empty() {
        EMPTY_SECTION.to_string()
    } else {
        normalized
    }
}

/// An empty block element carrying a page-break style
pub fn break_block(style: &str) -> String {
    format!("<div style=\"{}\"></div>", style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{resolve_geometry, CanvasPreset, CanvasSelection};

    fn document(names: &[&str]) -> Document {
        let mut document = Document::new("T", "");
        document.structure.clear();
        document.contents.clear();
        for name in names {
            document.set_content(name, format!("<p>{} text</p>", name));
        }
        document
    }

    #[test]
    fn test_render_wraps_title_and_sections() {
        let html = render(&document(&["A"]), ExportTarget::Pdf);
        assert!(html.starts_with("<!doctype html><html><head><title>T</title><style>"));
        assert!(html.contains("<body><h1>T</h1><section class=\"chapter first\">"));
        assert!(html.contains("<h1 class=\"chapter-title\">A</h1><p>A text</p></section>"));
        assert!(html.ends_with("</body></html>"));
    }

    #[test]
    fn test_subtitle_is_optional() {
        let mut doc = document(&["A"]);
        assert!(!render_body(&doc).contains("<h2>"));
        doc.subtitle = "Sub".to_string();
        assert!(render_body(&doc).starts_with("<h1>T</h1><h2>Sub</h2>"));
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let mut doc = document(&["A"]);
        doc.title = "  ".to_string();
        let html = render(&doc, ExportTarget::Pdf);
        assert!(html.contains("<title>Untitled Document</title>"));
    }

    #[test]
    fn test_titles_and_names_are_escaped() {
        let mut doc = document(&["Q&A <1>"]);
        doc.title = "Tom & Jerry".to_string();
        let body = render_body(&doc);
        assert!(body.contains("<h1>Tom &amp; Jerry</h1>"));
        assert!(body.contains(">Q&amp;A &lt;1&gt;</h1>"));
    }

    #[test]
    fn test_empty_section_gets_placeholder_paragraph() {
        let mut doc = document(&["A"]);
        doc.set_content("A", String::new());
        assert!(render_body(&doc).contains("<h1 class=\"chapter-title\">A</h1><p></p></section>"));
    }

    #[test]
    fn test_pdf_has_no_explicit_break_blocks() {
        let html = render(&document(&["A", "B", "C"]), ExportTarget::Pdf);
        assert!(!html.contains(&break_block(BREAK_BEFORE_STYLE)));
        assert!(!html.contains(&break_block(BREAK_AFTER_STYLE)));
        assert!(html.contains("@media print{h1{break-before:page;"));
    }

    #[test]
    fn test_docx_break_blocks_surround_inner_sections() {
        let html = render(&document(&["A", "B", "C"]), ExportTarget::Docx);
        let before = break_block(BREAK_BEFORE_STYLE);
        let after = break_block(BREAK_AFTER_STYLE);

        assert_eq!(html.matches(&before).count(), 2);
        assert_eq!(html.matches(&after).count(), 2);
        assert!(html.contains("<h1>T</h1><section class=\"chapter first\">"));
        assert!(html.contains(&format!("</section>{}{}<section class=\"chapter\">", after, before)));
        assert!(html.contains("<p>C text</p></section></body>"));
    }

    #[test]
    fn test_docx_stamps_break_on_headings_after_first() {
        let html = render(&document(&["A", "B"]), ExportTarget::Docx);
        assert!(html.contains("<h1 class=\"chapter-title\">A</h1>"));
        assert!(html.contains(&format!(
            "<h1 class=\"chapter-title\" style=\"{}\">B</h1>",
            BREAK_BEFORE_STYLE
        )));
    }

    #[test]
    fn test_sections_follow_structure_order() {
        let mut doc = document(&[]);
        doc.contents.insert("Z".to_string(), "<p>z</p>".to_string());
        doc.contents.insert("A".to_string(), "<p>a</p>".to_string());
        doc.structure = vec!["Z".to_string(), "A".to_string()];
        let body = render_body(&doc);
        let z = body.find(">Z</h1>").unwrap();
        let a = body.find(">A</h1>").unwrap();
        assert!(z < a);
    }

    #[test]
    fn test_stylesheet_uses_page_geometry() {
        let a5 = resolve_geometry(&CanvasSelection::preset(CanvasPreset::A5));
        let html = render_with_geometry(&document(&["A"]), ExportTarget::Pdf, &a5);
        assert!(html.contains("@page{size:5.83in 8.27in;margin:0.75in;}}</style>"));
    }

    #[test]
    fn test_section_content_is_normalized() {
        let mut doc = document(&["A"]);
        doc.set_content("A", "<p>a&nbsp;&nbsp;**b** ,c</p>".to_string());
        assert!(render_body(&doc).contains("<p>a <strong>b</strong>,c</p>"));
    }
}
