//! Content normalization applied before rendering, export and persistence
//!
//! Editor HTML is loosely formatted: pasted text may carry Markdown markers,
//! non-breaking spaces from contenteditable, or stray spacing before
//! punctuation. [`normalize`] turns it into consistent HTML in four passes:
//!
//! 1. Non-breaking spaces become plain spaces
//! 2. Whole-text Markdown is promoted to HTML when it has block markers and no tags
//! 3. Inline `` `code` ``, `**bold**` and `*italic*` markers are promoted inside text nodes
//! 4. Runs of spaces collapse and whitespace before `, . ! ? ; :` is removed
//!
//! The result is stable: normalizing already-normalized HTML returns it unchanged.

use crate::html_tree::{HtmlElement, HtmlFragment, HtmlNode};
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Text inside these elements is never scanned for inline markers
const INLINE_SKIP: &[&str] = &["code", "pre", "a", "script", "style"];

/// Text inside these elements keeps its spacing verbatim
const TIDY_SKIP: &[&str] = &["code", "pre", "script", "style", "textarea"];

/// Normalize raw editor HTML
///
/// Pure and infallible. Markdown parsing and HTML5 tree building both
/// recover from malformed input, so every step produces a usable result
/// and the best HTML computed so far is always what comes out.
///
/// # Parameters
/// * `raw_html` - HTML (or Markdown-looking text) from the editor
///
/// # Returns
/// * Normalized HTML
pub fn normalize(raw_html: &str) -> String {
    let output = normalize_pass(raw_html);

    // Tidying tagless text can expose a block marker ("1 ." becomes "1."),
    // so a second pass promotes it now instead of on the next save.
    if looks_like_markdown(&output) {
        return normalize_pass(&output);
    }
    output
}

fn normalize_pass(raw_html: &str) -> String {
    let mut cleaned = raw_html.replace("&nbsp;", " ").replace('\u{a0}', " ");

    if looks_like_markdown(&cleaned) {
        log::debug!("Promoting Markdown content to HTML ({} bytes)", cleaned.len());
        cleaned = markdown_to_html(&cleaned);
    }

    let mut fragment = HtmlFragment::parse(&cleaned);

    // Numeric entities (&#160;) only decode during parsing
    fragment.for_each_text_mut(&[], |text| {
        if text.contains('\u{a0}') {
            *text = text.replace('\u{a0}', " ");
        }
    });

    promote_inline_markdown(&mut fragment);
    tidy_whitespace(&mut fragment);

    fragment.to_html()
}

/// Heuristic check for block-level Markdown
///
/// True when some line starts with a list bullet, heading hashes, a
/// blockquote marker or an ordered-list number AND the text contains no
/// HTML tags at all. Prose that starts a line with `-` or `#` is a known
/// false positive; Markdown whose markers appear only mid-line is a known
/// false negative.
pub fn looks_like_markdown(text: &str) -> bool {
    block_marker_regex().is_match(text) && !html_tag_regex().is_match(text)
}

/// Render Markdown to HTML with the GitHub-flavoured extensions
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

fn block_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|\n)\s*(?:[*\-+]\s+|#{1,6}\s+|>\s+|\d+\.\s+)")
            .expect("block marker pattern is valid")
    })
}

fn html_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<\w+[^>]*>").expect("html tag pattern is valid"))
}

fn code_span_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`([^`]+?)`").expect("code span pattern is valid"))
}

fn bold_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+?)\*\*").expect("bold pattern is valid"))
}

fn multi_space_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("space pattern is valid"))
}

fn space_before_punctuation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+([,.!?;:])").expect("punctuation pattern is valid"))
}

/// Kind of inline marker found in a text node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineKind {
    Code,
    Bold,
    Italic,
}

impl InlineKind {
    fn element_name(self) -> &'static str {
        match self {
            InlineKind::Code => "code",
            InlineKind::Bold => "strong",
            InlineKind::Italic => "em",
        }
    }
}

/// A marker match within a text slice (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq)]
struct InlineMatch {
    kind: InlineKind,
    /// Whole match including the markers
    outer: Range<usize>,
    /// Text between the markers
    inner: Range<usize>,
}

fn promote_inline_markdown(fragment: &mut HtmlFragment) {
    fragment.replace_text(INLINE_SKIP, |text| {
        if !text.contains(['`', '*']) {
            return None;
        }
        let nodes = split_inline_markers(text);
        match nodes.as_slice() {
            [HtmlNode::Text(_)] => None,
            _ => Some(nodes),
        }
    });
}

/// Split a text node into plain text and promoted inline elements
///
/// Scans left to right; at each step the earliest match among the code,
/// bold and italic patterns wins (ties go to the pattern listed first).
fn split_inline_markers(text: &str) -> Vec<HtmlNode> {
    let mut nodes = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let Some(found) = earliest_marker(remaining) else {
            nodes.push(HtmlNode::Text(remaining.to_string()));
            break;
        };

        if found.outer.start > 0 {
            nodes.push(HtmlNode::Text(remaining[..found.outer.start].to_string()));
        }
        nodes.push(HtmlNode::Element(HtmlElement::with_text(
            found.kind.element_name(),
            &remaining[found.inner.clone()],
        )));
        remaining = &remaining[found.outer.end..];
    }

    nodes
}

fn earliest_marker(text: &str) -> Option<InlineMatch> {
    let candidates = [
        find_with_regex(text, code_span_regex(), InlineKind::Code),
        find_with_regex(text, bold_regex(), InlineKind::Bold),
        find_italic(text),
    ];

    let mut best: Option<InlineMatch> = None;
    for candidate in candidates.into_iter().flatten() {
        let earlier = best
            .as_ref()
            .map_or(true, |current| candidate.outer.start < current.outer.start);
        if earlier {
            best = Some(candidate);
        }
    }
    best
}

fn find_with_regex(text: &str, regex: &Regex, kind: InlineKind) -> Option<InlineMatch> {
    let captures = regex.captures(text)?;
    let outer = captures.get(0)?;
    let inner = captures.get(1)?;
    Some(InlineMatch {
        kind,
        outer: outer.range(),
        inner: inner.range(),
    })
}

/// Single-asterisk emphasis that is not part of a `**` pair
///
/// Equivalent to `(?<!\*)\*([^*]+?)\*(?!\*)`, which the `regex` crate
/// cannot express because it has no lookaround.
fn find_italic(text: &str) -> Option<InlineMatch> {
    let bytes = text.as_bytes();
    let mut from = 0;

    while let Some(offset) = text[from..].find('*') {
        let open = from + offset;
        from = open + 1;

        if open > 0 && bytes[open - 1] == b'*' {
            continue;
        }

        let inner_start = open + 1;
        let close_offset = text[inner_start..].find('*')?;
        if close_offset == 0 {
            continue;
        }

        let close = inner_start + close_offset;
        if bytes.get(close + 1) == Some(&b'*') {
            continue;
        }

        return Some(InlineMatch {
            kind: InlineKind::Italic,
            outer: open..close + 1,
            inner: inner_start..close,
        });
    }

    None
}

fn tidy_whitespace(fragment: &mut HtmlFragment) {
    fragment.for_each_text_mut(TIDY_SKIP, |text| {
        let collapsed = multi_space_regex().replace_all(text, " ");
        let tidied = space_before_punctuation_regex().replace_all(&collapsed, "$1");
        if tidied != text.as_str() {
            *text = tidied.into_owned();
        }
    });
}
