//! Owned HTML fragment tree
//!
//! Editor content is stored as HTML strings. Every pass that needs to look at
//! text (inline markdown promotion, whitespace tidy, find/replace, word
//! counting) parses the string into this tree, edits the owned nodes and
//! serializes the result back. Parsing goes through `scraper` (html5ever), so
//! malformed markup is recovered the same way a browser would recover it.

use scraper::{ElementRef, Html, Node};

/// Elements that never have children or an end tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text content is written without escaping
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements where the parser drops a single leading newline
const NEWLINE_EATING_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// A node in an HTML fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    /// Character data (already entity-decoded)
    Text(String),
    /// An element with its children
    Element(HtmlElement),
    /// A comment, kept so that round-trips do not lose it
    Comment(String),
}

/// An HTML element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    /// Lowercase local name (e.g. "p", "strong")
    pub name: String,
    /// Attributes sorted by name
    pub attrs: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<HtmlNode>,
}

impl HtmlElement {
    /// Create an element with no attributes
    pub fn new(name: &str, children: Vec<HtmlNode>) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children,
        }
    }

    /// Create an element holding a single text node
    pub fn with_text(name: &str, text: &str) -> Self {
        Self::new(name, vec![HtmlNode::Text(text.to_string())])
    }
}

/// A parsed HTML fragment (a list of top-level nodes)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlFragment {
    /// Top-level nodes
    pub nodes: Vec<HtmlNode>,
}

impl HtmlFragment {
    /// Parse an HTML fragment
    ///
    /// Never fails: the HTML5 tree builder repairs whatever it is given.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_fragment(html);
        Self {
            nodes: collect_children(document.root_element()),
        }
    }

    /// Serialize the fragment back to an HTML string
    pub fn to_html(&self) -> String {
        let mut output = String::new();
        for node in &self.nodes {
            write_node(&mut output, node, None);
        }
        output
    }

    /// Concatenated text outside `script` and `style`
    pub fn text_content(&self) -> String {
        let mut output = String::new();
        collect_text(&self.nodes, &mut output);
        output
    }

    /// Visit every text node that is not inside one of the `skip` elements
    pub fn for_each_text_mut<F>(&mut self, skip: &[&str], mut visit: F)
    where
        F: FnMut(&mut String),
    {
        visit_text_mut(&mut self.nodes, skip, &mut visit);
    }

    /// Replace text nodes that are not inside one of the `skip` elements
    ///
    /// The callback returns `None` to keep a text node as is, or the nodes
    /// that should take its place.
    pub fn replace_text<F>(&mut self, skip: &[&str], mut replace: F)
    where
        F: FnMut(&str) -> Option<Vec<HtmlNode>>,
    {
        replace_text_in(&mut self.nodes, skip, &mut replace);
    }
}

fn collect_children(parent: ElementRef<'_>) -> Vec<HtmlNode> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => nodes.push(HtmlNode::Text(String::from(&**text))),
            Node::Comment(comment) => nodes.push(HtmlNode::Comment(String::from(&**comment))),
            Node::Element(element) => {
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let mut attrs: Vec<(String, String)> = element
                    .attrs()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect();
                attrs.sort();
                nodes.push(HtmlNode::Element(HtmlElement {
                    name: element.name().to_string(),
                    attrs,
                    children: collect_children(child_ref),
                }));
            }
            _ => {}
        }
    }
    nodes
}

fn write_node(output: &mut String, node: &HtmlNode, parent: Option<&str>) {
    match node {
        HtmlNode::Text(text) => {
            if parent.is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name)) {
                output.push_str(text);
            } else {
                output.push_str(&escape_text(text));
            }
        }
        HtmlNode::Comment(comment) => {
            output.push_str("<!--");
            output.push_str(comment);
            output.push_str("-->");
        }
        HtmlNode::Element(element) => write_element(output, element),
    }
}

fn write_element(output: &mut String, element: &HtmlElement) {
    output.push('<');
    output.push_str(&element.name);
    for (key, value) in &element.attrs {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        output.push_str(&escape_attr(value));
        output.push('"');
    }
    output.push('>');

    if VOID_ELEMENTS.contains(&element.name.as_str()) {
        return;
    }

    if NEWLINE_EATING_ELEMENTS.contains(&element.name.as_str()) {
        if let Some(HtmlNode::Text(text)) = element.children.first() {
            if text.starts_with('\n') {
                output.push('\n');
            }
        }
    }

    for child in &element.children {
        write_node(output, child, Some(&element.name));
    }

    output.push_str("</");
    output.push_str(&element.name);
    output.push('>');
}

fn collect_text(nodes: &[HtmlNode], output: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => output.push_str(text),
            HtmlNode::Element(element) => {
                if RAW_TEXT_ELEMENTS.contains(&element.name.as_str()) {
                    continue;
                }
                if element.name == "br" {
                    output.push('\n');
                }
                collect_text(&element.children, output);
            }
            HtmlNode::Comment(_) => {}
        }
    }
}

fn visit_text_mut<F>(nodes: &mut [HtmlNode], skip: &[&str], visit: &mut F)
where
    F: FnMut(&mut String),
{
    for node in nodes {
        match node {
            HtmlNode::Text(text) => visit(text),
            HtmlNode::Element(element) => {
                if !skip.contains(&element.name.as_str()) {
                    visit_text_mut(&mut element.children, skip, visit);
                }
            }
            HtmlNode::Comment(_) => {}
        }
    }
}

fn replace_text_in<F>(nodes: &mut Vec<HtmlNode>, skip: &[&str], replace: &mut F)
where
    F: FnMut(&str) -> Option<Vec<HtmlNode>>,
{
    let mut result = Vec::with_capacity(nodes.len());
    for mut node in nodes.drain(..) {
        match &mut node {
            HtmlNode::Text(text) => {
                if let Some(replacement) = replace(text) {
                    result.extend(replacement);
                    continue;
                }
            }
            HtmlNode::Element(element) => {
                if !skip.contains(&element.name.as_str()) {
                    replace_text_in(&mut element.children, skip, replace);
                }
            }
            HtmlNode::Comment(_) => {}
        }
        result.push(node);
    }
    *nodes = result;
}

/// Escape HTML special characters in text content
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape HTML special characters for use inside a double-quoted attribute
pub fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

/// Escape HTML special characters for arbitrary inline use (titles, names)
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize_simple_paragraph() {
        let fragment = HtmlFragment::parse("<p>Hello <strong>world</strong></p>");
        assert_eq!(fragment.to_html(), "<p>Hello <strong>world</strong></p>");
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        let fragment = HtmlFragment::parse("<p>a<br>b<img src=\"x.png\"></p>");
        assert_eq!(fragment.to_html(), "<p>a<br>b<img src=\"x.png\"></p>");
    }

    #[test]
    fn test_entities_are_decoded_then_reescaped() {
        let fragment = HtmlFragment::parse("<p>a &amp; b &lt; c</p>");
        assert_eq!(fragment.text_content(), "a & b < c");
        assert_eq!(fragment.to_html(), "<p>a &amp; b &lt; c</p>");
    }

    #[test]
    fn test_attributes_are_sorted_and_escaped() {
        let fragment = HtmlFragment::parse("<a title='say \"hi\"' href=\"/x?a=1&amp;b=2\">x</a>");
        assert_eq!(
            fragment.to_html(),
            "<a href=\"/x?a=1&amp;b=2\" title=\"say &quot;hi&quot;\">x</a>"
        );
    }

    #[test]
    fn test_pre_leading_newline_survives_round_trip() {
        let html = "<pre>\n\ncode</pre>";
        let once = HtmlFragment::parse(html).to_html();
        let twice = HtmlFragment::parse(&once).to_html();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unclosed_markup_is_repaired() {
        let fragment = HtmlFragment::parse("<p>one<p>two");
        assert_eq!(fragment.to_html(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_text_content_skips_script_and_style() {
        let fragment = HtmlFragment::parse("<p>a</p><script>var x = 1;</script><style>p{}</style>");
        assert_eq!(fragment.text_content(), "a");
    }

    #[test]
    fn test_for_each_text_mut_skips_listed_elements() {
        let mut fragment = HtmlFragment::parse("<p>abc<code>abc</code></p>");
        fragment.for_each_text_mut(&["code"], |text| *text = text.to_uppercase());
        assert_eq!(fragment.to_html(), "<p>ABC<code>abc</code></p>");
    }

    #[test]
    fn test_replace_text_splices_nodes() {
        let mut fragment = HtmlFragment::parse("<p>x</p>");
        fragment.replace_text(&[], |text| {
            Some(vec![HtmlNode::Element(HtmlElement::with_text("em", text))])
        });
        assert_eq!(fragment.to_html(), "<p><em>x</em></p>");
    }
}
