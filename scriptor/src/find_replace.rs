//! Case-insensitive find/replace over the text of an HTML fragment
//!
//! Only text nodes are touched, so tags and attribute values never match.
//! Text inside `script` and `style` is left alone.

use crate::html_tree::HtmlFragment;
use regex::{NoExpand, Regex};

const SKIPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Replace every case-insensitive occurrence of `search` in the text of `html`
///
/// The search term is matched literally (it is escaped before being compiled)
/// and the replacement is inserted literally, so `$1` in it stays `$1`.
///
/// # Parameters
/// * `html` - HTML fragment to search
/// * `search` - Text to look for; an empty (or whitespace-only) term is a no-op
/// * `replacement` - Text to insert
///
/// # Returns
/// * The rewritten HTML (the input unchanged when nothing matched) and the
///   number of occurrences replaced
pub fn replace_in_html(html: &str, search: &str, replacement: &str) -> (String, usize) {
    let Some(pattern) = search_pattern(search) else {
        return (html.to_string(), 0);
    };

    let mut fragment = HtmlFragment::parse(html);
    let mut count = 0;
    fragment.for_each_text_mut(SKIPPED_ELEMENTS, |text| {
        let found = pattern.find_iter(text).count();
        if found > 0 {
            count += found;
            *text = pattern.replace_all(text, NoExpand(replacement)).into_owned();
        }
    });

    if count == 0 {
        return (html.to_string(), 0);
    }
    log::debug!("Replaced {} occurrence(s) of '{}'", count, search.trim());
    (fragment.to_html(), count)
}

fn search_pattern(search: &str) -> Option<Regex> {
    let search = search.trim();
    if search.is_empty() {
        return None;
    }
    // Escaped literals only fail on the compiled size limit
    Regex::new(&format!("(?i){}", regex::escape(search))).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_is_case_insensitive() {
        let (html, count) = replace_in_html("<p>Cat cat CAT</p>", "cat", "dog");
        assert_eq!(html, "<p>dog dog dog</p>");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_tags_and_attributes_are_not_matched() {
        let (html, count) = replace_in_html("<p class=\"p\"><span>p</span></p>", "p", "q");
        assert_eq!(html, "<p class=\"p\"><span>q</span></p>");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let (html, count) = replace_in_html("<p>a.b axb (x)</p>", "a.b", "$1");
        assert_eq!(html, "<p>$1 axb (x)</p>");
        assert_eq!(count, 1);

        let (_, count) = replace_in_html("<p>(x) (x)</p>", "(x)", "y");
        assert_eq!(count, 2);
    }

    #[test]
    fn test_script_and_style_are_skipped() {
        let html = "<p>alert</p><script>alert(1)</script>";
        let (replaced, count) = replace_in_html(html, "alert", "note");
        assert_eq!(count, 1);
        assert!(replaced.contains("<script>alert(1)</script>"));
    }

    #[test]
    fn test_empty_search_is_a_no_op() {
        let html = "<p>unchanged  text</p>";
        assert_eq!(replace_in_html(html, "  ", "x"), (html.to_string(), 0));
    }

    #[test]
    fn test_no_match_returns_input_verbatim() {
        let html = "<P>Keep   as typed</P>";
        assert_eq!(replace_in_html(html, "zebra", "x"), (html.to_string(), 0));
    }
}
