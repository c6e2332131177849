//! Literal list markers.
//!
//! The publishing target renders native list counters unreliably, so lists
//! are switched to `list-style:none` and every item gets its bullet or
//! ordinal as leading text.

use crate::css::{DeclarationBlock, parse_declarations};
use crate::dom::{Document, NodeId, inner_html};
use crate::inline::ContentDocument;

/// Prefix for unordered list items.
pub const BULLET: &str = "• ";

/// Rewrite the lists under `root` to carry literal prefixes.
///
/// Each `ol` counts its own direct `li` children from 1, or from a numeric
/// `start` attribute. `list-style*` declarations are removed from every list
/// and list item, and lists get `list-style:none`.
pub fn prefix_lists(doc: &mut Document, root: NodeId) {
    let nodes = doc.descendants(root);

    for &id in &nodes {
        let ordered = doc.has_tag(id, "ol");
        if !ordered && !doc.has_tag(id, "ul") {
            continue;
        }

        let mut style = list_free_style(doc, id);
        style.set("list-style", "none");
        doc.set_attr(id, "style", style.to_string());

        let mut counter = if ordered { list_start(doc, id) } else { 1 };
        let items: Vec<NodeId> = doc
            .element_children(id)
            .filter(|&child| doc.has_tag(child, "li"))
            .collect();
        for item in items {
            let prefix = if ordered {
                let prefix = format!("{counter}. ");
                counter = counter.saturating_add(1);
                prefix
            } else {
                BULLET.to_string()
            };
            let text = doc.create_text(prefix);
            doc.prepend(item, text);
        }
    }

    for &id in &nodes {
        if !doc.has_tag(id, "li") || doc.get_attr(id, "style").is_none() {
            continue;
        }
        let style = list_free_style(doc, id);
        if style.is_empty() {
            doc.remove_attr(id, "style");
        } else {
            doc.set_attr(id, "style", style.to_string());
        }
    }
}

/// Apply [`prefix_lists`] to an HTML fragment.
///
/// ```
/// use inkpress::lists::rewrite_list_prefixes;
///
/// let html = rewrite_list_prefixes("<ol><li>a</li><li>b</li></ol>");
/// assert_eq!(html, r#"<ol style="list-style:none"><li>1. a</li><li>2. b</li></ol>"#);
/// ```
pub fn rewrite_list_prefixes(html: &str) -> String {
    let Some(mut content) = ContentDocument::parse(html) else {
        tracing::debug!("content container missing after parse; lists left as is");
        return html.to_string();
    };
    prefix_lists(&mut content.doc, content.root);
    inner_html(&content.doc, content.root)
}

/// The element's inline style without `list-style*` declarations.
fn list_free_style(doc: &Document, id: NodeId) -> DeclarationBlock {
    let mut style = doc
        .get_attr(id, "style")
        .map(parse_declarations)
        .unwrap_or_default();
    style.retain(|name, _| !name.starts_with("list-style"));
    style
}

fn list_start(doc: &Document, id: NodeId) -> i64 {
    doc.get_attr(id, "start")
        .and_then(|start| start.trim().parse().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_bullets() {
        let html = rewrite_list_prefixes("<ul><li>one</li><li>two</li></ul>");
        assert_eq!(
            html,
            r#"<ul style="list-style:none"><li>• one</li><li>• two</li></ul>"#
        );
    }

    #[test]
    fn test_sibling_lists_count_independently() {
        let html = rewrite_list_prefixes("<ol><li>a</li><li>b</li></ol><ol><li>c</li></ol>");
        assert_eq!(
            html,
            r#"<ol style="list-style:none"><li>1. a</li><li>2. b</li></ol><ol style="list-style:none"><li>1. c</li></ol>"#
        );
    }

    #[test]
    fn test_nested_lists_restart() {
        let html = rewrite_list_prefixes(
            "<ol><li>a<ol><li>x</li><li>y</li></ol></li><li>b</li></ol>",
        );
        assert!(html.contains("<li>1. a<ol"), "{html}");
        assert!(html.contains("<li>1. x</li><li>2. y</li>"), "{html}");
        assert!(html.contains("<li>2. b</li>"), "{html}");
    }

    #[test]
    fn test_mixed_nesting() {
        let html = rewrite_list_prefixes("<ul><li>a<ol><li>x</li></ol></li></ul>");
        assert!(html.contains("<li>• a<ol"), "{html}");
        assert!(html.contains("<li>1. x</li>"), "{html}");
    }

    #[test]
    fn test_start_attribute() {
        let html = rewrite_list_prefixes(r#"<ol start="4"><li>d</li><li>e</li></ol>"#);
        assert!(html.contains("<li>4. d</li><li>5. e</li>"), "{html}");
    }

    #[test]
    fn test_start_attribute_at_integer_limit() {
        let html = rewrite_list_prefixes(
            r#"<ol start="9223372036854775807"><li>a</li><li>b</li></ol>"#,
        );
        assert!(
            html.contains("<li>9223372036854775807. a</li><li>9223372036854775807. b</li>"),
            "{html}"
        );
    }

    #[test]
    fn test_non_numeric_start_counts_from_one() {
        let html = rewrite_list_prefixes(r#"<ol start="x"><li>a</li></ol>"#);
        assert!(html.contains("<li>1. a</li>"), "{html}");
    }

    #[test]
    fn test_existing_styles_filtered() {
        let html = rewrite_list_prefixes(
            r#"<ul style="margin:1em 0;list-style-type:disc"><li style="list-style:square;color:red">a</li><li style="list-style-position:inside">b</li></ul>"#,
        );
        assert_eq!(
            html,
            r#"<ul style="margin:1em 0;list-style:none"><li style="color:red">• a</li><li>• b</li></ul>"#
        );
    }

    #[test]
    fn test_non_list_content_untouched() {
        let html = "<p>1. not a list</p>";
        assert_eq!(rewrite_list_prefixes(html), html);
    }
}
