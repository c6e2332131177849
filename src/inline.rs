//! Style inlining.
//!
//! The publishing target accepts a single HTML fragment with no stylesheet,
//! so every declaration a theme rule contributes to an element is written
//! into that element's `style` attribute. Only the content container is
//! styled and serialized.

use tracing::debug;

use crate::css::{DeclarationBlock, Stylesheet, parse_declarations};
use crate::dom::{Document, ElementRef, NodeId, outer_html, parse_html};

/// `id` of the `<section>` that wraps rendered content.
pub const CONTAINER_ID: &str = "inkpress-article";

/// Rules layered ahead of every theme so list content renders without
/// native markers. A theme can override them.
pub const BASELINE_LIST_CSS: &str = "ul, ol { list-style: none; }\nli p { display: inline; }\n";

/// Elements dropped from published content.
const STRIPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Wrap a fragment in the content container.
pub fn wrap_fragment(html: &str) -> String {
    format!("<section id=\"{CONTAINER_ID}\">{html}</section>")
}

/// A parsed fragment together with its container element.
pub struct ContentDocument {
    pub doc: Document,
    pub root: NodeId,
}

impl ContentDocument {
    /// Parse `html` inside the content container.
    ///
    /// Content that a stray end tag pushed out of the container is moved back
    /// in. Returns `None` when the container cannot be found after parsing.
    pub fn parse(html: &str) -> Option<Self> {
        let mut doc = parse_html(&wrap_fragment(html));
        let root = doc.get_by_id(CONTAINER_ID)?;
        let reclaimed = reclaim_following_siblings(&mut doc, root);
        if reclaimed > 0 {
            debug!(reclaimed, "content closed the container early; moved back inside");
        }
        Some(Self { doc, root })
    }

    /// Inline `stylesheet` into the container subtree.
    pub fn apply_stylesheet(&mut self, stylesheet: &Stylesheet) {
        apply_stylesheet(&mut self.doc, self.root, stylesheet);
    }

    /// Remove `<script>` and `<style>` elements from the container subtree.
    pub fn strip_unsafe_elements(&mut self) -> usize {
        remove_elements(&mut self.doc, self.root, STRIPPED_ELEMENTS)
    }

    /// Serialize the container, tags included.
    pub fn to_html(&self) -> String {
        outer_html(&self.doc, self.root)
    }
}

/// Move every node after `root` in its parent to the end of `root`.
fn reclaim_following_siblings(doc: &mut Document, root: NodeId) -> usize {
    let mut moved = 0;
    while let Some(next) = doc
        .get(root)
        .map(|n| n.next_sibling)
        .filter(|next| next.is_some())
    {
        doc.detach(next);
        doc.append(root, next);
        moved += 1;
    }
    moved
}

/// The theme stylesheet with [`BASELINE_LIST_CSS`] layered underneath.
pub fn theme_stylesheet(css: &str) -> Stylesheet {
    let mut stylesheet = Stylesheet::parse(BASELINE_LIST_CSS);
    stylesheet.extend(Stylesheet::parse(css));
    stylesheet
}

/// Inline `css` into an HTML fragment and return the styled container.
///
/// If the container cannot be located the fragment is returned wrapped but
/// unstyled.
///
/// ```
/// use inkpress::inline::inline_styles;
///
/// let html = inline_styles("<p>Hi</p>", "p { color: #333; }");
/// assert_eq!(html, r#"<section id="inkpress-article"><p style="color:#333">Hi</p></section>"#);
/// ```
pub fn inline_styles(html: &str, css: &str) -> String {
    let Some(mut content) = ContentDocument::parse(html) else {
        debug!("content container missing after parse; returning fragment unstyled");
        return wrap_fragment(html);
    };
    content.apply_stylesheet(&theme_stylesheet(css));
    content.to_html()
}

/// Write the declarations matched by `stylesheet` into `style` attributes
/// of `root` and every element below it.
///
/// Matching runs against the unmodified tree; the results are merged into
/// each existing `style` afterwards, with matched declarations winning.
pub fn apply_stylesheet(doc: &mut Document, root: NodeId, stylesheet: &Stylesheet) {
    if stylesheet.is_empty() {
        return;
    }

    let view: &Document = doc;
    let matched: Vec<(NodeId, DeclarationBlock)> = view
        .descendants(root)
        .into_iter()
        .filter(|&id| view.is_element(id))
        .map(|id| (id, stylesheet.matched_declarations(ElementRef::new(view, id))))
        .filter(|(_, block)| !block.is_empty())
        .collect();

    for (id, block) in matched {
        let mut style = doc
            .get_attr(id, "style")
            .map(parse_declarations)
            .unwrap_or_default();
        style.merge(&block);
        doc.set_attr(id, "style", style.to_string());
    }
}

/// Detach every element below `root` whose tag is in `tags`.
pub fn remove_elements(doc: &mut Document, root: NodeId, tags: &[&str]) -> usize {
    let doomed: Vec<NodeId> = doc
        .descendants(root)
        .into_iter()
        .filter(|&id| id != root)
        .filter(|&id| tags.iter().any(|tag| doc.has_tag(id, tag)))
        .collect();
    for &id in &doomed {
        doc.detach(id);
    }
    if !doomed.is_empty() {
        debug!(count = doomed.len(), "removed elements from content");
    }
    doomed.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_basic() {
        let html = inline_styles(
            "<h1>Title</h1><p>Body</p>",
            "h1 { font-size: 1.5em } p { margin: 1em 0 }",
        );
        assert_eq!(
            html,
            r#"<section id="inkpress-article"><h1 style="font-size:1.5em">Title</h1><p style="margin:1em 0">Body</p></section>"#
        );
    }

    #[test]
    fn test_new_declarations_win_over_existing_style() {
        let html = inline_styles(
            r#"<p style="color: red; margin: 0">x</p>"#,
            "p { color: blue }",
        );
        assert!(html.contains(r#"<p style="color:blue;margin:0">"#), "{html}");
    }

    #[test]
    fn test_baseline_list_rules() {
        let html = inline_styles("<ul><li><p>a</p></li></ul>", "");
        assert!(html.contains(r#"<ul style="list-style:none">"#), "{html}");
        assert!(html.contains(r#"<p style="display:inline">"#), "{html}");
    }

    #[test]
    fn test_theme_overrides_baseline() {
        let html = inline_styles("<ol><li>a</li></ol>", "ol { list-style: decimal }");
        assert!(html.contains(r#"<ol style="list-style:decimal">"#), "{html}");
    }

    #[test]
    fn test_container_selector_applies() {
        let html = inline_styles("<p>x</p>", "#inkpress-article { padding: 0 8px }");
        assert!(
            html.starts_with(r#"<section id="inkpress-article" style="padding:0 8px">"#),
            "{html}"
        );
    }

    #[test]
    fn test_elements_without_matches_untouched() {
        let html = inline_styles("<p>x <em>y</em></p>", "p { color: #333 }");
        assert!(html.contains("<em>y</em>"), "{html}");
    }

    #[test]
    fn test_stray_container_end_tag_keeps_content() {
        let html = inline_styles("<p>before</p></section><p>after</p>", "p { color: #333 }");
        assert_eq!(
            html,
            r#"<section id="inkpress-article"><p style="color:#333">before</p><p style="color:#333">after</p></section>"#
        );
    }

    #[test]
    fn test_stray_end_tag_inside_nested_element() {
        let content = ContentDocument::parse("<div><p>a</p></section><p>b</p></div><p>c</p>")
            .expect("container");
        let html = content.to_html();
        assert!(html.starts_with(r#"<section id="inkpress-article"><div><p>a</p>"#), "{html}");
        assert!(html.contains("<p>b</p>"), "{html}");
        assert!(html.ends_with("<p>c</p></section>"), "{html}");
    }

    #[test]
    fn test_strip_unsafe_elements() {
        let mut content =
            ContentDocument::parse("<p>a</p><script>alert(1)</script><style>p{}</style>").unwrap();
        assert_eq!(content.strip_unsafe_elements(), 2);
        assert_eq!(
            content.to_html(),
            r#"<section id="inkpress-article"><p>a</p></section>"#
        );
    }
}
