//! HTML serialization of document subtrees.

use super::document::{Document, NodeData, NodeId};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text children are emitted without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script", "xmp", "iframe", "noembed", "noframes"];

/// Serialize `id` including its own tags.
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_subtree(doc, id, false, &mut out);
    out
}

/// Serialize the children of `id`.
pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let raw = RAW_TEXT_ELEMENTS.iter().any(|tag| doc.has_tag(id, tag));
    for child in doc.children(id) {
        write_subtree(doc, child, raw, &mut out);
    }
    out
}

/// Pending serializer work.
enum Step<'a> {
    Open { id: NodeId, raw_text: bool },
    Close(&'a str),
}

/// Depth-first walk with an explicit stack, so nesting depth is bounded
/// only by memory.
fn write_subtree(doc: &Document, id: NodeId, raw_text: bool, out: &mut String) {
    let mut stack = vec![Step::Open { id, raw_text }];

    while let Some(step) = stack.pop() {
        let (id, raw_text) = match step {
            Step::Open { id, raw_text } => (id, raw_text),
            Step::Close(tag) => {
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
                continue;
            }
        };
        let Some(node) = doc.get(id) else {
            continue;
        };

        match &node.data {
            NodeData::Document => push_children(doc, id, false, &mut stack),
            NodeData::Doctype(name) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Text(text) => {
                if raw_text {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_text(text));
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let tag: &str = &name.local;
                out.push('<');
                out.push_str(tag);
                for attr in attrs {
                    out.push(' ');
                    if let Some(prefix) = &attr.name.prefix {
                        out.push_str(prefix.as_ref());
                        out.push(':');
                    }
                    out.push_str(attr.name.local.as_ref());
                    out.push_str("=\"");
                    out.push_str(&escape_attr(&attr.value));
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&tag) {
                    continue;
                }

                stack.push(Step::Close(tag));
                push_children(doc, id, RAW_TEXT_ELEMENTS.contains(&tag), &mut stack);
            }
        }
    }
}

/// Queue the children of `id` so they pop in document order.
fn push_children<'a>(doc: &'a Document, id: NodeId, raw_text: bool, stack: &mut Vec<Step<'a>>) {
    let mut children: Vec<_> = doc.children(id).collect();
    children.reverse();
    stack.extend(
        children
            .into_iter()
            .map(|child| Step::Open { id: child, raw_text }),
    );
}

/// Escape text content.
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape an attribute value for a double-quoted attribute.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}
