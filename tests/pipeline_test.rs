//! End-to-end conversion tests against the bundled themes.

use inkpress::dom::{Document, NodeId, parse_html};
use inkpress::{CONTAINER_ID, ConversionRequest, Converter, Mode, ThemeStore};

const THEMES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/themes");
const SAMPLE_MD: &str = include_str!("fixtures/sample.md");

fn converter() -> Converter {
    Converter::new(ThemeStore::new(THEMES_DIR))
}

fn elements(doc: &Document, tag: &str) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|&id| doc.has_tag(id, tag))
        .collect()
}

// ============================================================================
// Publish output
// ============================================================================

#[test]
fn test_title_and_bullets() {
    let doc = converter().publish("# Title\n\n- one\n- two", "default");
    let html = doc.html_fragment;
    assert!(html.starts_with(&format!("<section id=\"{CONTAINER_ID}\"")), "{html}");

    let dom = parse_html(&html);
    let items = elements(&dom, "li");
    assert_eq!(items.len(), 2);
    assert!(dom.collect_text(items[0]).starts_with("• one"));
    assert!(dom.collect_text(items[1]).starts_with("• two"));

    let ul = elements(&dom, "ul")[0];
    let style = dom.get_attr(ul, "style").unwrap_or_default();
    assert!(style.contains("list-style:none"), "{style}");
}

#[test]
fn test_unknown_theme_matches_default() {
    let converter = converter();
    for mode in [Mode::Preview, Mode::Publish] {
        let unknown = converter.convert(&ConversionRequest::new(SAMPLE_MD, "nonexistent", mode));
        let default = converter.convert(&ConversionRequest::new(SAMPLE_MD, "default", mode));
        assert_eq!(unknown, default, "mode {mode}");
        assert_eq!(unknown.to_html(), default.to_html());
    }
}

#[test]
fn test_hover_rules_never_inlined() {
    let doc = converter().publish(SAMPLE_MD, "default");
    let supplementary = doc.supplementary_style.as_deref().unwrap_or_default();
    assert!(supplementary.contains("a:hover"), "{supplementary}");
    assert!(supplementary.contains("text-decoration: underline"));

    // The underline only exists in the hover rule.
    let dom = parse_html(&doc.html_fragment);
    let link = elements(&dom, "a")[0];
    let style = dom.get_attr(link, "style").unwrap_or_default();
    assert!(style.contains("text-decoration:none"), "{style}");
    assert!(!doc.html_fragment.contains("underline"));
}

#[test]
fn test_variables_resolved_in_publish() {
    for theme in ["default", "purple", "lapis"] {
        let doc = converter().publish(SAMPLE_MD, theme);
        assert!(!doc.html_fragment.contains("var(--"), "{theme}: {}", doc.html_fragment);
        let supplementary = doc.supplementary_style.as_deref().unwrap_or_default();
        assert!(!supplementary.contains("var(--"), "{theme}: {supplementary}");
        assert!(!supplementary.contains(":root"), "{theme}: {supplementary}");
    }
}

#[test]
fn test_default_theme_styles() {
    let doc = converter().publish(SAMPLE_MD, "default");
    let dom = parse_html(&doc.html_fragment);

    let h1 = elements(&dom, "h1")[0];
    assert_eq!(
        dom.get_attr(h1, "style"),
        Some("font-size:1.5em;font-weight:bold;margin:1.5em 0 0.5em;color:#333")
    );

    let blockquote = elements(&dom, "blockquote")[0];
    let style = dom.get_attr(blockquote, "style").unwrap_or_default();
    assert!(style.contains("border-left:4px solid #ddd"), "{style}");
    assert!(style.contains("color:#666"), "{style}");

    let pre_code = elements(&dom, "code")
        .into_iter()
        .find(|&code| dom.get(code).is_some_and(|n| dom.has_tag(n.parent, "pre")))
        .expect("fenced code block");
    let style = dom.get_attr(pre_code, "style").unwrap_or_default();
    assert!(style.contains("padding:0"), "{style}");
    assert!(style.contains("background:none"), "{style}");
}

#[test]
fn test_no_native_counters() {
    for theme in ["default", "purple", "lapis"] {
        let doc = converter().publish(SAMPLE_MD, theme);
        let dom = parse_html(&doc.html_fragment);
        for tag in ["ul", "ol", "li"] {
            for id in elements(&dom, tag) {
                let Some(style) = dom.get_attr(id, "style") else {
                    continue;
                };
                for declaration in style.split(';') {
                    if let Some(value) = declaration.strip_prefix("list-style") {
                        assert_eq!(value, ":none", "{theme} <{tag} style=\"{style}\">");
                    }
                }
            }
        }
    }
}

#[test]
fn test_ordered_lists_restart() {
    let md = "1. a\n2. b\n\nbreak\n\n1. c\n2. d\n   1. x\n   2. y\n";
    let doc = converter().publish(md, "default");
    let dom = parse_html(&doc.html_fragment);
    let texts: Vec<String> = elements(&dom, "li")
        .into_iter()
        .map(|li| dom.collect_text(li))
        .collect();
    assert!(texts[0].starts_with("1. a"));
    assert!(texts[1].starts_with("2. b"));
    assert!(texts[2].starts_with("1. c"));
    assert!(texts[3].starts_with("2. d"));
    assert!(texts[4].starts_with("1. x"));
    assert!(texts[5].starts_with("2. y"));
}

#[test]
fn test_publish_has_no_scripts_or_inner_styles() {
    let md = "Hello\n\n<script>alert('x')</script>\n\n<style>p { color: red }</style>\n";
    let doc = converter().publish(md, "default");
    assert!(!doc.html_fragment.contains("<script"), "{}", doc.html_fragment);
    assert!(!doc.html_fragment.contains("<style"), "{}", doc.html_fragment);
}

#[test]
fn test_stray_section_end_tag_keeps_following_content() {
    let doc = converter().publish("before\n\n</section>\n\nafter", "default");
    let html = &doc.html_fragment;
    assert!(html.starts_with(&format!("<section id=\"{CONTAINER_ID}\"")), "{html}");
    assert!(html.ends_with("</section>"), "{html}");

    let dom = parse_html(html);
    let texts: Vec<String> = elements(&dom, "p")
        .into_iter()
        .map(|p| dom.collect_text(p))
        .collect();
    assert_eq!(texts, ["before", "after"]);
}

#[test]
fn test_huge_ordered_list_start() {
    let md = "<ol start=\"9223372036854775807\"><li>a</li><li>b</li></ol>\n";
    let doc = converter().publish(md, "default");
    let dom = parse_html(&doc.html_fragment);
    for li in elements(&dom, "li") {
        assert!(dom.collect_text(li).starts_with("9223372036854775807. "));
    }
}

#[test]
fn test_theme_pseudo_elements_lifted() {
    let doc = converter().publish("## Section\n\ntext", "purple");
    let supplementary = doc.supplementary_style.expect("purple has pseudo rules");
    assert!(supplementary.contains("h2::before {"), "{supplementary}");
    assert!(supplementary.contains("content: \"❖ \";"), "{supplementary}");
    assert!(supplementary.contains("tr:nth-child(2n)"));
    assert!(!supplementary.contains("var(--"), "{supplementary}");
    assert!(!doc.html_fragment.contains('❖'));
}

// ============================================================================
// Preview output
// ============================================================================

#[test]
fn test_preview_embeds_theme_verbatim() {
    let converter = converter();
    let css = converter.themes().get("lapis").css_source.clone();
    let html = converter.preview(SAMPLE_MD, "lapis");
    assert!(html.starts_with(&format!("<style>{css}</style>")));
    assert!(html.contains(&format!("<section id=\"{CONTAINER_ID}\"><h1>Release notes</h1>")));
    assert!(!html.contains(" style=\""), "preview must not inline styles");
}
