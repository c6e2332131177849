//! Markdown to HTML rendering.
//!
//! CommonMark via pulldown-cmark, with tables, strikethrough, task lists and
//! footnotes enabled. Paragraphs are line-break sensitive: a single newline
//! inside a paragraph renders as `<br />`, the way authors expect when
//! writing for a feed rather than a typeset page.

use pulldown_cmark::{Event, Options, Parser, html};

/// Parser options used for every render.
pub fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Render Markdown to an HTML fragment.
///
/// ```
/// use inkpress::markdown::render_markdown;
///
/// assert_eq!(render_markdown("# Title"), "<h1>Title</h1>\n");
/// assert_eq!(render_markdown("a\nb"), "<p>a<br />\nb</p>\n");
/// ```
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, options()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_code() {
        let html = render_markdown("```rust\nfn main() {}\n```");
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n"
        );
    }

    #[test]
    fn test_code_is_escaped() {
        let html = render_markdown("`a < b`");
        assert_eq!(html, "<p><code>a &lt; b</code></p>\n");
    }

    #[test]
    fn test_tables() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"), "{html}");
        assert!(html.contains("<th>a</th>"), "{html}");
        assert!(html.contains("<td>2</td>"), "{html}");
    }

    #[test]
    fn test_lists() {
        let html = render_markdown("- one\n- two\n\n1. first\n2. second");
        assert!(html.contains("<ul>\n<li>one</li>\n<li>two</li>\n</ul>"), "{html}");
        assert!(html.contains("<ol>\n<li>first</li>"), "{html}");
    }

    #[test]
    fn test_strikethrough_and_tasks() {
        let html = render_markdown("~~gone~~\n\n- [x] done");
        assert!(html.contains("<del>gone</del>"), "{html}");
        assert!(html.contains("checkbox"), "{html}");
    }

    #[test]
    fn test_paragraph_break_is_not_line_break() {
        let html = render_markdown("a\n\nb");
        assert_eq!(html, "<p>a</p>\n<p>b</p>\n");
    }
}
