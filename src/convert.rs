//! Preview and publish pipelines.
//!
//! Preview keeps the theme as a real stylesheet because the browser can
//! evaluate it. Publish flattens the theme into inline styles:
//!
//! 1. resolve `:root` variables
//! 2. lift pseudo rules into a supplementary stylesheet
//! 3. inline the remaining rules
//! 4. replace native list markers with literal prefixes

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::css::{resolve_variables, split_pseudo_rules};
use crate::inline::{ContentDocument, theme_stylesheet, wrap_fragment};
use crate::lists::prefix_lists;
use crate::markdown::render_markdown;
use crate::theme::{DEFAULT_THEME_ID, ThemeStore};

/// Target rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Mode {
    /// Browser preview with a real `<style>` block.
    #[default]
    Preview,
    /// Inline-styled fragment for the publishing platform.
    Publish,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Preview => write!(f, "preview"),
            Mode::Publish => write!(f, "publish"),
        }
    }
}

/// Everything a conversion depends on besides the theme store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub markdown_source: String,
    pub theme_id: String,
    pub mode: Mode,
}

impl ConversionRequest {
    pub fn new(markdown_source: impl Into<String>, theme_id: impl Into<String>, mode: Mode) -> Self {
        Self {
            markdown_source: markdown_source.into(),
            theme_id: theme_id.into(),
            mode,
        }
    }

    /// Request with the `default` theme.
    pub fn with_default_theme(markdown_source: impl Into<String>, mode: Mode) -> Self {
        Self::new(markdown_source, DEFAULT_THEME_ID, mode)
    }
}

/// Conversion output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderedDocument {
    pub html_fragment: String,
    /// Rules that could not be inlined. Only set by publish, and only when
    /// the theme has such rules.
    pub supplementary_style: Option<String>,
}

impl RenderedDocument {
    /// The fragment, preceded by a `<style>` block for the supplementary
    /// rules.
    pub fn to_html(&self) -> String {
        match &self.supplementary_style {
            Some(style) => format!("<style>{style}</style>{}", self.html_fragment),
            None => self.html_fragment.clone(),
        }
    }
}

impl fmt::Display for RenderedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(style) = &self.supplementary_style {
            write!(f, "<style>{style}</style>")?;
        }
        f.write_str(&self.html_fragment)
    }
}

/// Runs conversions against a theme store.
#[derive(Debug)]
pub struct Converter {
    themes: Arc<ThemeStore>,
}

impl Converter {
    pub fn new(themes: impl Into<Arc<ThemeStore>>) -> Self {
        Self {
            themes: themes.into(),
        }
    }

    pub fn themes(&self) -> &ThemeStore {
        &self.themes
    }

    /// Convert according to `request.mode`.
    pub fn convert(&self, request: &ConversionRequest) -> RenderedDocument {
        let theme = self.themes.get(&request.theme_id);
        debug!(theme = %theme.id, mode = %request.mode, "converting markdown");
        match request.mode {
            Mode::Preview => RenderedDocument {
                html_fragment: render_preview(&request.markdown_source, &theme.css_source),
                supplementary_style: None,
            },
            Mode::Publish => render_publish(&request.markdown_source, &theme.css_source),
        }
    }

    /// Preview HTML for `markdown` in `theme_id`.
    pub fn preview(&self, markdown: &str, theme_id: &str) -> String {
        render_preview(markdown, &self.themes.get(theme_id).css_source)
    }

    /// Publish output for `markdown` in `theme_id`.
    pub fn publish(&self, markdown: &str, theme_id: &str) -> RenderedDocument {
        render_publish(markdown, &self.themes.get(theme_id).css_source)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ThemeStore::from_env())
    }
}

/// Render `markdown` for a browser with `css` as its stylesheet.
///
/// ```
/// use inkpress::convert::render_preview;
///
/// let html = render_preview("Hi", "p { color: red; }");
/// assert_eq!(
///     html,
///     "<style>p { color: red; }</style><section id=\"inkpress-article\"><p>Hi</p>\n</section>"
/// );
/// ```
pub fn render_preview(markdown: &str, css: &str) -> String {
    let body = render_markdown(markdown);
    format!("<style>{css}</style>{}", wrap_fragment(&body))
}

/// Render `markdown` as an inline-styled fragment.
pub fn render_publish(markdown: &str, css: &str) -> RenderedDocument {
    publish_html(&render_markdown(markdown), css)
}

/// Run the publish pipeline over an already rendered HTML fragment.
pub fn publish_html(html: &str, css: &str) -> RenderedDocument {
    let resolved = resolve_variables(css);
    let split = split_pseudo_rules(&resolved);

    let html_fragment = match ContentDocument::parse(html) {
        Some(mut content) => {
            content.strip_unsafe_elements();
            content.apply_stylesheet(&theme_stylesheet(&split.inlineable));
            prefix_lists(&mut content.doc, content.root);
            content.to_html()
        }
        None => {
            debug!("content container missing after parse; publishing fragment unstyled");
            wrap_fragment(html)
        }
    };

    let supplementary_style = (!split.pseudo.trim().is_empty()).then_some(split.pseudo);
    RenderedDocument {
        html_fragment,
        supplementary_style,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;

    fn converter() -> Converter {
        Converter::new(ThemeStore::from_themes([
            Theme::new(
                "default",
                ":root { --c: #333; }\np { color: var(--c); }\na:hover { color: red; }",
            ),
            Theme::new("plain", "p { margin: 0 }"),
        ]))
    }

    #[test]
    fn test_publish_inlines_and_lifts_pseudo() {
        let doc = converter().publish("Hello", "default");
        assert_eq!(
            doc.html_fragment,
            "<section id=\"inkpress-article\"><p style=\"color:#333\">Hello</p>\n</section>"
        );
        assert_eq!(doc.supplementary_style.as_deref(), Some("a:hover { color: red; }\n"));
        assert!(doc.to_html().starts_with("<style>a:hover { color: red; }\n</style><section"));
    }

    #[test]
    fn test_publish_without_pseudo_rules() {
        let doc = converter().publish("Hello", "plain");
        assert_eq!(doc.supplementary_style, None);
        assert_eq!(doc.to_html(), doc.html_fragment);
    }

    #[test]
    fn test_preview_keeps_css_verbatim() {
        let html = converter().preview("Hello", "default");
        assert!(html.starts_with("<style>:root { --c: #333; }"), "{html}");
        assert!(html.contains("var(--c)"), "{html}");
        assert!(html.ends_with("<section id=\"inkpress-article\"><p>Hello</p>\n</section>"));
    }

    #[test]
    fn test_convert_dispatches_on_mode() {
        let converter = converter();
        let preview = converter.convert(&ConversionRequest::new("x", "plain", Mode::Preview));
        assert!(preview.html_fragment.starts_with("<style>"));
        assert_eq!(preview.supplementary_style, None);

        let publish = converter.convert(&ConversionRequest::new("x", "plain", Mode::Publish));
        assert!(publish.html_fragment.starts_with("<section"));
    }

    #[test]
    fn test_publish_drops_scripts() {
        let doc = publish_html("<p>a</p><script>alert(1)</script>", "");
        assert!(!doc.html_fragment.contains("script"), "{}", doc.html_fragment);
    }

    #[test]
    fn test_display_matches_to_html() {
        let doc = RenderedDocument {
            html_fragment: "<section></section>".into(),
            supplementary_style: Some("a:hover{}".into()),
        };
        assert_eq!(doc.to_string(), doc.to_html());
    }
}
