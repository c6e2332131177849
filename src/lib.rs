//! # inkpress
//!
//! Themed Markdown to HTML for two targets: a browser preview that uses the
//! theme as a real stylesheet, and a publishing platform that only accepts a
//! single fragment with inline styles.
//!
//! ## Features
//!
//! - Themes are plain CSS files, loaded lazily from a directory
//! - `:root` custom properties resolved across `var()` chains
//! - Pseudo-element and state rules lifted into a supplementary stylesheet
//! - Selector-based style inlining over an html5ever DOM
//! - Literal bullets and ordinals instead of native list counters
//!
//! ## Quick Start
//!
//! ```
//! use inkpress::{Converter, Mode, ConversionRequest, Theme, ThemeStore};
//!
//! let store = ThemeStore::from_themes([Theme::new(
//!     "default",
//!     ":root { --ink: #333; } p { color: var(--ink); } a:hover { color: red; }",
//! )]);
//! let converter = Converter::new(store);
//!
//! let doc = converter.convert(&ConversionRequest::new("Hello", "default", Mode::Publish));
//! assert!(doc.html_fragment.contains(r#"<p style="color:#333">Hello</p>"#));
//! assert_eq!(doc.supplementary_style.as_deref(), Some("a:hover { color: red; }\n"));
//! ```
//!
//! ## Lists
//!
//! ```
//! use inkpress::render_publish;
//!
//! let doc = render_publish("- one\n- two", "");
//! assert!(doc.html_fragment.contains("<li>• one</li>"));
//! assert!(doc.html_fragment.contains(r#"<ul style="list-style:none">"#));
//! ```

pub mod convert;
pub mod css;
pub mod dom;
pub mod error;
pub mod inline;
pub mod lists;
pub mod markdown;
pub mod theme;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use convert::{
    ConversionRequest, Converter, Mode, RenderedDocument, publish_html, render_preview,
    render_publish,
};
pub use error::{Error, Result};
pub use inline::{CONTAINER_ID, inline_styles};
pub use lists::rewrite_list_prefixes;
pub use markdown::render_markdown;
pub use theme::{DEFAULT_THEME_ID, Theme, ThemeInfo, ThemeStore};
