//! WASM bindings for in-browser conversion.
//!
//! Themes are supplied by the caller as CSS text; there is no theme
//! directory in the browser.

use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Render Markdown for preview, with `css` in a leading `<style>` block.
#[wasm_bindgen]
pub fn render_preview(markdown: &str, css: &str) -> String {
    crate::convert::render_preview(markdown, css)
}

/// Render Markdown as an inline-styled fragment.
///
/// Rules that cannot be inlined are emitted in a `<style>` block ahead of
/// the fragment.
#[wasm_bindgen]
pub fn render_publish(markdown: &str, css: &str) -> String {
    crate::convert::render_publish(markdown, css).to_html()
}

/// Inline `css` into an existing HTML fragment.
#[wasm_bindgen]
pub fn publish_html(html: &str, css: &str) -> String {
    crate::convert::publish_html(html, css).to_html()
}
