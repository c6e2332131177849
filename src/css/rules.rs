//! Brace-balanced scanner for top-level CSS rules.
//!
//! Finds `selector { body }` blocks together with the byte span each one
//! occupies, so callers can lift rules out of a stylesheet or cut them away
//! while leaving every other byte untouched.

use std::ops::Range;

use super::scan::{ScanState, comment_starts_at, find_block_end, skip_comment, skip_escape};

/// A rule as it appears in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRule<'a> {
    /// Selector (or at-rule prelude) text, trimmed.
    pub selector: &'a str,
    /// Text between the braces, untrimmed.
    pub body: &'a str,
    /// Byte range from the start of the selector through the closing brace.
    pub span: Range<usize>,
}

impl RawRule<'_> {
    /// True for `@media`, `@font-face` and other at-rule blocks.
    pub fn is_at_rule(&self) -> bool {
        self.selector.starts_with('@')
    }
}

/// Scan the top-level rules of a stylesheet.
///
/// Block-less statements (`@import ...;`) and stray closing braces are
/// skipped. A block that never closes runs to the end of input.
pub fn scan_rules(css: &str) -> Vec<RawRule<'_>> {
    let bytes = css.as_bytes();
    let mut rules = Vec::new();
    let mut state = ScanState::default();
    let mut prelude_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];

        if byte == b'\\' {
            i = skip_escape(css, i);
            continue;
        }

        if !state.in_string() && comment_starts_at(bytes, i) {
            let end = skip_comment(bytes, i);
            // A comment ahead of the selector is not part of it.
            if css[prelude_start..i].trim().is_empty() {
                prelude_start = end;
            }
            i = end;
            continue;
        }

        if state.at_top_level() {
            match byte {
                b'{' => {
                    let close = find_block_end(css, i);
                    let body_end = close.min(bytes.len());
                    rules.push(RawRule {
                        selector: css[prelude_start..i].trim(),
                        body: &css[i + 1..body_end],
                        span: leading_trimmed(css, prelude_start)..(close + 1).min(bytes.len()),
                    });
                    i = (close + 1).min(bytes.len());
                    prelude_start = i;
                    continue;
                }
                b';' | b'}' => {
                    i += 1;
                    prelude_start = i;
                    continue;
                }
                _ => {}
            }
        }

        state.feed(byte);
        i += 1;
    }

    rules
}

/// Find the first rule whose selector is exactly `selector`.
pub fn find_rule<'a>(css: &'a str, selector: &str) -> Option<RawRule<'a>> {
    scan_rules(css)
        .into_iter()
        .find(|rule| rule.selector == selector)
}

/// Advance `start` past leading whitespace.
fn leading_trimmed(css: &str, start: usize) -> usize {
    let rest = &css[start..];
    start + (rest.len() - rest.trim_start().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_simple_rules() {
        let css = "h1 { color: red; }\np, li { margin: 0 }";
        let rules = scan_rules(css);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].selector, "h1");
        assert_eq!(rules[0].body, " color: red; ");
        assert_eq!(&css[rules[0].span.clone()], "h1 { color: red; }");
        assert_eq!(rules[1].selector, "p, li");
    }

    #[test]
    fn test_leading_comment_not_in_selector() {
        let css = "/* heading */ h2 { font-weight: bold }";
        let rules = scan_rules(css);
        assert_eq!(rules[0].selector, "h2");
        assert_eq!(&css[rules[0].span.clone()], "h2 { font-weight: bold }");
    }

    #[test]
    fn test_braces_inside_strings() {
        let css = r#"a::after { content: "{"; } b { color: red }"#;
        let rules = scan_rules(css);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].body, r#" content: "{"; "#);
        assert_eq!(rules[1].selector, "b");
    }

    #[test]
    fn test_at_rules_are_opaque() {
        let css = "@import url(x.css);\n@media print { p { color: black } }\nem { font-style: italic }";
        let rules = scan_rules(css);
        assert_eq!(rules.len(), 2);
        assert!(rules[0].is_at_rule());
        assert_eq!(rules[0].body, " p { color: black } ");
        assert_eq!(rules[1].selector, "em");
    }

    #[test]
    fn test_unterminated_block() {
        let css = "p { color: red; ";
        let rules = scan_rules(css);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].body, " color: red; ");
        assert_eq!(rules[0].span, 0..css.len());
    }

    #[test]
    fn test_find_rule_first_only() {
        let css = ":root { --a: 1px } p {} :root { --a: 2px }";
        let root = find_rule(css, ":root").unwrap();
        assert_eq!(root.body, " --a: 1px ");
        assert_eq!(root.span, 0..18);
    }
}
