//! Custom-property (`var(--x)`) resolution.
//!
//! Inline styles cannot rely on the receiving platform to evaluate CSS
//! variables, so the variables declared in a theme's `:root` block are
//! substituted throughout the stylesheet and the `:root` block is dropped.

use std::collections::BTreeMap;

use tracing::debug;

use super::declarations::custom_properties;
use super::rules::find_rule;
use super::scan::{ScanState, skip_escape};

/// Upper bound on resolution passes over the variable table; see
/// [`resolve_table`].
pub const MAX_RESOLVE_PASSES: usize = 5;

/// Variable name (with the `--` prefix) to raw value.
pub type CssVariableTable = BTreeMap<String, String>;

/// How a `var()` reference should be treated during substitution.
enum Lookup<'t> {
    /// Replace the reference with this text.
    Value(&'t str),
    /// Known name, but not ready to substitute yet.
    Defer,
    /// Not in the table; use the fallback if one was given.
    Unknown,
}

/// A `var(...)` occurrence in some text.
struct VarReference<'a> {
    range: std::ops::Range<usize>,
    name: &'a str,
    fallback: Option<&'a str>,
}

/// Resolve the variables of the first `:root` block throughout `css`.
///
/// Returns `css` unchanged when there is no `:root` block or it declares no
/// custom properties. References to unknown names without a fallback are
/// left as literal text.
///
/// ```
/// use inkpress::css::resolve_variables;
///
/// let css = ":root { --brand: #c00; --link: var(--brand); }\na { color: var(--link); }";
/// assert_eq!(resolve_variables(css).trim(), "a { color: #c00; }");
/// ```
pub fn resolve_variables(css: &str) -> String {
    let Some(root) = find_rule(css, ":root") else {
        return css.to_string();
    };

    let mut table = variable_table(root.body);
    if table.is_empty() {
        debug!("`:root` declares no custom properties; leaving stylesheet as is");
        return css.to_string();
    }
    let passes = resolve_table(&mut table);
    debug!(variables = table.len(), passes, "resolved css variables");

    let mut stripped = String::with_capacity(css.len());
    stripped.push_str(&css[..root.span.start]);
    stripped.push_str(&css[root.span.end..]);

    substitute(&stripped, &mut |name| match table.get(name) {
        Some(value) => Lookup::Value(value),
        None => Lookup::Unknown,
    })
    .0
}

/// Build the variable table from a `:root` block body.
pub fn variable_table(root_body: &str) -> CssVariableTable {
    custom_properties(root_body)
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Resolve references between table entries in place.
///
/// A reference is substituted only once the referenced value is itself free
/// of references to known names, so self-references and cycles never
/// change and the loop stops. Returns the number of passes that made
/// substitutions.
pub fn resolve_table(table: &mut CssVariableTable) -> usize {
    let mut passes = 0;

    for _ in 0..MAX_RESOLVE_PASSES {
        let snapshot = table.clone();
        let mut changed = false;

        for value in table.values_mut() {
            if !has_reference(value) {
                continue;
            }
            let (resolved, substituted) = substitute(value, &mut |name| match snapshot.get(name) {
                Some(target) if references_known(target, &snapshot) => Lookup::Defer,
                Some(target) => Lookup::Value(target),
                None => Lookup::Unknown,
            });
            if substituted {
                *value = resolved;
                changed = true;
            }
        }

        if !changed {
            break;
        }
        passes += 1;
    }

    passes
}

/// True if `text` contains a `var()` reference to a name in `table`.
fn references_known(text: &str, table: &CssVariableTable) -> bool {
    references(text)
        .iter()
        .any(|reference| table.contains_key(reference.name))
}

fn has_reference(text: &str) -> bool {
    !references(text).is_empty()
}

/// Replace `var()` references in `text` according to `lookup`.
///
/// Returns the new text and whether anything was replaced. Fallback text is
/// itself substituted before use.
fn substitute<'t>(text: &str, lookup: &mut dyn FnMut(&str) -> Lookup<'t>) -> (String, bool) {
    let found = references(text);
    if found.is_empty() {
        return (text.to_string(), false);
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut changed = false;

    for reference in found {
        let replacement = match lookup(reference.name) {
            Lookup::Value(value) => Some(value.to_string()),
            Lookup::Defer => None,
            Lookup::Unknown => reference
                .fallback
                .map(|fallback| substitute(fallback, lookup).0),
        };
        if let Some(replacement) = replacement {
            out.push_str(&text[cursor..reference.range.start]);
            out.push_str(&replacement);
            cursor = reference.range.end;
            changed = true;
        }
    }

    out.push_str(&text[cursor..]);
    (out, changed)
}

/// Find the outermost `var(--name[, fallback])` references in `text`.
///
/// Quoted strings are skipped. Malformed references are not reported.
fn references(text: &str) -> Vec<VarReference<'_>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i = skip_escape(text, i);
            }
            quote @ (b'"' | b'\'') => {
                i = skip_string(text, i, quote);
            }
            b'v' | b'V' if starts_var_function(bytes, i) => match parse_reference(text, i) {
                Some(reference) => {
                    i = reference.range.end;
                    found.push(reference);
                }
                None => i += 4,
            },
            _ => i += 1,
        }
    }

    found
}

fn starts_var_function(bytes: &[u8], i: usize) -> bool {
    let Some(head) = bytes.get(i..i + 4) else {
        return false;
    };
    if !head[..3].eq_ignore_ascii_case(b"var") || head[3] != b'(' {
        return false;
    }
    // `somevar(` is a different function.
    i == 0 || !is_ident_byte(bytes[i - 1])
}

/// Parse the reference whose `var(` starts at `start`.
fn parse_reference(text: &str, start: usize) -> Option<VarReference<'_>> {
    let bytes = text.as_bytes();
    let mut i = skip_whitespace(bytes, start + 4);

    let name_start = i;
    if bytes.get(i..i + 2) != Some(b"--") {
        return None;
    }
    i += 2;
    while i < bytes.len() && is_ident_byte(bytes[i]) {
        i += 1;
    }
    let name = &text[name_start..i];
    i = skip_whitespace(bytes, i);

    match bytes.get(i)? {
        b')' => Some(VarReference {
            range: start..i + 1,
            name,
            fallback: None,
        }),
        b',' => {
            let fallback_start = i + 1;
            let close = find_closing_paren(text, fallback_start)?;
            Some(VarReference {
                range: start..close + 1,
                name,
                fallback: Some(text[fallback_start..close].trim()),
            })
        }
        _ => None,
    }
}

/// Index of the `)` that closes a group whose contents start at `from`.
fn find_closing_paren(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut state = ScanState::default();
    let mut i = from;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'\\' {
            i = skip_escape(text, i);
            continue;
        }
        if byte == b')' && state.at_top_level() {
            return Some(i);
        }
        state.feed(byte);
        i += 1;
    }
    None
}

/// Index just past the string whose opening quote sits at `start`.
fn skip_string(text: &str, start: usize, quote: u8) -> usize {
    let bytes = text.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i = skip_escape(text, i),
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_css(depth: usize) -> String {
        let mut css = String::from(":root { --v0: red;");
        for level in 1..=depth {
            css.push_str(&format!(" --v{level}: var(--v{});", level - 1));
        }
        css.push_str(&format!(" }}\np {{ color: var(--v{depth}); }}"));
        css
    }

    #[test]
    fn test_simple_substitution() {
        let css = ":root { --text: #333; }\np { color: var(--text); }";
        assert_eq!(resolve_variables(css), "\np { color: #333; }");
    }

    #[test]
    fn test_root_block_removed() {
        let css = "h1 { margin: 0 }\n:root { --x: 1px; }\nh2 { padding: var(--x) }";
        let resolved = resolve_variables(css);
        assert!(!resolved.contains(":root"));
        assert!(resolved.contains("h1 { margin: 0 }"));
        assert!(resolved.contains("h2 { padding: 1px }"));
    }

    #[test]
    fn test_no_root_is_noop() {
        let css = "p { color: var(--missing); }";
        assert_eq!(resolve_variables(css), css);
    }

    #[test]
    fn test_empty_root_is_noop() {
        let css = ":root { }\np { color: red; }";
        assert_eq!(resolve_variables(css), css);
    }

    #[test]
    fn test_unknown_reference_left_literal() {
        let css = ":root { --a: 1px; }\np { margin: var(--nope) var(--a); }";
        assert_eq!(resolve_variables(css), "\np { margin: var(--nope) 1px; }");
    }

    #[test]
    fn test_unknown_reference_with_fallback() {
        let css = ":root { --a: 1px; }\np { margin: var(--nope, 2px) var(--a, 9px); }";
        assert_eq!(resolve_variables(css), "\np { margin: 2px 1px; }");
    }

    #[test]
    fn test_nested_fallback() {
        let css = ":root { --b: blue; }\np { color: var(--a, var(--b)); }";
        assert_eq!(resolve_variables(css), "\np { color: blue; }");
    }

    #[test]
    fn test_chain_within_cap_resolves() {
        let resolved = resolve_variables(&chain_css(MAX_RESOLVE_PASSES));
        assert_eq!(resolved.trim(), "p { color: red; }");
    }

    #[test]
    fn test_chain_beyond_cap_stays_partial() {
        let resolved = resolve_variables(&chain_css(MAX_RESOLVE_PASSES + 2));
        assert!(resolved.contains("var(--v"));
        assert!(!resolved.contains("red"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let mut table: CssVariableTable = [("--a".to_string(), "var(--a)".to_string())].into();
        assert_eq!(resolve_table(&mut table), 0);
        assert_eq!(table["--a"], "var(--a)");
    }

    #[test]
    fn test_cycle_terminates() {
        let css = ":root { --a: var(--b); --b: var(--a); --c: 3px; }\np { x: var(--a); y: var(--c) }";
        let resolved = resolve_variables(css);
        assert!(resolved.contains("x: var(--b)"));
        assert!(resolved.contains("y: 3px"));
    }

    #[test]
    fn test_reference_inside_data_url_value() {
        let css = ":root { --icon: url(\"data:image/svg+xml;utf8,<svg/>\"); }\nli { background: var(--icon) no-repeat; }";
        assert_eq!(
            resolve_variables(css).trim(),
            "li { background: url(\"data:image/svg+xml;utf8,<svg/>\") no-repeat; }"
        );
    }

    #[test]
    fn test_strings_and_similar_functions_untouched() {
        let css = ":root { --a: 1; }\np { content: \"var(--a)\"; x: myvar(--a); y: VAR( --a ); }";
        let resolved = resolve_variables(css);
        assert!(resolved.contains("content: \"var(--a)\""));
        assert!(resolved.contains("x: myvar(--a)"));
        assert!(resolved.contains("y: 1"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let once = resolve_variables(":root { --a: red; }\np { color: var(--a); }");
        assert_eq!(resolve_variables(&once), once);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn resolution_always_terminates(
            edges in proptest::collection::vec((0usize..6, 0usize..6), 0..12)
        ) {
            let mut table = CssVariableTable::new();
            for i in 0..6 {
                table.insert(format!("--v{i}"), format!("{i}px"));
            }
            for (from, to) in edges {
                table.insert(format!("--v{from}"), format!("var(--v{to})"));
            }
            let passes = resolve_table(&mut table);
            prop_assert!(passes <= MAX_RESOLVE_PASSES);
        }

        #[test]
        fn resolved_documents_are_fixed_points(value in "[a-z0-9 #]{1,12}") {
            let css = format!(":root {{ --a: {value}; }}\np {{ color: var(--a); }}");
            let once = resolve_variables(&css);
            prop_assert_eq!(resolve_variables(&once), once);
        }
    }
}
