//! Declaration tokenizer for CSS block bodies.
//!
//! Splits the text between a rule's braces into `(property, value)` pairs.
//! A `;` only ends a declaration outside quoted strings and parentheses, so
//! values such as `url("a;b.png")` or `url(data:image/svg+xml;utf8,...)` come
//! through whole. Values are kept as raw source text.

use std::fmt;

use super::scan::{ScanState, comment_starts_at, skip_comment, skip_escape};

/// Prefix that marks a custom property (`--accent`).
pub const CUSTOM_PROPERTY_PREFIX: &str = "--";

/// An ordered set of declarations where a repeated property overwrites the
/// earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    entries: Vec<(String, String)>,
}

impl DeclarationBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Set a property, replacing any earlier value (last write wins).
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        let property = property.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == property) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((property, value)),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let index = self.entries.iter().position(|(name, _)| name == property)?;
        Some(self.entries.remove(index).1)
    }

    /// Keep only the declarations for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &str) -> bool,
    {
        self.entries.retain(|(name, value)| keep(name, value));
    }

    /// Overlay `other` onto this block; `other` wins on conflicts.
    pub fn merge(&mut self, other: &DeclarationBlock) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Formats as a compact `style` attribute value: `color:red;margin:0`.
impl fmt::Display for DeclarationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{name}:{value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DeclarationBlock {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut block = Self::new();
        for (name, value) in iter {
            block.set(name, value);
        }
        block
    }
}

/// Check if a property name is a custom property.
pub fn is_custom_property(name: &str) -> bool {
    name.starts_with(CUSTOM_PROPERTY_PREFIX)
}

/// Tokenize a block body (or a `style` attribute) into declarations.
///
/// Comments are skipped as whitespace; an unterminated comment swallows the
/// rest of the input. Non-custom property names are ASCII-lowercased.
///
/// ```
/// use inkpress::css::parse_declarations;
///
/// let block = parse_declarations(r#"background: url("a;b.png"); color: red"#);
/// assert_eq!(block.get("background"), Some(r#"url("a;b.png")"#));
/// assert_eq!(block.get("color"), Some("red"));
/// ```
pub fn parse_declarations(body: &str) -> DeclarationBlock {
    let mut block = DeclarationBlock::new();
    for raw in split_declarations(body) {
        if let Some((name, value)) = split_property(&raw) {
            block.set(name, value);
        }
    }
    block
}

/// Only the custom properties (`--name`) of a block body.
pub fn custom_properties(body: &str) -> DeclarationBlock {
    let mut block = parse_declarations(body);
    block.retain(|name, _| is_custom_property(name));
    block
}

/// Cut a block body into raw declaration texts with comments removed.
fn split_declarations(body: &str) -> Vec<String> {
    let bytes = body.as_bytes();
    let mut state = ScanState::default();
    let mut declarations = Vec::new();
    let mut current = String::new();
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];

        if byte == b'\\' {
            i = skip_escape(body, i);
            continue;
        }

        if !state.in_string() && comment_starts_at(bytes, i) {
            current.push_str(&body[segment_start..i]);
            current.push(' ');
            i = skip_comment(bytes, i);
            segment_start = i;
            continue;
        }

        if byte == b';' && state.at_top_level() {
            current.push_str(&body[segment_start..i]);
            declarations.push(std::mem::take(&mut current));
            i += 1;
            segment_start = i;
            continue;
        }

        state.feed(byte);
        i += 1;
    }

    current.push_str(&body[segment_start.min(bytes.len())..]);
    declarations.push(current);
    declarations
}

/// Split one declaration at its first `:`.
fn split_property(raw: &str) -> Option<(String, String)> {
    let colon = raw.find(':')?;
    let name = raw[..colon].trim();
    let value = raw[colon + 1..].trim();
    if name.is_empty() {
        return None;
    }
    if is_custom_property(name) {
        return Some((name.to_string(), value.to_string()));
    }
    if value.is_empty() {
        return None;
    }
    Some((name.to_ascii_lowercase(), value.to_string()))
}
