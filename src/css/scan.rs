//! Low-level scanning helpers shared by the hand-written CSS scanners.
//!
//! All delimiters the scanners care about are ASCII, so scanning works on
//! bytes and every index handed back lands on a UTF-8 character boundary.

use memchr::memmem;

/// Quote and parenthesis state for a left-to-right scan.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ScanState {
    in_single: bool,
    in_double: bool,
    paren_depth: u32,
}

impl ScanState {
    pub(crate) fn in_string(&self) -> bool {
        self.in_single || self.in_double
    }

    /// Outside both string kinds and every parenthesis.
    pub(crate) fn at_top_level(&self) -> bool {
        !self.in_string() && self.paren_depth == 0
    }

    /// Update the state for one (non-escape, non-comment) byte.
    pub(crate) fn feed(&mut self, byte: u8) {
        match byte {
            b'\'' if !self.in_double => self.in_single = !self.in_single,
            b'"' if !self.in_single => self.in_double = !self.in_double,
            b'(' if !self.in_string() => self.paren_depth += 1,
            b')' if !self.in_string() => self.paren_depth = self.paren_depth.saturating_sub(1),
            _ => {}
        }
    }
}

/// True if a comment opens at `i`.
pub(crate) fn comment_starts_at(bytes: &[u8], i: usize) -> bool {
    bytes.get(i) == Some(&b'/') && bytes.get(i + 1) == Some(&b'*')
}

/// Index just past the comment opening at `start`.
///
/// An unterminated comment runs to the end of input.
pub(crate) fn skip_comment(bytes: &[u8], start: usize) -> usize {
    let body = start + 2;
    if body >= bytes.len() {
        return bytes.len();
    }
    memmem::find(&bytes[body..], b"*/")
        .map(|offset| body + offset + 2)
        .unwrap_or(bytes.len())
}

/// Index just past the escape sequence whose backslash sits at `start`.
///
/// The escaped character may be multi-byte; the result is kept on a char
/// boundary.
pub(crate) fn skip_escape(text: &str, start: usize) -> usize {
    let mut end = (start + 2).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }
    end
}

/// Index of the `}` closing the block opened at `open`, or the end of input
/// if the block never closes.
pub(crate) fn find_block_end(text: &str, open: usize) -> usize {
    let bytes = text.as_bytes();
    let mut state = ScanState::default();
    let mut depth = 1u32;
    let mut i = open + 1;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'\\' {
            i = skip_escape(text, i);
            continue;
        }
        if !state.in_string() && comment_starts_at(bytes, i) {
            i = skip_comment(bytes, i);
            continue;
        }
        if !state.in_string() {
            match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
        }
        state.feed(byte);
        i += 1;
    }

    bytes.len()
}

/// Split `text` at top-level commas (outside strings, parentheses and
/// attribute brackets).
pub(crate) fn split_top_level_commas(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut state = ScanState::default();
    let mut bracket_depth = 0u32;
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'\\' {
            i = skip_escape(text, i);
            continue;
        }
        if !state.in_string() {
            match byte {
                b'[' => bracket_depth += 1,
                b']' => bracket_depth = bracket_depth.saturating_sub(1),
                b',' if state.at_top_level() && bracket_depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        state.feed(byte);
        i += 1;
    }
    parts.push(&text[start..]);
    parts
}
