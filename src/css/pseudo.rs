//! Separation of rules that cannot be expressed as inline styles.
//!
//! Pseudo-elements and state pseudo-classes have no `style` attribute
//! equivalent. Rules keyed on them are lifted out verbatim so they can be
//! delivered in a `<style>` block next to the inlined fragment, and the
//! remaining CSS goes to the inliner.

use super::rules::scan_rules;
use super::scan::split_top_level_commas;

/// Selector fragments that mark a rule as non-inlineable.
pub const PSEUDO_MARKERS: &[&str] = &[
    "::before",
    "::after",
    ":before",
    ":after",
    ":nth-child",
    ":hover",
    ":focus",
];

/// Result of [`split_pseudo_rules`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PseudoSplit {
    /// The stylesheet with pseudo rules removed.
    pub inlineable: String,
    /// The pseudo rules, one `selector {body}` per line.
    pub pseudo: String,
}

/// Check if a selector uses one of the [`PSEUDO_MARKERS`].
pub fn is_pseudo_selector(selector: &str) -> bool {
    let lowered = selector.to_ascii_lowercase();
    PSEUDO_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Collect the pseudo rules of `css` verbatim.
pub fn extract_pseudo_rules(css: &str) -> String {
    split_pseudo_rules(css).pseudo
}

/// Split `css` into inlineable CSS and pseudo rules.
///
/// Rules with an empty body are dropped from both outputs. For a selector
/// list that mixes pseudo and plain selectors the whole rule goes to
/// `pseudo` unchanged, and the plain selectors keep the body in
/// `inlineable`. At-rule blocks are left in `inlineable`.
///
/// ```
/// use inkpress::css::split_pseudo_rules;
///
/// let split = split_pseudo_rules("a { color: red; }\na:hover { color: blue; }");
/// assert_eq!(split.inlineable.trim(), "a { color: red; }");
/// assert_eq!(split.pseudo.trim(), "a:hover { color: blue; }");
/// ```
pub fn split_pseudo_rules(css: &str) -> PseudoSplit {
    let mut split = PseudoSplit::default();
    let mut cursor = 0;

    for rule in scan_rules(css) {
        if rule.is_at_rule() || !is_pseudo_selector(rule.selector) {
            continue;
        }

        split.inlineable.push_str(&css[cursor..rule.span.start]);
        cursor = rule.span.end;

        if rule.body.trim().is_empty() {
            continue;
        }

        split.pseudo.push_str(rule.selector);
        split.pseudo.push_str(" {");
        split.pseudo.push_str(rule.body);
        split.pseudo.push_str("}\n");

        let plain: Vec<&str> = split_top_level_commas(rule.selector)
            .into_iter()
            .map(str::trim)
            .filter(|selector| !selector.is_empty() && !is_pseudo_selector(selector))
            .collect();
        if !plain.is_empty() {
            split.inlineable.push_str(&plain.join(", "));
            split.inlineable.push_str(" {");
            split.inlineable.push_str(rule.body);
            split.inlineable.push('}');
        }
    }

    split.inlineable.push_str(&css[cursor..]);
    split
}
