//! CSS processing for theme stylesheets.
//!
//! The hand-written scanners in this module work on source text and never
//! reformat what they do not touch: variable resolution and pseudo-rule
//! extraction rewrite a stylesheet in place. [`Stylesheet`] then compiles the
//! remaining rules for the inliner.

mod declarations;
mod pseudo;
mod rules;
mod scan;
mod stylesheet;
mod variables;

pub use declarations::{
    CUSTOM_PROPERTY_PREFIX, DeclarationBlock, custom_properties, is_custom_property,
    parse_declarations,
};
pub use pseudo::{
    PSEUDO_MARKERS, PseudoSplit, extract_pseudo_rules, is_pseudo_selector, split_pseudo_rules,
};
pub use rules::{RawRule, find_rule, scan_rules};
pub use stylesheet::{CssRule, Declaration, Specificity, Stylesheet, split_important};
pub use variables::{
    CssVariableTable, MAX_RESOLVE_PASSES, resolve_table, resolve_variables, variable_table,
};
