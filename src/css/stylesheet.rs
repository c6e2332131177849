//! Stylesheet parsing and the cascade used by the inliner.
//!
//! Selectors are compiled with the `selectors` crate so they can be matched
//! against the arena DOM. Declaration values are kept as raw source text:
//! the inliner copies them into `style` attributes verbatim.

use std::cmp::Ordering;

use cssparser::{
    AtRuleParser, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser,
};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::parser::Selector;

use super::declarations::{DeclarationBlock, is_custom_property};
use crate::dom::{ElementRef, InkSelectors};

/// A parsed stylesheet.
#[derive(Debug, Default, Clone)]
pub struct Stylesheet {
    pub rules: Vec<CssRule>,
}

/// A style rule with its compiled selector list.
#[derive(Debug, Clone)]
pub struct CssRule {
    pub selectors: Vec<(Selector<InkSelectors>, Specificity)>,
    pub declarations: Vec<Declaration>,
}

/// A declaration whose value is the source text, minus `!important`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// CSS specificity for cascade ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Specificity {
    pub ids: u16,
    pub classes: u16,
    pub elements: u16,
}

impl Specificity {
    pub fn from_selector(selector: &Selector<InkSelectors>) -> Self {
        let spec = selector.specificity();
        // selectors packs specificity as (id << 20) | (class << 10) | elements
        Self {
            ids: ((spec >> 20) & 0x3FF) as u16,
            classes: ((spec >> 10) & 0x3FF) as u16,
            elements: (spec & 0x3FF) as u16,
        }
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ids
            .cmp(&other.ids)
            .then(self.classes.cmp(&other.classes))
            .then(self.elements.cmp(&other.elements))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A declaration that applies to an element, with its cascade key.
#[derive(Debug)]
struct MatchedDeclaration<'a> {
    declaration: &'a Declaration,
    specificity: Specificity,
    order: usize,
}

impl Stylesheet {
    /// Parse a stylesheet.
    ///
    /// Parsing is lenient: a rule whose selector list does not compile is
    /// dropped, and at-rules (`@media`, `@keyframes`, ...) are skipped with
    /// their blocks.
    pub fn parse(css: &str) -> Self {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rules = Vec::new();

        let mut rule_parser = TopLevelRuleParser { rules: &mut rules };
        for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
            if let Err((_, source)) = result {
                tracing::debug!(rule = source.trim(), "skipping unsupported css rule");
            }
        }

        Self { rules }
    }

    /// Concatenate the rules of `other` after the rules of `self`.
    pub fn extend(&mut self, other: Stylesheet) {
        self.rules.extend(other.rules);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declarations applying to `elem`, in cascade order.
    ///
    /// Sorted by `!important`, then the highest matching specificity of the
    /// rule, then source order, and applied last-write-wins. Custom
    /// properties are not carried into the result.
    pub fn matched_declarations(&self, elem: ElementRef<'_>) -> DeclarationBlock {
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );

        let mut matched = Vec::new();
        let mut order = 0;
        for rule in &self.rules {
            let specificity = rule
                .selectors
                .iter()
                .filter(|(selector, _)| {
                    selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
                })
                .map(|(_, specificity)| *specificity)
                .max();

            let Some(specificity) = specificity else {
                order += rule.declarations.len();
                continue;
            };
            for declaration in &rule.declarations {
                matched.push(MatchedDeclaration {
                    declaration,
                    specificity,
                    order,
                });
                order += 1;
            }
        }

        matched.sort_by(|a, b| {
            a.declaration
                .important
                .cmp(&b.declaration.important)
                .then(a.specificity.cmp(&b.specificity))
                .then(a.order.cmp(&b.order))
        });

        let mut block = DeclarationBlock::new();
        for m in matched {
            if is_custom_property(&m.declaration.property) {
                continue;
            }
            block.set(m.declaration.property.as_str(), m.declaration.value.as_str());
        }
        block
    }
}

/// Split a trailing `!important` off a raw value.
///
/// ```
/// use inkpress::css::split_important;
///
/// assert_eq!(split_important("red ! IMPORTANT"), ("red", true));
/// assert_eq!(split_important("url(a.png)"), ("url(a.png)", false));
/// ```
pub fn split_important(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim_end();
    let keyword = "important";
    if trimmed.len() < keyword.len() {
        return (raw.trim(), false);
    }
    let (head, tail) = trimmed.split_at(trimmed.len() - keyword.len());
    if !tail.eq_ignore_ascii_case(keyword) {
        return (raw.trim(), false);
    }
    match head.trim_end().strip_suffix('!') {
        Some(value) => (value.trim(), true),
        None => (raw.trim(), false),
    }
}

struct TopLevelRuleParser<'a> {
    rules: &'a mut Vec<CssRule>,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = Vec<Selector<InkSelectors>>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        parse_selector_list(input)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut declarations = Vec::new();
        let mut decl_parser = DeclarationListParser {
            declarations: &mut declarations,
        };
        for result in RuleBodyParser::new(input, &mut decl_parser) {
            if let Err((_, source)) = result {
                tracing::debug!(declaration = source.trim(), "skipping malformed declaration");
            }
        }

        let selectors = prelude
            .into_iter()
            .map(|selector| {
                let specificity = Specificity::from_selector(&selector);
                (selector, specificity)
            })
            .collect();
        self.rules.push(CssRule {
            selectors,
            declarations,
        });
        Ok(())
    }
}

fn parse_selector_list<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<Vec<Selector<InkSelectors>>, ParseError<'i, ()>> {
    let location = parser.current_source_location();
    let selectors = selectors::parser::SelectorList::parse(
        &InkSelectors,
        parser,
        selectors::parser::ParseRelative::No,
    )
    .map_err(|_| location.new_custom_error(()))?;

    Ok(selectors.slice().to_vec())
}

struct DeclarationListParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: cssparser::CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let (value, important) = split_important(input.slice_from(start));
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }

        let property = if is_custom_property(&name) {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        self.declarations.push(Declaration {
            property,
            value: value.to_string(),
            important,
        });
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}
