use std::fmt;
use std::str::FromStr;

use cssparser::{ParserInput, ToCss};
use precomputed_hash::PrecomputedHash;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{self, ElementSelectorFlags, MatchingContext};
use selectors::parser::{self, ParseRelative, Selector, SelectorParseErrorKind};
use selectors::{Element, OpaqueElement};
use thiserror::Error;

use crate::document::{Document, NodeData, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("invalid selector `{selector}` at column {column}: {reason}")]
    Invalid {
        selector: String,
        column: u32,
        reason: String,
    },
}

/// A comma-separated selector list such as `p,div` or `.card > h3.title`.
///
/// Parsing and matching are done by the `selectors` crate. Pseudo-classes
/// that depend on interaction state (`:hover`, `:focus`) are rejected.
#[derive(Clone)]
pub struct SelectorList {
    source: String,
    selectors: Vec<Selector<DomSelectors>>,
}

impl SelectorList {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let mut input = ParserInput::new(source);
        let mut css = cssparser::Parser::new(&mut input);
        let list = parser::SelectorList::parse(&DomParser, &mut css, ParseRelative::No)
            .map_err(|err| SelectorError::Invalid {
                selector: source.to_string(),
                column: err.location.column,
                reason: format!("{:?}", err.kind),
            })?;
        Ok(Self {
            source: source.to_string(),
            selectors: list.slice().iter().cloned().collect(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Text and document nodes never match.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        if !doc.is_element(node) {
            return false;
        }
        let element = DomElement { doc, node };
        let mut caches = matching::SelectorCaches::default();
        let mut context = MatchingContext::new(
            matching::MatchingMode::Normal,
            None,
            &mut caches,
            matching::QuirksMode::NoQuirks,
            matching::NeedsSelectorFlags::No,
            matching::MatchingForInvalidation::No,
        );
        self.selectors
            .iter()
            .any(|selector| matching::matches_selector(selector, 0, None, &element, &mut context))
    }
}

impl PartialEq for SelectorList {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for SelectorList {}

impl fmt::Debug for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SelectorList").field(&self.source).finish()
    }
}

impl FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Selector vocabulary for the arena document: plain strings, no namespaces
/// and no state pseudo-classes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DomSelectors;

impl parser::SelectorImpl for DomSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssValue;
    type Identifier = CssName;
    type LocalName = CssName;
    type NamespacePrefix = CssName;
    type NamespaceUrl = CssName;
    type BorrowedNamespaceUrl = CssName;
    type BorrowedLocalName = CssName;
    type NonTSPseudoClass = PseudoClass;
    type PseudoElement = PseudoElement;
}

struct DomParser;

impl<'i> parser::Parser<'i> for DomParser {
    type Impl = DomSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

/// Tag, attribute, id and class names as they appear in a selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CssName(String);

impl From<&str> for CssName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl ToCss for CssName {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        cssparser::serialize_identifier(&self.0, dest)
    }
}

impl PrecomputedHash for CssName {
    fn precomputed_hash(&self) -> u32 {
        // FNV-1a; only feeds the ancestor bloom filter.
        self.0.bytes().fold(0x811c_9dc5, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
        })
    }
}

/// Right-hand side of an attribute selector like `[href^="/"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CssValue(String);

impl From<&str> for CssValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for CssValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssValue {
    fn to_css<W>(&self, dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        cssparser::serialize_string(&self.0, dest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PseudoClass {}

impl parser::NonTSPseudoClass for PseudoClass {
    type Impl = DomSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl ToCss for PseudoClass {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PseudoElement {}

impl parser::PseudoElement for PseudoElement {
    type Impl = DomSelectors;
}

impl ToCss for PseudoElement {
    fn to_css<W>(&self, _dest: &mut W) -> fmt::Result
    where
        W: fmt::Write,
    {
        match *self {}
    }
}

/// An element node seen through the `selectors` matching engine.
#[derive(Debug, Clone, Copy)]
struct DomElement<'a> {
    doc: &'a Document,
    node: NodeId,
}

impl<'a> DomElement<'a> {
    fn at(&self, node: NodeId) -> Self {
        Self {
            doc: self.doc,
            node,
        }
    }

    fn tag(&self) -> &'a str {
        self.doc.tag_name(self.node).unwrap_or_default()
    }

    fn sibling_element(&self, step: fn(&Document, NodeId) -> Option<NodeId>) -> Option<Self> {
        let mut current = step(self.doc, self.node);
        while let Some(node) = current {
            if self.doc.is_element(node) {
                return Some(self.at(node));
            }
            current = step(self.doc, node);
        }
        None
    }
}

impl Element for DomElement<'_> {
    type Impl = DomSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.doc.data(self.node))
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc.parent_element(self.node).map(|node| self.at(node))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_element(Document::previous_sibling)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_element(Document::next_sibling)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .children(self.node)
            .iter()
            .find(|&&child| self.doc.is_element(child))
            .map(|&child| self.at(child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssName) -> bool {
        self.tag() == name.0
    }

    fn has_namespace(&self, namespace: &CssName) -> bool {
        namespace.0.is_empty()
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag() == other.tag()
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssName>,
        local_name: &CssName,
        operation: &AttrSelectorOperation<&CssValue>,
    ) -> bool {
        if let NamespaceConstraint::Specific(url) = ns {
            if !url.0.is_empty() {
                return false;
            }
        }
        self.doc
            .attribute(self.node, &local_name.0)
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &PseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.tag() == "a" && self.doc.has_attribute(self.node, "href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &CssName, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .element_id(self.node)
            .is_some_and(|own| case_sensitivity.eq(own.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &CssName, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .classes(self.node)
            .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
    }

    fn has_custom_state(&self, _name: &CssName) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssName) -> Option<CssName> {
        None
    }

    fn is_part(&self, _name: &CssName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc.children(self.node).iter().all(|&child| match self.doc.data(child) {
            NodeData::Text(text) => text.is_empty(),
            _ => false,
        })
    }

    fn is_root(&self) -> bool {
        self.doc
            .parent(self.node)
            .is_some_and(|parent| matches!(self.doc.data(parent), NodeData::Document))
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}
