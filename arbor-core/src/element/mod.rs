//! Element Model
//!
//! Elements are immutable descriptions of what the output tree should look
//! like. They are cheap to clone (reference counted) and are rebuilt on every
//! render; the reconciler compares them against the fibers of the previous
//! commit.
//!
//! # Children
//!
//! Children are accepted as [`Child`] values so that component code can mix
//! elements, strings, numbers and conditionals:
//!
//! - strings and numbers become text elements
//! - `None` and booleans are dropped
//! - one level of list nesting is flattened into the parent; deeper lists are
//!   wrapped in fragments

mod component;
mod props;

use std::fmt;
use std::sync::Arc;

use crate::error::ElementError;

pub use component::{Component, RenderResult};
pub use props::{event_name, Event, EventHandler, PropValue, Props};

/// Attribute holding the content of a text element.
pub const TEXT_VALUE: &str = "nodeValue";

/// The kind of an element, resolved once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    /// A host node such as `div`.
    Host(Arc<str>),
    /// A function component.
    Component(Component),
    /// Groups children without an output node of its own.
    Fragment,
    /// A text node; its content lives in the [`TEXT_VALUE`] prop.
    Text,
}

impl ElementType {
    /// Short label used in logs and reconciliation keys.
    pub fn label(&self) -> &str {
        match self {
            Self::Host(tag) => tag,
            Self::Component(c) => c.name(),
            Self::Fragment => "#fragment",
            Self::Text => "#text",
        }
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_) | Self::Text)
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        Self::Host(Arc::from(tag))
    }
}

impl From<String> for ElementType {
    fn from(tag: String) -> Self {
        Self::Host(Arc::from(tag))
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        Self::Component(component)
    }
}

/// Explicit reconciliation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(Arc<str>);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self(Arc::from(value.to_string()))
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Self(Arc::from(value.to_string()))
    }
}

struct ElementData {
    ty: ElementType,
    key: Option<Key>,
    props: Arc<Props>,
}

/// An immutable node description.
#[derive(Clone)]
pub struct Element(Arc<ElementData>);

impl Element {
    fn from_parts(ty: ElementType, key: Option<Key>, props: Props) -> Self {
        Self(Arc::new(ElementData {
            ty,
            key,
            props: Arc::new(props),
        }))
    }

    /// A text element.
    pub fn text(value: impl Into<String>) -> Self {
        let props = Props::new().attr(TEXT_VALUE, value.into());
        Self::from_parts(ElementType::Text, None, props)
    }

    /// A fragment wrapping `children`.
    pub fn fragment(children: impl IntoIterator<Item = Child>) -> Self {
        create_element(ElementType::Fragment, Props::new(), children)
    }

    /// An element that renders nothing.
    pub fn empty() -> Self {
        Self::fragment(Vec::new())
    }

    pub fn element_type(&self) -> &ElementType {
        &self.0.ty
    }

    pub fn key(&self) -> Option<&Key> {
        self.0.key.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.0.props
    }

    pub(crate) fn shared_props(&self) -> Arc<Props> {
        Arc::clone(&self.0.props)
    }

    pub fn children(&self) -> &[Element] {
        self.0.props.children()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("type", &self.0.ty.label());
        if let Some(key) = &self.0.key {
            s.field("key", key);
        }
        s.field("props", &self.0.props).finish()
    }
}

/// Anything that may appear in a children list.
#[derive(Debug, Clone)]
pub enum Child {
    Element(Element),
    Text(String),
    Bool(bool),
    Empty,
    List(Vec<Child>),
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<usize> for Child {
    fn from(value: usize) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Self::Text(props::format_number(value))
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

fn push_leaf(out: &mut Vec<Element>, child: Child) {
    match child {
        Child::Element(el) => out.push(el),
        Child::Text(text) => out.push(Element::text(text)),
        Child::Bool(_) | Child::Empty => {}
        Child::List(items) => out.push(Element::fragment(items)),
    }
}

fn normalize_children(children: impl IntoIterator<Item = Child>) -> Vec<Element> {
    let mut out = Vec::new();
    for child in children {
        match child {
            Child::List(items) => {
                for item in items {
                    push_leaf(&mut out, item);
                }
            }
            other => push_leaf(&mut out, other),
        }
    }
    out
}

/// Check that a host tag can name an output node.
pub fn validate_type(ty: &ElementType) -> Result<(), ElementError> {
    let ElementType::Host(tag) = ty else {
        return Ok(());
    };
    let mut chars = tag.chars();
    let Some(first) = chars.next() else {
        return Err(ElementError::EmptyTag);
    };
    if !first.is_ascii_alphabetic() {
        return Err(ElementError::InvalidTag {
            tag: tag.to_string(),
            reason: "must start with an ASCII letter",
        });
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':' || c == '.') {
        return Err(ElementError::InvalidTag {
            tag: tag.to_string(),
            reason: "may only contain letters, digits, `-`, `:` and `.`",
        });
    }
    Ok(())
}

fn build(ty: ElementType, mut props: Props, children: impl IntoIterator<Item = Child>) -> Element {
    let key = props
        .remove("key")
        .and_then(|v| v.to_attribute())
        .map(Key::from);
    props.set_children(normalize_children(children));
    Element::from_parts(ty, key, props)
}

/// Build an element. Invalid host tags are logged and passed through.
pub fn create_element(
    ty: impl Into<ElementType>,
    props: Props,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let ty = ty.into();
    if let Err(err) = validate_type(&ty) {
        tracing::warn!(error = %err, "creating element with invalid type");
    }
    build(ty, props, children)
}

/// Build an element, rejecting invalid host tags.
pub fn try_create_element(
    ty: impl Into<ElementType>,
    props: Props,
    children: impl IntoIterator<Item = Child>,
) -> Result<Element, ElementError> {
    let ty = ty.into();
    validate_type(&ty)?;
    Ok(build(ty, props, children))
}

/// Copy `element` with `overrides` merged over its props.
///
/// Passing no children keeps the original ones; passing any replaces them.
/// A `key` in `overrides` replaces the element's key.
pub fn clone_element(
    element: &Element,
    overrides: Props,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let mut props = Props::clone(element.props());
    let mut overrides = overrides;
    let key = overrides
        .remove("key")
        .and_then(|v| v.to_attribute())
        .map(Key::from)
        .or_else(|| element.key().cloned());
    props.merge(&overrides);

    let children: Vec<Child> = children.into_iter().collect();
    if !children.is_empty() {
        props.set_children(normalize_children(children));
    }
    Element::from_parts(element.element_type().clone(), key, props)
}

/// Whether `child` is an element with a well-formed type.
pub fn is_valid_element(child: &Child) -> bool {
    match child {
        Child::Element(el) => validate_type(el.element_type()).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(children: &[Element]) -> Vec<String> {
        children.iter().map(|c| c.element_type().label().to_string()).collect()
    }

    #[test]
    fn children_are_normalized() {
        let el = create_element(
            "ul",
            Props::new(),
            [
                Child::from("hello"),
                Child::from(42),
                Child::from(None::<Element>),
                Child::from(false),
                Child::from(vec![
                    create_element("li", Props::new(), []),
                    create_element("li", Props::new(), []),
                ]),
            ],
        );
        assert_eq!(tags(el.children()), vec!["#text", "#text", "li", "li"]);
        assert_eq!(el.children()[1].props().get_str(TEXT_VALUE), Some("42"));
    }

    #[test]
    fn deeply_nested_lists_become_fragments() {
        let inner = Child::List(vec![Child::from("a"), Child::from("b")]);
        let el = create_element("div", Props::new(), [Child::List(vec![inner])]);
        assert_eq!(tags(el.children()), vec!["#fragment"]);
        assert_eq!(el.children()[0].children().len(), 2);
    }

    #[test]
    fn key_is_lifted_out_of_props() {
        let el = create_element("li", Props::new().key(7).attr("class", "row"), []);
        assert_eq!(el.key().map(Key::as_str), Some("7"));
        assert!(el.props().get("key").is_none());
        assert_eq!(el.props().get_str("class"), Some("row"));
    }

    #[test]
    fn strict_construction_rejects_bad_tags() {
        assert_eq!(
            try_create_element("", Props::new(), []).unwrap_err(),
            ElementError::EmptyTag
        );
        assert!(matches!(
            try_create_element("1div", Props::new(), []),
            Err(ElementError::InvalidTag { .. })
        ));
        assert!(try_create_element("my-widget", Props::new(), []).is_ok());

        // Permissive construction still produces the element.
        let el = create_element("bad tag", Props::new(), []);
        assert!(!is_valid_element(&Child::from(el)));
    }

    #[test]
    fn clone_merges_props_and_keeps_children() {
        let original = create_element(
            "a",
            Props::new().attr("href", "/").attr("class", "link").key("k"),
            [Child::from("home")],
        );
        let copy = clone_element(&original, Props::new().attr("class", "active"), []);
        assert_eq!(copy.props().get_str("href"), Some("/"));
        assert_eq!(copy.props().get_str("class"), Some("active"));
        assert_eq!(copy.key().map(Key::as_str), Some("k"));
        assert!(copy.children()[0].ptr_eq(&original.children()[0]));

        let replaced = clone_element(&original, Props::new(), [Child::from("away")]);
        assert_eq!(replaced.children()[0].props().get_str(TEXT_VALUE), Some("away"));
        assert_eq!(original.props().get_str("class"), Some("link"));
    }

    #[test]
    fn only_elements_are_valid() {
        assert!(is_valid_element(&Child::from(Element::text("x"))));
        assert!(!is_valid_element(&Child::from("x")));
        assert!(!is_valid_element(&Child::Empty));
    }
}
