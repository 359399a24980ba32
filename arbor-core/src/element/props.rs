//! Element properties
//!
//! Props are the attribute bag carried by an element plus its normalized
//! children. Attribute order is preserved so that host bindings see a stable
//! sequence of mutations.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::Element;

/// A synthetic event delivered to a handler prop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Lowercase event name, e.g. `click`.
    pub name: String,
    /// Optional payload supplied by the host, e.g. the new value of an input.
    pub detail: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Listener attached to an output node.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// The value of a single prop.
#[derive(Clone)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Inline style, merged property by property by the host binding.
    Style(IndexMap<String, String>),
    /// Event listener. Compared by identity.
    Handler(EventHandler),
}

impl PropValue {
    /// Identity comparison in the sense of `Object.is`: scalars by value,
    /// floats by bit pattern, handlers by pointer.
    pub fn same_value(&self, other: &PropValue) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Style(a), Self::Style(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }

    /// Render the value as an attribute string. Handlers have no attribute form.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(format_number(*f)),
            Self::Bool(b) => Some(b.to_string()),
            Self::Style(map) => Some(
                map.iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Self::Handler(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Style(map) => f.debug_map().entries(map.iter()).finish(),
            Self::Handler(h) => write!(f, "<handler {:p}>", Arc::as_ptr(h)),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<EventHandler> for PropValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

/// Format a number the way it reads in text content: integral values have no
/// fractional part.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Convert a handler prop name such as `onClick` to its event name (`click`).
pub fn event_name(prop: &str) -> Option<String> {
    let rest = prop.strip_prefix("on")?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_ascii_lowercase())
}

/// Attributes and children of an element.
#[derive(Clone, Default)]
pub struct Props {
    attrs: IndexMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Builder: set the reconciliation key.
    pub fn key(self, key: impl fmt::Display) -> Self {
        self.attr("key", key.to_string())
    }

    /// Builder: set one inline style property.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        let entry = self
            .attrs
            .entry("style".to_string())
            .or_insert_with(|| PropValue::Style(IndexMap::new()));
        if let PropValue::Style(map) = entry {
            map.insert(property.into(), value.into());
        } else {
            let mut map = IndexMap::new();
            map.insert(property.into(), value.into());
            *entry = PropValue::Style(map);
        }
        self
    }

    /// Builder: attach a listener for `event` (stored as `on<Event>`).
    pub fn on<F>(self, event: &str, handler: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handler(event, Arc::new(handler))
    }

    /// Builder: attach an existing handler, keeping its identity.
    pub fn handler(self, event: &str, handler: EventHandler) -> Self {
        let mut name = String::with_capacity(event.len() + 2);
        name.push_str("on");
        let mut chars = event.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
        self.attr(name, PropValue::Handler(handler))
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(PropValue::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        self.attrs.shift_remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn set_children(&mut self, children: Vec<Element>) {
        self.children = children;
    }

    /// Overlay `other`'s attributes onto this bag.
    pub(crate) fn merge(&mut self, other: &Props) {
        for (name, value) in &other.attrs {
            self.attrs.insert(name.clone(), value.clone());
        }
    }

    /// Shallow equality: same attribute set with identical values, and the same
    /// child elements by identity.
    pub fn shallow_eq(&self, other: &Props) -> bool {
        self.attrs.len() == other.attrs.len()
            && self
                .attrs
                .iter()
                .all(|(k, v)| other.attrs.get(k).is_some_and(|o| v.same_value(o)))
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.ptr_eq(b))
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attrs", &self.attrs)
            .field("children", &self.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_names_round_trip_to_events() {
        let props = Props::new().on("click", |_| {});
        let (name, value) = props.iter().next().unwrap();
        assert_eq!(name, "onClick");
        assert!(value.is_handler());
        assert_eq!(event_name(name).as_deref(), Some("click"));
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("class"), None);
    }

    #[test]
    fn floats_compare_like_object_is() {
        assert!(PropValue::Float(f64::NAN).same_value(&PropValue::Float(f64::NAN)));
        assert!(!PropValue::Float(0.0).same_value(&PropValue::Float(-0.0)));
        assert!(!PropValue::Int(1).same_value(&PropValue::Float(1.0)));
    }

    #[test]
    fn handlers_compare_by_identity() {
        let handler: EventHandler = Arc::new(|_| {});
        let a = Props::new().handler("click", handler.clone());
        let b = Props::new().handler("click", handler);
        let c = Props::new().on("click", |_| {});
        assert!(a.shallow_eq(&b));
        assert!(!a.shallow_eq(&c));
    }

    #[test]
    fn style_builder_accumulates() {
        let props = Props::new().style("color", "red").style("margin", "0");
        assert_eq!(
            props.get("style").and_then(PropValue::to_attribute).as_deref(),
            Some("color: red; margin: 0")
        );
    }

    #[test]
    fn numbers_format_without_trailing_zero() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
    }
}
