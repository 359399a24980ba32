//! Fiber Nodes
//!
//! This module defines the node type that lives in the fiber arena.

use std::sync::Arc;

use crate::element::{Component, ElementType, Key, Props};
use crate::hooks::HookRecord;

slotmap::new_key_type! {
    /// Handle to a fiber in a [`FiberTree`](super::FiberTree).
    pub struct FiberId;
}

/// What the commit phase should do with a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTag {
    /// Nothing to apply (the root, or a fiber not yet reconciled).
    None,
    /// New fiber; its host node must be inserted.
    Placement,
    /// Matched an existing fiber; its host node is reused.
    Update,
    /// Removed from the tree; its host node must be detached.
    Deletion,
}

/// The kind of a fiber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiberKind {
    /// The mount point. Its host node is the container.
    Root,
    Host(Arc<str>),
    Text,
    Component(Component),
    Fragment,
}

impl FiberKind {
    /// Short name for logs: the tag, component name or a marker.
    pub fn label(&self) -> &str {
        match self {
            Self::Root => "#root",
            Self::Host(tag) => tag,
            Self::Text => "#text",
            Self::Component(c) => c.name(),
            Self::Fragment => "#fragment",
        }
    }

    /// Whether this fiber owns a host node.
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Root | Self::Host(_) | Self::Text)
    }

    /// Whether an element of type `ty` can reuse a fiber of this kind.
    pub fn matches(&self, ty: &ElementType) -> bool {
        match (self, ty) {
            (Self::Host(a), ElementType::Host(b)) => a == b,
            (Self::Text, ElementType::Text) => true,
            (Self::Component(a), ElementType::Component(b)) => a == b,
            (Self::Fragment, ElementType::Fragment) => true,
            _ => false,
        }
    }
}

impl From<&ElementType> for FiberKind {
    fn from(ty: &ElementType) -> Self {
        match ty {
            ElementType::Host(tag) => Self::Host(Arc::clone(tag)),
            ElementType::Text => Self::Text,
            ElementType::Component(c) => Self::Component(c.clone()),
            ElementType::Fragment => Self::Fragment,
        }
    }
}

/// A unit of work and a persistent identity slot.
///
/// `child` and `sibling` are the structural edges of the tree. `parent` and
/// `alternate` are lookup-only back references; `alternate` points at the
/// fiber in the same position of the other tree.
pub struct Fiber<N> {
    pub(crate) kind: FiberKind,
    pub(crate) key: Option<Key>,
    pub(crate) props: Arc<Props>,
    pub(crate) node: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect_tag: EffectTag,
    /// False when the fiber bailed out with shallow-equal props.
    pub(crate) props_changed: bool,
    /// Set on matched fibers whose position among their siblings moved.
    pub(crate) moved: bool,
    pub(crate) hooks: Vec<HookRecord>,
}

impl<N> Fiber<N> {
    pub(crate) fn new(kind: FiberKind, key: Option<Key>, props: Arc<Props>) -> Self {
        Self {
            kind,
            key,
            props,
            node: None,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: EffectTag::None,
            props_changed: true,
            moved: false,
            hooks: Vec::new(),
        }
    }

    pub fn kind(&self) -> &FiberKind {
        &self.kind
    }

    /// Explicit key from the element, if any.
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Props of the element this fiber was built from.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Host node owned by this fiber. Always `None` for components and fragments.
    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }

    pub fn effect_tag(&self) -> EffectTag {
        self.effect_tag
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    /// First child.
    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    /// Next sibling to the right.
    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// Counterpart in the committed tree while a render is in flight.
    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    /// Whether commit will apply props to the host node.
    pub fn props_changed(&self) -> bool {
        self.props_changed
    }

    pub fn moved(&self) -> bool {
        self.moved
    }

    /// Hook slots recorded on the last render of this component.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, RenderResult};

    fn widget(_: &Props) -> RenderResult {
        Ok(Element::empty())
    }

    #[test]
    fn new_fiber_has_no_links() {
        let fiber: Fiber<()> = Fiber::new(FiberKind::Text, None, Arc::new(Props::new()));
        assert_eq!(fiber.effect_tag(), EffectTag::None);
        assert!(fiber.parent().is_none());
        assert!(fiber.alternate().is_none());
        assert!(fiber.props_changed());
        assert_eq!(fiber.hook_count(), 0);
    }

    #[test]
    fn kinds_match_element_types() {
        let div = FiberKind::from(&ElementType::from("div"));
        assert!(div.matches(&ElementType::from("div")));
        assert!(!div.matches(&ElementType::from("span")));
        assert!(div.is_host());

        let component = FiberKind::from(&ElementType::Component(Component::new(widget)));
        assert!(component.matches(&ElementType::Component(Component::new(widget))));
        assert!(!component.matches(&ElementType::Fragment));
        assert!(!component.is_host());
    }
}
