//! Host Binding
//!
//! The reconciler never touches output nodes directly. Everything it needs
//! from the output tree goes through [`HostBinding`]: node creation, prop
//! mutation, listener management, and structural insert/remove.
//!
//! # Failure semantics
//!
//! Host errors propagate synchronously and abort the current commit step.
//! Props already applied to a node are not rolled back; commit is best-effort,
//! not transactional.

mod diff;
mod memory;

use std::fmt::Debug;

use crate::element::{EventHandler, PropValue, Props};
use crate::error::HostError;

pub use diff::{diff_props, PropPatch};
pub use memory::{HostSnapshot, MemNodeId, MemoryHost, MutationLog};

/// What kind of output node to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostNodeKind<'a> {
    Element(&'a str),
    Text,
}

/// The narrow contract between the reconciler and a concrete output tree.
pub trait HostBinding {
    /// Handle to an output node. Cloning the handle must not clone the node.
    type Node: Clone + PartialEq + Debug;

    fn create_node(&mut self, kind: HostNodeKind<'_>) -> Result<Self::Node, HostError>;

    fn set_attribute(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn clear_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    /// Set (or with `None`, remove) one inline style property.
    fn set_style_property(
        &mut self,
        node: &Self::Node,
        property: &str,
        value: Option<&str>,
    ) -> Result<(), HostError>;

    /// Add or remove one class token.
    fn set_class(&mut self, node: &Self::Node, class: &str, enabled: bool)
        -> Result<(), HostError>;

    fn add_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    fn remove_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError>;

    /// Insert `node` under `parent`, before `before` or at the end.
    ///
    /// Inserting a node that is already attached moves it.
    fn insert_node(
        &mut self,
        parent: &Self::Node,
        node: &Self::Node,
        before: Option<&Self::Node>,
    ) -> Result<(), HostError>;

    fn remove_node(&mut self, parent: &Self::Node, node: &Self::Node) -> Result<(), HostError>;

    /// Look up a mount point by id. Hosts without ids return `None`.
    fn container_by_id(&self, _id: &str) -> Option<Self::Node> {
        None
    }

    /// Apply one patch from [`diff_props`].
    fn apply_patch(&mut self, node: &Self::Node, patch: &PropPatch<'_>) -> Result<(), HostError> {
        match patch {
            PropPatch::RemoveListener { event, handler } => {
                self.remove_listener(node, event, handler)
            }
            PropPatch::ClearAttribute { name } => self.clear_attribute(node, name),
            PropPatch::SetAttribute { name, value } => self.set_attribute(node, name, value),
            PropPatch::SetStyle { property, value } => {
                self.set_style_property(node, property, *value)
            }
            PropPatch::SetClass { class, enabled } => self.set_class(node, class, *enabled),
            PropPatch::AddListener { event, handler } => self.add_listener(node, event, handler),
        }
    }

    /// Move `node` from `prev` props to `next` props.
    fn apply_props(&mut self, node: &Self::Node, prev: &Props, next: &Props) -> Result<(), HostError> {
        for patch in diff_props(prev, next) {
            self.apply_patch(node, &patch)?;
        }
        Ok(())
    }
}
