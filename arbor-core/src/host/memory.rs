//! In-memory host tree.
//!
//! [`MemoryHost`] implements [`HostBinding`] over a generational arena of
//! nodes. It is what the tests and benchmarks render into, and it works for
//! headless embedders that only need the resulting structure.
//!
//! Removing a node releases it together with its descendants; their handles
//! become unknown to the host afterwards.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use slotmap::SlotMap;

use super::diff::is_class_prop;
use super::{HostBinding, HostNodeKind};
use crate::element::{Event, EventHandler, PropValue, TEXT_VALUE};
use crate::error::HostError;

slotmap::new_key_type! {
    /// Handle to a node in a [`MemoryHost`].
    pub struct MemNodeId;
}

impl fmt::Display for MemNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Counters for every mutation the host received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MutationLog {
    pub created: usize,
    pub attributes_set: usize,
    pub attributes_cleared: usize,
    pub styles_set: usize,
    pub classes_toggled: usize,
    pub listeners_added: usize,
    pub listeners_removed: usize,
    pub inserted: usize,
    pub removed: usize,
}

impl MutationLog {
    /// Sum of every counter.
    pub fn total(&self) -> usize {
        self.created
            + self.attributes_set
            + self.attributes_cleared
            + self.styles_set
            + self.classes_toggled
            + self.listeners_added
            + self.listeners_removed
            + self.inserted
            + self.removed
    }
}

enum MemKind {
    Element(String),
    Text(String),
}

struct MemNode {
    kind: MemKind,
    attrs: IndexMap<String, String>,
    style: IndexMap<String, String>,
    classes: IndexSet<String>,
    listeners: IndexMap<String, Vec<EventHandler>>,
    children: Vec<MemNodeId>,
    parent: Option<MemNodeId>,
    container: bool,
}

impl MemNode {
    fn new(kind: MemKind) -> Self {
        Self {
            kind,
            attrs: IndexMap::new(),
            style: IndexMap::new(),
            classes: IndexSet::new(),
            listeners: IndexMap::new(),
            children: Vec::new(),
            parent: None,
            container: false,
        }
    }
}

/// Serializable view of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HostSnapshot>,
}

/// A host tree kept entirely in memory.
#[derive(Default)]
pub struct MemoryHost {
    nodes: SlotMap<MemNodeId, MemNode>,
    log: MutationLog,
}

fn validate_attribute(name: &str) -> Result<(), HostError> {
    if name.is_empty() {
        return Err(HostError::InvalidAttribute {
            name: name.to_string(),
            reason: "name is empty",
        });
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '='))
    {
        return Err(HostError::InvalidAttribute {
            name: name.to_string(),
            reason: "name contains a forbidden character",
        });
    }
    Ok(())
}

fn escape(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element with an `id`, to render into.
    pub fn create_container(&mut self, tag: &str, id: &str) -> MemNodeId {
        let mut node = MemNode::new(MemKind::Element(tag.to_string()));
        node.attrs.insert("id".to_string(), id.to_string());
        node.container = true;
        self.nodes.insert(node)
    }

    /// Number of live nodes, containers included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Release every detached node that is not a container.
    ///
    /// Nodes created for a render that was discarded before commit are never
    /// attached; this reclaims them. Call it only while the renderer is idle,
    /// since an in-flight render holds nodes that are not attached yet.
    pub fn sweep_detached(&mut self) -> usize {
        let detached: Vec<MemNodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none() && !n.container)
            .map(|(id, _)| id)
            .collect();
        detached.iter().map(|&id| self.release(id)).sum()
    }

    /// Drop `id` and its descendants from the arena.
    fn release(&mut self, id: MemNodeId) -> usize {
        let Some(node) = self.nodes.remove(id) else {
            return 0;
        };
        1 + node.children.iter().map(|&child| self.release(child)).sum::<usize>()
    }

    fn node(&self, id: MemNodeId) -> Result<&MemNode, HostError> {
        self.nodes
            .get(id)
            .ok_or_else(|| HostError::UnknownNode(id.to_string()))
    }

    fn node_mut(&mut self, id: MemNodeId) -> Result<&mut MemNode, HostError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownNode(id.to_string()))
    }

    /// Mutations recorded since creation or the last reset.
    pub fn mutations(&self) -> MutationLog {
        self.log
    }

    pub fn reset_mutations(&mut self) {
        self.log = MutationLog::default();
    }

    /// Children of `id`, empty for unknown nodes.
    pub fn children(&self, id: MemNodeId) -> &[MemNodeId] {
        self.nodes.get(id).map_or(&[][..], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: MemNodeId) -> Option<MemNodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Tag of an element node; `None` for text and unknown nodes.
    pub fn tag(&self, id: MemNodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            MemKind::Element(tag) => Some(tag),
            MemKind::Text(_) => None,
        }
    }

    /// Text content of a text node, or the concatenated text of an element.
    pub fn text_content(&self, id: MemNodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: MemNodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            MemKind::Text(text) => out.push_str(text),
            MemKind::Element(_) => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// A plain attribute. Style and class are kept separately.
    pub fn attribute(&self, id: MemNodeId, name: &str) -> Option<&str> {
        self.nodes.get(id)?.attrs.get(name).map(String::as_str)
    }

    /// Handlers attached for `event` on `id`.
    pub fn listener_count(&self, id: MemNodeId, event: &str) -> usize {
        self.nodes
            .get(id)
            .and_then(|n| n.listeners.get(event))
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to `target` and then to each ancestor.
    ///
    /// Returns the number of handlers invoked. State updates dispatched by a
    /// handler are picked up by the renderer's next driver invocation.
    pub fn dispatch_event(&self, target: MemNodeId, event: &Event) -> usize {
        let mut handlers = Vec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            if let Some(list) = node.listeners.get(&event.name) {
                handlers.extend(list.iter().cloned());
            }
            current = node.parent;
        }
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    /// Find the first element below `root` (inclusive) with the given tag.
    pub fn find_by_tag(&self, root: MemNodeId, tag: &str) -> Option<MemNodeId> {
        if self.tag(root) == Some(tag) {
            return Some(root);
        }
        self.children(root)
            .iter()
            .find_map(|child| self.find_by_tag(*child, tag))
    }

    /// Serialize the subtree under `root` as markup.
    pub fn to_html(&self, root: MemNodeId) -> String {
        let mut out = String::new();
        self.write_html(root, &mut out);
        out
    }

    fn write_html(&self, id: MemNodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            MemKind::Text(text) => escape(text, out),
            MemKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &node.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape(value, out);
                    out.push('"');
                }
                if !node.classes.is_empty() {
                    out.push_str(" class=\"");
                    let classes: Vec<&str> = node.classes.iter().map(String::as_str).collect();
                    escape(&classes.join(" "), out);
                    out.push('"');
                }
                if !node.style.is_empty() {
                    out.push_str(" style=\"");
                    let style: Vec<String> =
                        node.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    escape(&style.join("; "), out);
                    out.push('"');
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    /// Serializable copy of the subtree under `root`.
    pub fn snapshot(&self, root: MemNodeId) -> Result<HostSnapshot, HostError> {
        let node = self.node(root)?;
        let mut attrs: BTreeMap<String, String> = node
            .attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !node.classes.is_empty() {
            let classes: Vec<&str> = node.classes.iter().map(String::as_str).collect();
            attrs.insert("class".to_string(), classes.join(" "));
        }
        if !node.style.is_empty() {
            let style: Vec<String> = node.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            attrs.insert("style".to_string(), style.join("; "));
        }
        let (tag, text) = match &node.kind {
            MemKind::Element(tag) => (Some(tag.clone()), None),
            MemKind::Text(text) => (None, Some(text.clone())),
        };
        let children = node
            .children
            .iter()
            .map(|child| self.snapshot(*child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HostSnapshot {
            tag,
            text,
            attrs,
            listeners: node.listeners.keys().cloned().collect(),
            children,
        })
    }

    /// [`snapshot`](Self::snapshot) encoded as JSON.
    pub fn to_json(&self, root: MemNodeId) -> Result<String, HostError> {
        let snapshot = self.snapshot(root)?;
        serde_json::to_string(&snapshot).map_err(|err| HostError::Snapshot(err.to_string()))
    }
}

impl HostBinding for MemoryHost {
    type Node = MemNodeId;

    fn create_node(&mut self, kind: HostNodeKind<'_>) -> Result<MemNodeId, HostError> {
        let kind = match kind {
            HostNodeKind::Element(tag) => MemKind::Element(tag.to_string()),
            HostNodeKind::Text => MemKind::Text(String::new()),
        };
        let id = self.nodes.insert(MemNode::new(kind));
        self.log.created += 1;
        Ok(id)
    }

    fn set_attribute(
        &mut self,
        node: &MemNodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        validate_attribute(name)?;
        let target = self.node_mut(*node)?;
        let rendered = value.to_attribute().unwrap_or_default();
        match (&mut target.kind, value) {
            (MemKind::Text(text), _) if name == TEXT_VALUE => *text = rendered,
            (_, PropValue::Style(map)) => {
                target.attrs.shift_remove(name);
                target.style = map.clone();
            }
            (_, _) if is_class_prop(name) => {
                target.attrs.shift_remove(name);
                target.classes = rendered.split_whitespace().map(str::to_string).collect();
            }
            (_, _) if name == "style" => {
                target.style.clear();
                target.attrs.insert(name.to_string(), rendered);
            }
            _ => {
                target.attrs.insert(name.to_string(), rendered);
            }
        }
        self.log.attributes_set += 1;
        Ok(())
    }

    fn clear_attribute(&mut self, node: &MemNodeId, name: &str) -> Result<(), HostError> {
        let target = self.node_mut(*node)?;
        match &mut target.kind {
            MemKind::Text(text) if name == TEXT_VALUE => text.clear(),
            _ if name == "style" => {
                target.style.clear();
                target.attrs.shift_remove(name);
            }
            _ if is_class_prop(name) => {
                target.classes.clear();
                target.attrs.shift_remove(name);
            }
            _ => {
                target.attrs.shift_remove(name);
            }
        }
        self.log.attributes_cleared += 1;
        Ok(())
    }

    fn set_style_property(
        &mut self,
        node: &MemNodeId,
        property: &str,
        value: Option<&str>,
    ) -> Result<(), HostError> {
        let target = self.node_mut(*node)?;
        match value {
            Some(v) => {
                target.style.insert(property.to_string(), v.to_string());
            }
            None => {
                target.style.shift_remove(property);
            }
        }
        self.log.styles_set += 1;
        Ok(())
    }

    fn set_class(&mut self, node: &MemNodeId, class: &str, enabled: bool) -> Result<(), HostError> {
        let target = self.node_mut(*node)?;
        if enabled {
            target.classes.insert(class.to_string());
        } else {
            target.classes.shift_remove(class);
        }
        self.log.classes_toggled += 1;
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: &MemNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let target = self.node_mut(*node)?;
        target
            .listeners
            .entry(event.to_string())
            .or_default()
            .push(handler.clone());
        self.log.listeners_added += 1;
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: &MemNodeId,
        event: &str,
        handler: &EventHandler,
    ) -> Result<(), HostError> {
        let target = self.node_mut(*node)?;
        if let Some(list) = target.listeners.get_mut(event) {
            list.retain(|h| !std::sync::Arc::ptr_eq(h, handler));
            if list.is_empty() {
                target.listeners.shift_remove(event);
            }
        }
        self.log.listeners_removed += 1;
        Ok(())
    }

    fn insert_node(
        &mut self,
        parent: &MemNodeId,
        node: &MemNodeId,
        before: Option<&MemNodeId>,
    ) -> Result<(), HostError> {
        if let MemKind::Text(_) = self.node(*parent)?.kind {
            return Err(HostError::TextParent);
        }
        if let Some(old_parent) = self.node(*node)?.parent {
            self.node_mut(old_parent)?.children.retain(|c| c != node);
        }
        let parent_node = self.node_mut(*parent)?;
        let index = match before {
            Some(anchor) => parent_node
                .children
                .iter()
                .position(|c| c == anchor)
                .ok_or_else(|| HostError::NotAChild {
                    parent: parent.to_string(),
                    child: anchor.to_string(),
                })?,
            None => parent_node.children.len(),
        };
        parent_node.children.insert(index, *node);
        self.node_mut(*node)?.parent = Some(*parent);
        self.log.inserted += 1;
        Ok(())
    }

    fn remove_node(&mut self, parent: &MemNodeId, node: &MemNodeId) -> Result<(), HostError> {
        let parent_node = self.node_mut(*parent)?;
        let index = parent_node
            .children
            .iter()
            .position(|c| c == node)
            .ok_or_else(|| HostError::NotAChild {
                parent: parent.to_string(),
                child: node.to_string(),
            })?;
        parent_node.children.remove(index);
        self.release(*node);
        self.log.removed += 1;
        Ok(())
    }

    fn container_by_id(&self, id: &str) -> Option<MemNodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.container && n.attrs.get("id").map(String::as_str) == Some(id))
            .map(|(key, _)| key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Props;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn builds_and_prints_a_tree() {
        let mut host = MemoryHost::new();
        let root = host.create_container("div", "app");
        let p = host.create_node(HostNodeKind::Element("p")).unwrap();
        let text = host.create_node(HostNodeKind::Text).unwrap();
        host.set_attribute(&text, TEXT_VALUE, &PropValue::from("a < b"))
            .unwrap();
        host.insert_node(&p, &text, None).unwrap();
        host.insert_node(&root, &p, None).unwrap();

        assert_eq!(host.to_html(root), r#"<div id="app"><p>a &lt; b</p></div>"#);
        assert_eq!(host.container_by_id("app"), Some(root));
        assert_eq!(host.mutations().created, 2);
        assert_eq!(host.mutations().inserted, 2);
    }

    #[test]
    fn insert_before_and_move() {
        let mut host = MemoryHost::new();
        let root = host.create_container("ul", "list");
        let a = host.create_node(HostNodeKind::Element("a")).unwrap();
        let b = host.create_node(HostNodeKind::Element("b")).unwrap();
        host.insert_node(&root, &a, None).unwrap();
        host.insert_node(&root, &b, Some(&a)).unwrap();
        assert_eq!(host.children(root), &[b, a]);

        // Re-inserting an attached node moves it.
        host.insert_node(&root, &b, None).unwrap();
        assert_eq!(host.children(root), &[a, b]);
    }

    #[test]
    fn apply_props_merges_style_and_class() {
        let mut host = MemoryHost::new();
        let node = host.create_node(HostNodeKind::Element("div")).unwrap();
        let first = Props::new().attr("class", "a b").style("color", "red");
        let second = Props::new().attr("class", "b c").style("margin", "0");

        host.apply_props(&node, &Props::new(), &first).unwrap();
        host.apply_props(&node, &first, &second).unwrap();

        assert_eq!(host.to_html(node), r#"<div class="b c" style="margin: 0"></div>"#);
    }

    #[test]
    fn rejects_invalid_attribute_names() {
        let mut host = MemoryHost::new();
        let node = host.create_node(HostNodeKind::Element("div")).unwrap();
        let err = host
            .set_attribute(&node, "bad name", &PropValue::from("x"))
            .unwrap_err();
        assert!(matches!(err, HostError::InvalidAttribute { .. }));
    }

    #[test]
    fn events_bubble_to_ancestors() {
        let mut host = MemoryHost::new();
        let root = host.create_container("div", "app");
        let button = host.create_node(HostNodeKind::Element("button")).unwrap();
        host.insert_node(&root, &button, None).unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let handler: EventHandler = {
            let hits = hits.clone();
            Arc::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        host.add_listener(&button, "click", &handler).unwrap();
        host.add_listener(&root, "click", &handler).unwrap();

        assert_eq!(host.dispatch_event(button, &Event::new("click")), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        host.remove_listener(&button, "click", &handler).unwrap();
        assert_eq!(host.listener_count(button, "click"), 0);
        assert_eq!(host.dispatch_event(button, &Event::new("click")), 1);
    }

    #[test]
    fn text_nodes_cannot_have_children() {
        let mut host = MemoryHost::new();
        let text = host.create_node(HostNodeKind::Text).unwrap();
        let other = host.create_node(HostNodeKind::Text).unwrap();
        assert_eq!(host.insert_node(&text, &other, None), Err(HostError::TextParent));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut host = MemoryHost::new();
        let root = host.create_container("div", "app");
        let text = host.create_node(HostNodeKind::Text).unwrap();
        host.set_attribute(&text, TEXT_VALUE, &PropValue::from("hi"))
            .unwrap();
        host.insert_node(&root, &text, None).unwrap();

        assert_eq!(
            host.to_json(root).unwrap(),
            r#"{"tag":"div","attrs":{"id":"app"},"children":[{"text":"hi"}]}"#
        );
    }

    #[test]
    fn style_switches_between_string_and_map() {
        let mut host = MemoryHost::new();
        let node = host.create_node(HostNodeKind::Element("p")).unwrap();
        let string = Props::new().attr("style", "color: blue");
        let map = Props::new().style("margin", "0");
        let back = Props::new().attr("style", "color: red");

        host.apply_props(&node, &Props::new(), &string).unwrap();
        assert_eq!(host.to_html(node), r#"<p style="color: blue"></p>"#);

        host.apply_props(&node, &string, &map).unwrap();
        assert_eq!(host.to_html(node), r#"<p style="margin: 0"></p>"#);

        host.apply_props(&node, &map, &back).unwrap();
        assert_eq!(host.to_html(node), r#"<p style="color: red"></p>"#);
    }

    #[test]
    fn removing_a_node_releases_its_subtree() {
        let mut host = MemoryHost::new();
        let root = host.create_container("div", "app");
        let list = host.create_node(HostNodeKind::Element("ul")).unwrap();
        let item = host.create_node(HostNodeKind::Element("li")).unwrap();
        host.insert_node(&list, &item, None).unwrap();
        host.insert_node(&root, &list, None).unwrap();
        assert_eq!(host.node_count(), 3);

        host.remove_node(&root, &list).unwrap();
        assert_eq!(host.node_count(), 1);
        assert!(host.tag(item).is_none());
        assert!(matches!(
            host.set_attribute(&list, "title", &PropValue::from("x")),
            Err(HostError::UnknownNode(_))
        ));

        // A released slot is reused under a fresh handle.
        let next = host.create_node(HostNodeKind::Element("p")).unwrap();
        assert_ne!(next, list);
        assert_ne!(next, item);
    }

    #[test]
    fn sweep_keeps_containers_and_attached_nodes() {
        let mut host = MemoryHost::new();
        let root = host.create_container("div", "app");
        let other = host.create_container("div", "other");
        let kept = host.create_node(HostNodeKind::Element("p")).unwrap();
        host.insert_node(&root, &kept, None).unwrap();

        let orphan = host.create_node(HostNodeKind::Element("p")).unwrap();
        let text = host.create_node(HostNodeKind::Text).unwrap();
        host.insert_node(&orphan, &text, None).unwrap();

        assert_eq!(host.sweep_detached(), 2);
        assert_eq!(host.node_count(), 3);
        assert_eq!(host.container_by_id("other"), Some(other));
        assert_eq!(host.children(root), &[kept]);
    }

    #[test]
    fn container_lookup_skips_plain_nodes() {
        let mut host = MemoryHost::new();
        let impostor = host.create_node(HostNodeKind::Element("span")).unwrap();
        host.set_attribute(&impostor, "id", &PropValue::from("app"))
            .unwrap();
        let root = host.create_container("div", "app");
        assert_eq!(host.container_by_id("app"), Some(root));
    }
}
