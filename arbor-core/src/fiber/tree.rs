//! Fiber Arena
//!
//! The arena owns every fiber of both the current and the work-in-progress
//! tree. Edges are stored as handles, so the parent/alternate back references
//! never form ownership cycles. Keys are generational: a handle to a freed
//! fiber simply resolves to nothing.

use slotmap::SlotMap;

use super::node::{Fiber, FiberId};

/// Arena of fibers.
pub struct FiberTree<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> FiberTree<N> {
    pub fn new() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }

    pub(crate) fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    /// The fiber at `id`, or `None` once it has been freed.
    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    /// Live fibers across every tree in the arena.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// The child chain of `id`, left to right.
    pub fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut next = self.get(id).and_then(|f| f.child);
        while let Some(child) = next {
            out.push(child);
            next = self.get(child).and_then(|f| f.sibling);
        }
        out
    }

    /// Depth-first successor of `id` within the subtree rooted at `root`:
    /// the first child, else the nearest sibling walking up through parents.
    pub fn next_in_preorder(&self, id: FiberId, root: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        self.next_skipping_children(id, root)
    }

    /// Like [`next_in_preorder`](Self::next_in_preorder) but does not descend
    /// into `id`'s own children.
    pub fn next_skipping_children(&self, id: FiberId, root: FiberId) -> Option<FiberId> {
        let mut current = id;
        loop {
            if current == root {
                return None;
            }
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            current = fiber.parent?;
        }
    }

    /// All fibers under `root` (inclusive) in preorder.
    pub fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut next = self.get(root).map(|_| root);
        while let Some(id) = next {
            out.push(id);
            next = self.next_in_preorder(id, root);
        }
        out
    }

    /// Drop every fiber under `root` (inclusive). Returns how many were freed.
    pub(crate) fn free_subtree(&mut self, root: FiberId) -> usize {
        let ids = self.subtree(root);
        for id in &ids {
            self.fibers.remove(*id);
        }
        ids.len()
    }
}

impl<N> Default for FiberTree<N> {
    fn default() -> Self {
        Self::new()
    }
}
