//! Child Reconciliation
//!
//! Builds the work-in-progress children of one fiber from the elements it
//! rendered, matching them against the children of its alternate.
//!
//! # Matching
//!
//! Old children are bucketed by match key: the explicit key when present,
//! otherwise the element type. Each new element takes the first unmatched old
//! fiber from its bucket, provided the types agree.
//!
//! - matched: the new fiber is tagged `Update` and inherits the old host node.
//!   Props that are shallow-equal to the old ones mark a bail-out, which skips
//!   prop application at commit but still visits the subtree.
//! - unmatched new element: tagged `Placement`.
//! - old fibers left in any bucket: tagged `Deletion` and queued for commit.
//!
//! Unkeyed siblings of the same type match first-in-first-out, so reordering
//! them swaps their state. Give them keys to keep identity.
//!
//! # Moves
//!
//! A matched fiber whose old position is left of an already placed sibling is
//! flagged `moved`; commit re-inserts its host nodes at the new position. The
//! rest keep their relative order and are not touched.

use std::any::TypeId;
use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::element::{Element, ElementType, Key};
use crate::fiber::{EffectTag, Fiber, FiberId, FiberKind, FiberTree};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MatchKey {
    Keyed(Key),
    Host(Arc<str>),
    Text,
    Component(TypeId),
    Fragment,
}

impl MatchKey {
    fn for_fiber(kind: &FiberKind, key: Option<&Key>) -> Option<Self> {
        if let Some(key) = key {
            return Some(Self::Keyed(key.clone()));
        }
        Some(match kind {
            FiberKind::Root => return None,
            FiberKind::Host(tag) => Self::Host(Arc::clone(tag)),
            FiberKind::Text => Self::Text,
            FiberKind::Component(c) => Self::Component(c.type_id()),
            FiberKind::Fragment => Self::Fragment,
        })
    }

    fn for_element(element: &Element) -> Self {
        if let Some(key) = element.key() {
            return Self::Keyed(key.clone());
        }
        match element.element_type() {
            ElementType::Host(tag) => Self::Host(Arc::clone(tag)),
            ElementType::Text => Self::Text,
            ElementType::Component(c) => Self::Component(c.type_id()),
            ElementType::Fragment => Self::Fragment,
        }
    }
}

/// Counts from one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub placed: usize,
    pub updated: usize,
    /// Matched fibers whose props were shallow-equal.
    pub bailed_out: usize,
    pub moved: usize,
    pub deleted: usize,
}

/// Rebuild the children of `wip` from `elements`.
///
/// Old fibers that found no match are pushed onto `deletions`.
pub(crate) fn reconcile_children<N: Clone>(
    tree: &mut FiberTree<N>,
    wip: FiberId,
    elements: &[Element],
    deletions: &mut Vec<FiberId>,
) -> ReconcileStats {
    let old_children = tree
        .get(wip)
        .and_then(|f| f.alternate)
        .map(|alternate| tree.children(alternate))
        .unwrap_or_default();

    let mut unmatched: IndexMap<MatchKey, VecDeque<(usize, FiberId)>> = IndexMap::new();
    for (index, &old) in old_children.iter().enumerate() {
        let Some(fiber) = tree.get(old) else { continue };
        let Some(key) = MatchKey::for_fiber(&fiber.kind, fiber.key.as_ref()) else {
            continue;
        };
        let bucket = unmatched.entry(key).or_default();
        if let (Some(key), false) = (&fiber.key, bucket.is_empty()) {
            warn!(key = %key, "duplicate key among siblings");
        }
        bucket.push_back((index, old));
    }

    let mut stats = ReconcileStats::default();
    let mut last_placed = 0;
    let mut first_child = None;
    let mut prev_sibling: Option<FiberId> = None;

    for element in elements {
        let matched = unmatched
            .get_mut(&MatchKey::for_element(element))
            .and_then(|bucket| {
                let &(_, candidate) = bucket.front()?;
                let same_type = tree
                    .get(candidate)
                    .is_some_and(|f| f.kind.matches(element.element_type()));
                if same_type {
                    bucket.pop_front()
                } else {
                    None
                }
            });

        let mut fiber = Fiber::new(
            FiberKind::from(element.element_type()),
            element.key().cloned(),
            element.shared_props(),
        );
        fiber.parent = Some(wip);

        match matched.and_then(|(index, old)| tree.get(old).map(|f| (index, old, f))) {
            Some((old_index, old, old_fiber)) => {
                fiber.node = old_fiber.node.clone();
                fiber.alternate = Some(old);
                fiber.effect_tag = EffectTag::Update;
                fiber.props_changed = !(Arc::ptr_eq(&old_fiber.props, &fiber.props)
                    || old_fiber.props.shallow_eq(&fiber.props));
                if old_index < last_placed {
                    fiber.moved = true;
                    stats.moved += 1;
                } else {
                    last_placed = old_index;
                }
                if fiber.props_changed {
                    stats.updated += 1;
                } else {
                    stats.bailed_out += 1;
                }
            }
            None => {
                fiber.effect_tag = EffectTag::Placement;
                stats.placed += 1;
            }
        }

        let id = tree.insert(fiber);
        match prev_sibling.and_then(|prev| tree.get_mut(prev)) {
            Some(prev) => prev.sibling = Some(id),
            None => first_child = Some(id),
        }
        prev_sibling = Some(id);
    }

    if let Some(parent) = tree.get_mut(wip) {
        parent.child = first_child;
    }

    let mut leftovers: Vec<(usize, FiberId)> = unmatched.into_values().flatten().collect();
    leftovers.sort_unstable_by_key(|&(index, _)| index);
    for (_, old) in leftovers {
        if let Some(fiber) = tree.get_mut(old) {
            fiber.effect_tag = EffectTag::Deletion;
        }
        deletions.push(old);
        stats.deleted += 1;
    }

    trace!(?stats, "reconciled children");
    stats
}
