//! Commit Phase
//!
//! Applies a finished work-in-progress tree to the host in one synchronous
//! pass:
//!
//! 1. every queued deletion: effect cleanups for the whole subtree, then its
//!    host nodes are detached
//! 2. a preorder walk of the new tree applying each fiber's effect tag
//!
//! Within one fiber, stale effect cleanups run before props are applied and
//! the new effects run after. The caller swaps `current` only if this
//! returns `Ok`.

use tracing::{debug, debug_span, trace};

use crate::element::Props;
use crate::error::HostError;
use crate::fiber::{EffectTag, FiberId, FiberTree};
use crate::hooks;
use crate::host::HostBinding;

/// Counts from one commit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitStats {
    pub placed: usize,
    pub updated: usize,
    pub moved: usize,
    pub deleted: usize,
    pub effects_run: usize,
    pub cleanups_run: usize,
}

pub(crate) fn commit_root<H: HostBinding>(
    tree: &mut FiberTree<H::Node>,
    host: &mut H,
    root: FiberId,
    deletions: &[FiberId],
) -> Result<CommitStats, HostError> {
    let span = debug_span!("commit", deletions = deletions.len());
    let _enter = span.enter();

    let mut stats = CommitStats::default();
    for &fiber in deletions {
        commit_deletion(tree, host, fiber, &mut stats)?;
    }

    let mut next = tree.get(root).and_then(|f| f.child);
    while let Some(id) = next {
        let tag = tree.get(id).map_or(EffectTag::None, |f| f.effect_tag);
        match tag {
            EffectTag::Placement => commit_placement(tree, host, id, &mut stats)?,
            EffectTag::Update => commit_update(tree, host, id, &mut stats)?,
            EffectTag::Deletion => {
                commit_deletion(tree, host, id, &mut stats)?;
                next = tree.next_skipping_children(id, root);
                continue;
            }
            EffectTag::None => {}
        }
        next = tree.next_in_preorder(id, root);
    }

    debug!(?stats, "commit finished");
    Ok(stats)
}

fn commit_placement<H: HostBinding>(
    tree: &mut FiberTree<H::Node>,
    host: &mut H,
    id: FiberId,
    stats: &mut CommitStats,
) -> Result<(), HostError> {
    if let Some(node) = tree.get(id).and_then(|f| f.node.clone()) {
        let parent = host_parent(tree, id).ok_or_else(|| orphan(&node))?;
        let before = host_sibling(tree, id);
        host.insert_node(&parent, &node, before.as_ref())?;
        stats.placed += 1;
    }
    run_hooks(tree, id, stats);
    Ok(())
}

fn commit_update<H: HostBinding>(
    tree: &mut FiberTree<H::Node>,
    host: &mut H,
    id: FiberId,
    stats: &mut CommitStats,
) -> Result<(), HostError> {
    let Some(fiber) = tree.get(id) else {
        return Ok(());
    };

    if fiber.moved {
        let nodes = top_host_nodes(tree, id, false);
        if let Some(parent) = host_parent(tree, id) {
            let before = host_sibling(tree, id);
            for node in &nodes {
                host.insert_node(&parent, node, before.as_ref())?;
            }
        }
        stats.moved += 1;
    }

    stats.cleanups_run += hooks::cancel_stale_effects(&fiber.hooks);

    if let (true, Some(node)) = (fiber.props_changed, fiber.node.clone()) {
        let empty = Props::new();
        let prev = fiber
            .alternate
            .and_then(|alt| tree.get(alt))
            .map_or(&empty, |alt| &*alt.props);
        host.apply_props(&node, prev, &fiber.props)?;
        stats.updated += 1;
    }

    run_hooks(tree, id, stats);
    Ok(())
}

/// Unmount the subtree at `id`: cleanups first, then host removal.
fn commit_deletion<H: HostBinding>(
    tree: &mut FiberTree<H::Node>,
    host: &mut H,
    id: FiberId,
    stats: &mut CommitStats,
) -> Result<(), HostError> {
    for fiber in tree.subtree(id) {
        if let Some(fiber) = tree.get(fiber) {
            stats.cleanups_run += hooks::run_unmount_cleanups(&fiber.hooks);
        }
    }

    let nodes = top_host_nodes(tree, id, true);
    if let Some(parent) = host_parent(tree, id) {
        for node in &nodes {
            host.remove_node(&parent, node)?;
        }
    }
    trace!(removed = nodes.len(), "deleted subtree");
    stats.deleted += 1;
    Ok(())
}

fn run_hooks<N>(tree: &mut FiberTree<N>, id: FiberId, stats: &mut CommitStats) {
    if let Some(fiber) = tree.get_mut(id) {
        hooks::commit_state(&mut fiber.hooks);
        stats.effects_run += hooks::run_pending_effects(&mut fiber.hooks);
    }
}

/// Host node of the nearest ancestor that owns one.
fn host_parent<N: Clone>(tree: &FiberTree<N>, id: FiberId) -> Option<N> {
    let mut parent = tree.get(id)?.parent;
    while let Some(p) = parent {
        let fiber = tree.get(p)?;
        if fiber.kind.is_host() {
            return fiber.node.clone();
        }
        parent = fiber.parent;
    }
    None
}

/// Whether a fiber's host position will change later in this commit.
fn is_unsettled<N>(tree: &FiberTree<N>, id: FiberId) -> bool {
    tree.get(id).map_or(true, |f| {
        f.moved || matches!(f.effect_tag, EffectTag::Placement | EffectTag::Deletion)
    })
}

/// The first host node after `id` among its host siblings that is already
/// in place, used as the insertion anchor. `None` means append.
fn host_sibling<N: Clone>(tree: &FiberTree<N>, id: FiberId) -> Option<N> {
    let mut node = id;
    'siblings: loop {
        loop {
            let fiber = tree.get(node)?;
            if let Some(sibling) = fiber.sibling {
                node = sibling;
                break;
            }
            let parent = fiber.parent?;
            if tree.get(parent)?.kind.is_host() {
                return None;
            }
            node = parent;
        }

        loop {
            if is_unsettled(tree, node) {
                continue 'siblings;
            }
            let fiber = tree.get(node)?;
            if fiber.kind.is_host() {
                match &fiber.node {
                    Some(host_node) => return Some(host_node.clone()),
                    None => continue 'siblings,
                }
            }
            match fiber.child {
                Some(child) => node = child,
                None => continue 'siblings,
            }
        }
    }
}

/// Host nodes directly representing the subtree at `id`: the fiber's own
/// node, or for fibers without one, those of their children, recursively.
/// Fibers placed in this commit are skipped unless `include_placed`.
fn top_host_nodes<N: Clone>(tree: &FiberTree<N>, id: FiberId, include_placed: bool) -> Vec<N> {
    let mut out = Vec::new();
    collect_host_nodes(tree, id, include_placed, &mut out);
    out
}

fn collect_host_nodes<N: Clone>(tree: &FiberTree<N>, id: FiberId, include_placed: bool, out: &mut Vec<N>) {
    let Some(fiber) = tree.get(id) else { return };
    if !include_placed && fiber.effect_tag == EffectTag::Placement {
        return;
    }
    if let Some(node) = &fiber.node {
        out.push(node.clone());
        return;
    }
    for child in tree.children(id) {
        collect_host_nodes(tree, child, include_placed, out);
    }
}

fn orphan<N: std::fmt::Debug>(node: &N) -> HostError {
    HostError::UnknownNode(format!("{node:?} has no host parent"))
}
