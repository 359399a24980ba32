//! Hooks
//!
//! Hooks give function components persistent state and lifecycle behaviour.
//! Each call claims a slot on the rendering fiber by position, so a component
//! must call the same hooks in the same order on every render.
//!
//! # Slot lifecycle
//!
//! During render, every hook reads the seed its slot left on the alternate
//! fiber and builds a fresh [`HookRecord`] for the work-in-progress fiber.
//! Nothing observable happens until commit:
//!
//! - state hooks stage their folded value; commit makes it the new base
//! - effect hooks stash the effect; commit runs the previous cleanup and
//!   then the effect
//!
//! A work-in-progress tree that is discarded before commit therefore leaves
//! every slot exactly as the last commit left it.

mod context;
mod deps;
mod effect;
mod memo;
mod refs;
mod state;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

pub use context::{current_fiber, is_rendering};
pub use deps::{deps_changed, DepValue, Deps};
pub use effect::{cleanup, use_effect, Cleanup};
pub use memo::{use_callback, use_memo};
pub use refs::{use_ref, HookRef};
pub use state::{use_reducer, use_state, use_store, Dispatch, StateSetter};

pub(crate) use context::HookScope;

use effect::EffectFn;
use state::{StateHandle, Staged};

/// The four slot kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    State,
    Effect,
    Memo,
    Ref,
}

impl HookKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::State => "use_state",
            Self::Effect => "use_effect",
            Self::Memo => "use_memo",
            Self::Ref => "use_ref",
        }
    }
}

/// Cleanup storage for an effect slot, shared by a fiber and its alternate.
pub(crate) type CleanupCell = Arc<Mutex<Option<Cleanup>>>;

/// What a slot holds on a fiber.
pub(crate) enum HookRecord {
    State {
        cell: Arc<dyn StateHandle>,
        staged: Option<Staged>,
    },
    Effect {
        deps: Option<Deps>,
        pending: Option<EffectFn>,
        cleanup: CleanupCell,
    },
    Memo {
        deps: Deps,
        value: Arc<dyn Any + Send + Sync>,
    },
    Ref(Arc<dyn Any + Send + Sync>),
}

/// The persistent part of a slot, carried into the next render.
#[derive(Clone)]
pub(crate) enum HookSeed {
    State(Arc<dyn StateHandle>),
    Effect {
        deps: Option<Deps>,
        cleanup: CleanupCell,
    },
    Memo {
        deps: Deps,
        value: Arc<dyn Any + Send + Sync>,
    },
    Ref(Arc<dyn Any + Send + Sync>),
}

impl HookSeed {
    pub(crate) fn kind(&self) -> HookKind {
        match self {
            Self::State(_) => HookKind::State,
            Self::Effect { .. } => HookKind::Effect,
            Self::Memo { .. } => HookKind::Memo,
            Self::Ref(_) => HookKind::Ref,
        }
    }
}

impl HookRecord {
    pub(crate) fn kind(&self) -> HookKind {
        match self {
            Self::State { .. } => HookKind::State,
            Self::Effect { .. } => HookKind::Effect,
            Self::Memo { .. } => HookKind::Memo,
            Self::Ref(_) => HookKind::Ref,
        }
    }

    pub(crate) fn seed(&self) -> HookSeed {
        match self {
            Self::State { cell, .. } => HookSeed::State(Arc::clone(cell)),
            Self::Effect { deps, cleanup, .. } => HookSeed::Effect {
                deps: deps.clone(),
                cleanup: Arc::clone(cleanup),
            },
            Self::Memo { deps, value } => HookSeed::Memo {
                deps: deps.clone(),
                value: Arc::clone(value),
            },
            Self::Ref(value) => HookSeed::Ref(Arc::clone(value)),
        }
    }

    fn has_pending_effect(&self) -> bool {
        matches!(self, Self::Effect { pending: Some(_), .. })
    }
}

impl fmt::Debug for HookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Effect { deps, pending, .. } => f
                .debug_struct("Effect")
                .field("deps", deps)
                .field("pending", &pending.is_some())
                .finish(),
            Self::Memo { deps, .. } => f.debug_struct("Memo").field("deps", deps).finish(),
            other => f.write_str(other.kind().name()),
        }
    }
}

/// Make staged state values the committed base.
pub(crate) fn commit_state(hooks: &mut [HookRecord]) {
    for hook in hooks {
        if let HookRecord::State { cell, staged } = hook {
            if let Some(staged) = staged.take() {
                cell.commit(staged);
            }
        }
    }
}

/// Run the previous cleanup of every effect that is about to rerun.
pub(crate) fn cancel_stale_effects(hooks: &[HookRecord]) -> usize {
    hooks
        .iter()
        .filter(|hook| hook.has_pending_effect())
        .filter_map(|hook| match hook {
            HookRecord::Effect { cleanup, .. } => take_and_run(cleanup).then_some(()),
            _ => None,
        })
        .count()
}

/// Run every pending effect and store the cleanup it returns.
pub(crate) fn run_pending_effects(hooks: &mut [HookRecord]) -> usize {
    let mut ran = 0;
    for hook in hooks {
        if let HookRecord::Effect {
            pending, cleanup, ..
        } = hook
        {
            if let Some(effect) = pending.take() {
                let next = effect();
                *cleanup.lock() = next;
                ran += 1;
            }
        }
    }
    ran
}

/// Run the cleanup of every effect slot, for a fiber being unmounted.
pub(crate) fn run_unmount_cleanups(hooks: &[HookRecord]) -> usize {
    hooks
        .iter()
        .filter_map(|hook| match hook {
            HookRecord::Effect { cleanup, .. } => take_and_run(cleanup).then_some(()),
            _ => None,
        })
        .count()
}

fn take_and_run(cell: &CleanupCell) -> bool {
    // Release the lock before running user code.
    let cleanup = cell.lock().take();
    match cleanup {
        Some(cleanup) => {
            cleanup();
            true
        }
        None => false,
    }
}
