//! Effect hook
//!
//! Effects run after their fiber commits, never during render. An effect
//! reruns when its dependency list changed; its previous cleanup runs first.
//! Unmounting a fiber runs the cleanup of every effect it holds.

use std::sync::Arc;

use parking_lot::Mutex;

use super::context::{claim, install};
use super::deps::{deps_changed, Deps};
use super::{HookKind, HookRecord, HookSeed};
use crate::error::HookError;

/// Teardown returned by an effect.
pub type Cleanup = Box<dyn FnOnce() + Send>;

pub(crate) type EffectFn = Box<dyn FnOnce() -> Option<Cleanup> + Send>;

/// Wrap a closure as an effect's return value.
pub fn cleanup<F>(f: F) -> Option<Cleanup>
where
    F: FnOnce() + Send + 'static,
{
    Some(Box::new(f))
}

/// Schedule `effect` to run after commit.
///
/// With `None` the effect runs after every commit of this component. With a
/// list it runs on mount and whenever an entry differs from the previous
/// render; `deps![]` runs it once.
///
/// ```ignore
/// use_effect(Some(deps![id]), move || {
///     let sub = subscribe(id);
///     cleanup(move || sub.cancel())
/// })?;
/// ```
pub fn use_effect<F>(deps: Option<Deps>, effect: F) -> Result<(), HookError>
where
    F: FnOnce() -> Option<Cleanup> + Send + 'static,
{
    let claim = claim(HookKind::Effect)?;

    let (prev_deps, cleanup) = match claim.seed {
        Some(HookSeed::Effect { deps, cleanup }) => (deps, cleanup),
        _ => (None, Arc::new(Mutex::new(None))),
    };
    let record = if deps_changed(prev_deps.as_ref(), deps.as_ref()) {
        HookRecord::Effect {
            deps,
            pending: Some(Box::new(effect)),
            cleanup,
        }
    } else {
        HookRecord::Effect {
            deps: prev_deps,
            pending: None,
            cleanup,
        }
    };
    install(claim.index, record)
}
