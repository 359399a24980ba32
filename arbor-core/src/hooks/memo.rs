//! Memo and callback hooks.

use std::any::type_name;
use std::sync::Arc;

use super::context::{claim, install};
use super::deps::{deps_changed, Deps};
use super::{HookKind, HookRecord, HookSeed};
use crate::error::HookError;

/// Cache the result of `compute` until `deps` change.
pub fn use_memo<T, F>(deps: Deps, compute: F) -> Result<T, HookError>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> T,
{
    let claim = claim(HookKind::Memo)?;

    if let Some(HookSeed::Memo {
        deps: prev_deps,
        value,
    }) = &claim.seed
    {
        if !deps_changed(Some(prev_deps), Some(&deps)) {
            match value.downcast_ref::<T>() {
                Some(cached) => {
                    let cached = cached.clone();
                    install(
                        claim.index,
                        HookRecord::Memo {
                            deps: prev_deps.clone(),
                            value: Arc::clone(value),
                        },
                    )?;
                    return Ok(cached);
                }
                None => claim.type_mismatch(type_name::<T>())?,
            }
        }
    }

    let computed = compute();
    install(
        claim.index,
        HookRecord::Memo {
            deps,
            value: Arc::new(computed.clone()),
        },
    )?;
    Ok(computed)
}

/// Keep the same callback instance until `deps` change.
///
/// The returned `Arc` is pointer-equal across renders while the dependencies
/// hold, so it can be passed as a handler prop without defeating the
/// shallow-props bail-out of child components.
pub fn use_callback<F>(deps: Deps, f: F) -> Result<Arc<F>, HookError>
where
    F: Send + Sync + 'static,
{
    use_memo(deps, move || Arc::new(f))
}
