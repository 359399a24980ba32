//! Ref hook.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::{claim, install};
use super::{HookKind, HookRecord, HookSeed};
use crate::error::HookError;

/// A mutable box that persists across renders.
///
/// Writing to a ref never requests a render.
pub struct HookRef<T>(Arc<Mutex<T>>);

impl<T> HookRef<T> {
    pub fn current(&self) -> T
    where
        T: Clone,
    {
        self.0.lock().clone()
    }

    pub fn set(&self, value: T) {
        *self.0.lock() = value;
    }

    /// Access the value in place.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.lock())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for HookRef<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: fmt::Debug> fmt::Debug for HookRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HookRef").field(&*self.0.lock()).finish()
    }
}

pub fn use_ref<T, I>(init: I) -> Result<HookRef<T>, HookError>
where
    T: Send + 'static,
    I: FnOnce() -> T,
{
    let claim = claim(HookKind::Ref)?;

    let existing = match &claim.seed {
        Some(HookSeed::Ref(value)) => match Arc::clone(value).downcast::<Mutex<T>>() {
            Ok(cell) => Some(cell),
            Err(_) => {
                claim.type_mismatch(type_name::<T>())?;
                None
            }
        },
        _ => None,
    };
    let cell = existing.unwrap_or_else(|| Arc::new(Mutex::new(init())));

    install(claim.index, HookRecord::Ref(cell.clone()))?;
    Ok(HookRef(cell))
}
