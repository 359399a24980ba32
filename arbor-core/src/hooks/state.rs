//! State hooks
//!
//! A state slot owns a committed `base` value plus a queue of updates that
//! setters have pushed since. Rendering folds the queue over the base without
//! consuming it; only commit advances the base and drains the folded updates.
//! Setters may be called from any thread.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::{claim, install};
use super::{HookKind, HookRecord, HookSeed};
use crate::error::HookError;
use crate::scheduler::UpdateQueue;

/// A folded value waiting for commit.
pub(crate) struct Staged {
    consumed: usize,
    value: Box<dyn Any + Send>,
}

/// Type-erased view of a state slot, as stored on a fiber.
pub(crate) trait StateHandle: Send + Sync + 'static {
    fn commit(&self, staged: Staged);
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

enum Update<T> {
    Replace(T),
    Apply(Arc<dyn Fn(&T) -> T + Send + Sync>),
}

impl<T: Clone> Clone for Update<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Replace(value) => Self::Replace(value.clone()),
            Self::Apply(f) => Self::Apply(Arc::clone(f)),
        }
    }
}

impl<T> Update<T> {
    fn apply(self, current: T) -> T {
        match self {
            Self::Replace(value) => value,
            Self::Apply(f) => f(&current),
        }
    }
}

struct SlotInner<T> {
    base: T,
    queue: Vec<Update<T>>,
}

struct StateSlot<T> {
    inner: Mutex<SlotInner<T>>,
}

impl<T: Clone> StateSlot<T> {
    fn new(base: T) -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                base,
                queue: Vec::new(),
            }),
        }
    }

    fn push(&self, update: Update<T>) {
        self.inner.lock().queue.push(update);
    }

    /// Fold queued updates over the base. Returns the value and how many
    /// updates went into it.
    fn fold(&self) -> (T, usize) {
        let (base, queue) = {
            let inner = self.inner.lock();
            (inner.base.clone(), inner.queue.clone())
        };
        let consumed = queue.len();
        (queue.into_iter().fold(base, |acc, u| u.apply(acc)), consumed)
    }
}

impl<T: Clone + Send + 'static> StateHandle for StateSlot<T> {
    fn commit(&self, staged: Staged) {
        let Ok(value) = staged.value.downcast::<T>() else {
            return;
        };
        let mut inner = self.inner.lock();
        inner.base = *value;
        let consumed = staged.consumed.min(inner.queue.len());
        inner.queue.drain(..consumed);
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Stable handle for updating a state slot.
///
/// Each call queues an update and requests a render. Several calls before the
/// next render are applied in order, in one pass.
pub struct StateSetter<T> {
    slot: Arc<StateSlot<T>>,
    queue: UpdateQueue,
}

impl<T: Clone + Send + 'static> StateSetter<T> {
    /// Replace the value.
    pub fn set(&self, value: T) {
        self.slot.push(Update::Replace(value));
        self.queue.request_render();
    }

    /// Derive the next value from the one before it.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.slot.push(Update::Apply(Arc::new(f)));
        self.queue.request_render();
    }

    /// Whether two setters write to the same slot.
    pub fn same_slot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            queue: self.queue.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("type", &type_name::<T>())
            .finish()
    }
}

/// Declare a piece of component state.
///
/// `init` runs only on the first render of the slot.
///
/// ```ignore
/// let (count, set_count) = use_state(|| 0)?;
/// set_count.update(|c| c + 1);
/// ```
pub fn use_state<T, I>(init: I) -> Result<(T, StateSetter<T>), HookError>
where
    T: Clone + Send + 'static,
    I: FnOnce() -> T,
{
    let claim = claim(HookKind::State)?;

    let existing = match &claim.seed {
        Some(HookSeed::State(handle)) => match Arc::clone(handle).into_any().downcast::<StateSlot<T>>() {
            Ok(slot) => Some(slot),
            Err(_) => {
                claim.type_mismatch(type_name::<T>())?;
                None
            }
        },
        _ => None,
    };
    let slot = existing.unwrap_or_else(|| Arc::new(StateSlot::new(init())));

    let (value, consumed) = slot.fold();
    let staged = (consumed > 0).then(|| Staged {
        consumed,
        value: Box::new(value.clone()),
    });

    let cell: Arc<dyn StateHandle> = slot.clone();
    install(claim.index, HookRecord::State { cell, staged })?;

    Ok((
        value,
        StateSetter {
            slot,
            queue: claim.queue,
        },
    ))
}

/// Alias of [`use_state`] under the store naming.
pub fn use_store<T, I>(init: I) -> Result<(T, StateSetter<T>), HookError>
where
    T: Clone + Send + 'static,
    I: FnOnce() -> T,
{
    use_state(init)
}

/// Stable handle for sending actions to a reducer slot.
pub struct Dispatch<A> {
    send: Arc<dyn Fn(A) + Send + Sync>,
}

impl<A> Dispatch<A> {
    pub fn dispatch(&self, action: A) {
        (self.send)(action)
    }
}

impl<A> Clone for Dispatch<A> {
    fn clone(&self) -> Self {
        Self {
            send: Arc::clone(&self.send),
        }
    }
}

impl<A> fmt::Debug for Dispatch<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("action", &type_name::<A>())
            .finish()
    }
}

/// State driven by a reducer. Actions are queued like state updates and
/// folded through `reducer` on the next render.
pub fn use_reducer<S, A, R, I>(reducer: R, init: I) -> Result<(S, Dispatch<A>), HookError>
where
    S: Clone + Send + 'static,
    A: Send + Sync + 'static,
    R: Fn(&S, &A) -> S + Send + Sync + 'static,
    I: FnOnce() -> S,
{
    let (state, setter) = use_state(init)?;
    let reducer = Arc::new(reducer);
    let send = move |action: A| {
        let reducer = Arc::clone(&reducer);
        setter.update(move |state| reducer(state, &action));
    };
    Ok((
        state,
        Dispatch {
            send: Arc::new(send),
        },
    ))
}
