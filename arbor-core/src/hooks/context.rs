//! Hook Context
//!
//! Tracks which component is currently rendering so that hook calls can find
//! their slot on its fiber.
//!
//! # Implementation
//!
//! A thread-local stack of frames. The renderer pushes a frame before invoking
//! a component body and pops it when the body returns; [`HookScope`] is the
//! guard, so a panicking component still leaves the stack balanced.
//!
//! Each hook call claims the next slot (the cursor), reads the seed the same
//! slot left on the previous render, and later installs its new record into
//! the claimed slot. Claiming reserves the slot up front, so a hook called
//! from inside another hook's initializer cannot steal its position.

use std::cell::RefCell;

use tracing::warn;

use super::{HookKind, HookRecord, HookSeed};
use crate::error::HookError;
use crate::fiber::FiberId;
use crate::scheduler::UpdateQueue;

thread_local! {
    static FRAME_STACK: RefCell<Vec<HookFrame>> = RefCell::new(Vec::new());
}

struct HookFrame {
    fiber: FiberId,
    component: &'static str,
    /// Hooks from the alternate's last render, by slot.
    previous: Vec<HookSeed>,
    /// False on first mount; there is no previous count to compare against.
    has_alternate: bool,
    /// Slots claimed this render. `None` until the hook installs its record.
    hooks: Vec<Option<HookRecord>>,
    cursor: usize,
    strict: bool,
    queue: UpdateQueue,
}

/// A slot handed out to one hook call.
pub(crate) struct Claim {
    pub(crate) index: usize,
    pub(crate) seed: Option<HookSeed>,
    pub(crate) queue: UpdateQueue,
    strict: bool,
}

impl Claim {
    /// The previous value in this slot has a different type than requested.
    ///
    /// Strict mode fails the render; otherwise the slot is re-initialised.
    pub(crate) fn type_mismatch(&self, expected: &'static str) -> Result<(), HookError> {
        if self.strict {
            return Err(HookError::TypeMismatch {
                index: self.index,
                expected,
            });
        }
        warn!(index = self.index, expected, "hook slot changed type, re-initialising");
        Ok(())
    }
}

/// Guard for one component render.
pub(crate) struct HookScope {
    fiber: FiberId,
    finished: bool,
}

impl HookScope {
    pub(crate) fn enter(
        fiber: FiberId,
        component: &'static str,
        previous: Vec<HookSeed>,
        has_alternate: bool,
        strict: bool,
        queue: UpdateQueue,
    ) -> Self {
        FRAME_STACK.with(|stack| {
            stack.borrow_mut().push(HookFrame {
                fiber,
                component,
                previous,
                has_alternate,
                hooks: Vec::new(),
                cursor: 0,
                strict,
                queue,
            });
        });
        Self {
            fiber,
            finished: false,
        }
    }

    /// Pop the frame and hand back the hooks built during this render.
    pub(crate) fn finish(mut self) -> Result<Vec<HookRecord>, HookError> {
        self.finished = true;
        let frame = pop_frame(self.fiber).ok_or(HookError::OutsideRender { hook: "finish" })?;

        let hooks: Vec<HookRecord> = frame.hooks.into_iter().flatten().collect();
        if frame.has_alternate && hooks.len() != frame.previous.len() {
            if frame.strict {
                return Err(HookError::CountMismatch {
                    component: frame.component,
                    previous: frame.previous.len(),
                    current: hooks.len(),
                });
            }
            warn!(
                component = frame.component,
                previous = frame.previous.len(),
                current = hooks.len(),
                "hook count changed between renders"
            );
        }
        Ok(hooks)
    }
}

impl Drop for HookScope {
    fn drop(&mut self) {
        if !self.finished {
            pop_frame(self.fiber);
        }
    }
}

fn pop_frame(fiber: FiberId) -> Option<HookFrame> {
    FRAME_STACK.with(|stack| {
        let popped = stack.borrow_mut().pop();
        if let Some(frame) = &popped {
            debug_assert_eq!(
                frame.fiber, fiber,
                "HookScope mismatch: expected {:?}, got {:?}",
                fiber, frame.fiber
            );
        }
        popped
    })
}

/// Whether a component is currently rendering on this thread.
pub fn is_rendering() -> bool {
    FRAME_STACK.with(|stack| !stack.borrow().is_empty())
}

/// The fiber whose component is currently rendering, if any.
pub fn current_fiber() -> Option<FiberId> {
    FRAME_STACK.with(|stack| stack.borrow().last().map(|frame| frame.fiber))
}

/// Reserve the next slot for a hook of `kind`.
pub(crate) fn claim(kind: HookKind) -> Result<Claim, HookError> {
    FRAME_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let frame = stack
            .last_mut()
            .ok_or(HookError::OutsideRender { hook: kind.name() })?;

        let index = frame.cursor;
        frame.cursor += 1;
        frame.hooks.push(None);

        let seed = match frame.previous.get(index) {
            Some(seed) if seed.kind() == kind => Some(seed.clone()),
            Some(seed) => {
                if frame.strict {
                    return Err(HookError::SlotMismatch {
                        index,
                        previous: seed.kind().name(),
                        current: kind.name(),
                    });
                }
                warn!(
                    component = frame.component,
                    index,
                    previous = seed.kind().name(),
                    current = kind.name(),
                    "hook order changed, re-initialising slot"
                );
                None
            }
            None => None,
        };

        Ok(Claim {
            index,
            seed,
            queue: frame.queue.clone(),
            strict: frame.strict,
        })
    })
}

/// Store the record for a slot obtained from [`claim`].
pub(crate) fn install(index: usize, record: HookRecord) -> Result<(), HookError> {
    FRAME_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let frame = stack.last_mut().ok_or(HookError::OutsideRender {
            hook: record.kind().name(),
        })?;
        if let Some(slot) = frame.hooks.get_mut(index) {
            *slot = Some(record);
        }
        Ok(())
    })
}
