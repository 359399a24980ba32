//! Work Scheduler
//!
//! Rendering is split into units of work, one fiber each. The renderer runs
//! units until a [`Deadline`] says to hand control back, then resumes from the
//! same fiber on the next invocation. Commit always runs to completion once
//! the last unit is done.
//!
//! # Deadlines
//!
//! - [`TimeBudget`]: wall-clock slice per invocation, the usual choice for an
//!   interactive embedder
//! - [`UnitBudget`]: a fixed number of fibers per invocation, deterministic
//!   for tests
//! - [`Unbounded`]: never yields
//!
//! At least one unit runs per invocation regardless of the deadline, so a
//! render always makes progress.

pub mod driver;
mod queue;

use std::time::{Duration, Instant};

pub use queue::UpdateQueue;

/// Decides when a driver invocation should yield.
pub trait Deadline {
    /// Called after each completed unit of work.
    fn unit_done(&mut self) {}

    /// Whether the invocation should stop and hand control back.
    fn should_yield(&self) -> bool;
}

impl<D: Deadline + ?Sized> Deadline for Box<D> {
    fn unit_done(&mut self) {
        (**self).unit_done()
    }

    fn should_yield(&self) -> bool {
        (**self).should_yield()
    }
}

/// Yield once a wall-clock budget is spent.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    deadline: Instant,
}

impl TimeBudget {
    /// A budget starting now.
    pub fn new(budget: Duration) -> Self {
        Self {
            deadline: Instant::now() + budget,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

impl Deadline for TimeBudget {
    fn should_yield(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// Yield after a fixed number of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitBudget {
    remaining: usize,
}

impl UnitBudget {
    /// Allow `units` fibers before yielding. Zero still permits one.
    pub fn new(units: usize) -> Self {
        Self { remaining: units }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Deadline for UnitBudget {
    fn unit_done(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    fn should_yield(&self) -> bool {
        self.remaining == 0
    }
}

/// Never yield.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn should_yield(&self) -> bool {
        false
    }
}

/// Outcome of one driver invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Units remain, or a render was requested while working; invoke again.
    Pending,
    /// Nothing left to do until the next render request.
    Idle,
}

impl WorkStatus {
    /// Nothing left to render or commit.
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}
