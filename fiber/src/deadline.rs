//! Deadlines handed to the work loop by the host's idle callback.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Remaining budget of one work-loop invocation.
///
/// The loop queries the deadline before each unit of work and yields as soon as
/// it reports no time left.
pub trait Deadline {
    /// Time left before the loop should yield.
    fn time_remaining(&self) -> Duration;

    /// Returns `true` once the budget is exhausted.
    fn did_timeout(&self) -> bool {
        self.time_remaining().is_zero()
    }
}

/// A deadline that never expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// A wall-clock budget measured from its creation.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    end: Instant,
}

impl TimeSlice {
    /// Starts a slice of `budget` from now.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        let now = Instant::now();
        Self {
            end: now.checked_add(budget).unwrap_or(now),
        }
    }
}

impl Deadline for TimeSlice {
    fn time_remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

/// A budget counted in units of work rather than time.
///
/// Every query consumes one unit, so a loop checking before each unit performs
/// exactly `units` of them. Useful for deterministic tests.
#[derive(Debug, Clone)]
pub struct UnitBudget {
    remaining: Cell<usize>,
}

impl UnitBudget {
    /// Allows `units` queries before expiring.
    #[must_use]
    pub const fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units),
        }
    }

    /// Units left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining.get()
    }
}

impl Deadline for UnitBudget {
    fn time_remaining(&self) -> Duration {
        match self.remaining.get() {
            0 => Duration::ZERO,
            left => {
                self.remaining.set(left - 1);
                Duration::MAX
            }
        }
    }
}

impl<F> Deadline for F
where
    F: Fn() -> Duration,
{
    fn time_remaining(&self) -> Duration {
        self()
    }
}
