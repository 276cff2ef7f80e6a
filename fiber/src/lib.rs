//! Reconciliation engine of the undertow workspace.
//!
//! The [`Scheduler`] turns [`VirtualNode`](undertow_core::VirtualNode) trees into host
//! mutations in two phases:
//!
//! 1. **Render.** Starting from a root unit, each [`WorkUnit`] is rendered in turn and
//!    its children are diffed against the previously committed tree. This phase is
//!    interruptible between units and never touches the visible host tree.
//! 2. **Commit.** Once every unit is processed, deletions, placements, moves and
//!    property patches are applied to the [`HostTree`](undertow_core::HostTree) in one
//!    uninterrupted walk.
//!
//! ```
//! use undertow_core::element;
//! use undertow_fiber::Scheduler;
//! use undertow_memory::MemoryHost;
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("root");
//! let mut scheduler = Scheduler::new(host);
//!
//! scheduler.render(element("p").text("hello").build(), container);
//! scheduler.flush().expect("render failed");
//! assert_eq!(scheduler.host().to_markup(container), "<root><p>hello</p></root>");
//! ```

mod commit;
mod config;
mod deadline;
mod reconcile;
mod scheduler;
mod tree;
mod unit;

#[cfg(test)]
mod tests;

pub use commit::{CommitRecord, CommitReport};
pub use config::{STRICT_HOOKS_ENV, SchedulerConfig, TIME_SLICE_ENV};
pub use deadline::{Deadline, TimeSlice, Unbounded, UnitBudget};
pub use scheduler::{Scheduler, Step, WorkStatus};
pub use tree::{Children, UnitTree};
pub use unit::{Effect, UnitId, UnitKind, WorkUnit};
