#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

pub mod debug;
pub mod renderer;

#[doc(inline)]
pub use renderer::Renderer;

#[doc(inline)]
pub use undertow_core::{
    ClassComponent, Component, ElementBuilder, Event, FunctionComponent, Handler, HookSlot,
    HookViolation, Hooks, HostKind, HostTree, Key, NodeType, PropValue, Props, RenderError,
    StateSetter, UpdateSignal, VirtualNode, element, fragment, text,
};

#[doc(inline)]
pub use undertow_fiber::{
    CommitRecord, CommitReport, Deadline, Effect, Scheduler, SchedulerConfig, Step, TimeSlice,
    Unbounded, UnitBudget, WorkStatus,
};

pub use undertow_core as descriptors;
pub use undertow_fiber as fiber;
#[cfg(feature = "memory")]
pub use undertow_memory as memory;

pub mod prelude {
    //! A collection of commonly used types for easy importing.
    //!
    //! # Example
    //!
    //! ```rust
    //! use undertow::prelude::*;
    //!
    //! fn greeting(_hooks: &mut Hooks, props: &Props) -> VirtualNode {
    //!     let name = props.get_str("name").unwrap_or("world");
    //!     element("h1").text(format!("hello {name}")).build()
    //! }
    //! ```
    pub use super::{
        Component, Event, FunctionComponent, Hooks, Props, Renderer, StateSetter, VirtualNode,
        element, fragment, text,
    };
}
