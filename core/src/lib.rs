//! Core vocabulary of the undertow reconciler.
//!
//! This crate holds everything the reconciliation engine consumes but does not own:
//!
//! - [`VirtualNode`] descriptors and their [`ElementBuilder`]
//! - [`Props`], [`PropValue`] and event [`Handler`]s
//! - component definitions ([`FunctionComponent`], [`ClassComponent`])
//! - the [`Hooks`] state store handed to function components while they render
//! - the [`HostTree`] trait implemented by concrete host environments
//! - the [`RenderError`] type shared by every crate in the workspace

#[macro_use]
mod macros;

pub mod component;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod host;
pub mod key;
pub mod node;
pub mod props;

pub use component::{ClassComponent, Component, FunctionComponent};
pub use error::{HookViolation, RenderError};
pub use handler::{Event, Handler, LISTENER_PREFIX, event_name};
pub use hooks::{HookSlot, Hooks, StateSetter, UpdateSignal};
pub use host::{HostKind, HostTree};
pub use key::{Key, LookupKey};
pub use node::{ElementBuilder, NodeType, TEXT_VALUE, VirtualNode, element, fragment, text};
pub use props::{PropValue, Props};
