//! Interface to the host environment.
//!
//! The reconciler never touches concrete rendered nodes itself. Every structural or
//! property change goes through a [`HostTree`], and only during commit.

use core::fmt::Debug;

use crate::handler::Handler;
use crate::props::PropValue;

/// Kind of host node to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind<'a> {
    /// An element with the given tag.
    Element(&'a str),
    /// A text node.
    Text,
}

/// Host tree primitives consumed by the reconciler.
///
/// `append_child` and `insert_before` follow DOM semantics: if `child` is already
/// attached somewhere it is moved, not duplicated.
pub trait HostTree {
    /// Handle to a host node. Handles are compared to detect identity.
    type Node: Clone + PartialEq + Debug;

    /// Creates a detached node.
    ///
    /// Nodes are created while rendering. If the pass is abandoned before commit they
    /// are handed back through [`HostTree::release_node`] without ever being attached.
    fn create_node(&mut self, kind: HostKind<'_>) -> Self::Node;

    /// Frees a detached node created by a pass that never committed.
    ///
    /// The node has no parent, properties or listeners and is not referenced again.
    /// Hosts that reclaim detached nodes on their own can keep the default, which
    /// does nothing.
    fn release_node(&mut self, node: &Self::Node) {
        let _ = node;
    }

    /// Sets (or overwrites) a plain property.
    fn set_property(&mut self, node: &Self::Node, name: &str, value: &PropValue);

    /// Removes a plain property. `previous` is the value being removed.
    fn remove_property(&mut self, node: &Self::Node, name: &str, previous: &PropValue);

    /// Installs a listener for `event`.
    fn add_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

    /// Removes the listener previously installed for `event`.
    fn remove_listener(&mut self, node: &Self::Node, event: &str, handler: &Handler);

    /// Appends `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node);

    /// Inserts `child` into `parent` right before `reference`.
    fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: &Self::Node);

    /// Detaches `node` from its parent.
    fn remove_node(&mut self, node: &Self::Node);
}
