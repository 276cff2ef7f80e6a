//! In-memory host tree for the undertow reconciler.
//!
//! [`MemoryHost`] implements [`HostTree`] over a plain arena of nodes and records every
//! primitive it receives in an operation log. It backs the test suites of the
//! workspace and is a compact reference for writing a real host.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use undertow_core::{Event, Handler, HostKind, HostTree, PropValue, TEXT_VALUE};

/// Handle to a node owned by a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the host arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A primitive received by the host, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    /// A node was created.
    CreateNode {
        /// The new node.
        node: NodeId,
        /// Its tag, or `#text`.
        kind: String,
    },
    /// A property was set.
    SetProperty {
        /// Target node.
        node: NodeId,
        /// Property name.
        name: String,
        /// New value.
        value: PropValue,
    },
    /// A property was removed.
    RemoveProperty {
        /// Target node.
        node: NodeId,
        /// Property name.
        name: String,
    },
    /// A listener was installed.
    AddListener {
        /// Target node.
        node: NodeId,
        /// Event name.
        event: String,
    },
    /// A listener was removed.
    RemoveListener {
        /// Target node.
        node: NodeId,
        /// Event name.
        event: String,
    },
    /// A node was appended to a parent.
    AppendChild {
        /// New parent.
        parent: NodeId,
        /// Attached node.
        child: NodeId,
    },
    /// A node was inserted before a sibling.
    InsertBefore {
        /// New parent.
        parent: NodeId,
        /// Attached node.
        child: NodeId,
        /// Sibling the node now precedes.
        reference: NodeId,
    },
    /// A node was detached.
    RemoveNode {
        /// Detached node.
        node: NodeId,
    },
    /// A never attached node was freed.
    ReleaseNode {
        /// Freed node.
        node: NodeId,
    },
}

impl HostOp {
    /// Returns `true` for operations that change existing state, i.e. everything
    /// but creating and releasing detached nodes.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::CreateNode { .. } | Self::ReleaseNode { .. })
    }

    /// Returns `true` for operations that change the shape of the tree.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AppendChild { .. } | Self::InsertBefore { .. } | Self::RemoveNode { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeKind {
    Element(String),
    Text,
}

#[derive(Debug)]
struct MemoryNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    properties: BTreeMap<String, PropValue>,
    listeners: BTreeMap<String, Handler>,
}

impl MemoryNode {
    const fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            properties: BTreeMap::new(),
            listeners: BTreeMap::new(),
        }
    }
}

/// Host tree kept entirely in memory.
///
/// Removing a node only detaches it. Only [`HostTree::release_node`] frees a slot, and
/// ids are never handed out twice.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<Option<MemoryNode>>,
    log: Vec<HostOp>,
}

impl MemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached element to render into. Not recorded in the operation log.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(tag.to_owned()))
    }

    /// Operations received since the last [`MemoryHost::take_operations`].
    #[must_use]
    pub fn operations(&self) -> &[HostOp] {
        &self.log
    }

    /// Drains the operation log.
    pub fn take_operations(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.log)
    }

    /// Number of logged operations that changed existing state.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.log.iter().filter(|op| op.is_mutation()).count()
    }

    /// Number of nodes that have not been released, containers included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Tag of an element, `None` for text nodes and unknown ids.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text => None,
        }
    }

    /// Returns `true` for text nodes.
    #[must_use]
    pub fn is_text(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|node| node.kind == NodeKind::Text)
    }

    /// Parent of a node, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    /// Children of a node in order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Current value of a property.
    #[must_use]
    pub fn property(&self, node: NodeId, name: &str) -> Option<&PropValue> {
        self.node(node)?.properties.get(name)
    }

    /// Number of listeners installed on a node.
    #[must_use]
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.node(node).map_or(0, |node| node.listeners.len())
    }

    /// Returns `true` if `node` is `ancestor` or one of its descendants.
    #[must_use]
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Concatenated text of every text node below `node`, in document order.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.node(node) else {
            return;
        };
        if entry.kind == NodeKind::Text {
            if let Some(value) = entry.properties.get(TEXT_VALUE) {
                let _ = write!(out, "{value}");
            }
            return;
        }
        for child in &entry.children {
            self.collect_text(*child, out);
        }
    }

    /// Serializes the subtree rooted at `node`.
    ///
    /// Elements render as `<tag name="value">…</tag>` with properties in name order;
    /// listeners are omitted.
    #[must_use]
    pub fn to_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.node(node) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text => {
                if let Some(value) = entry.properties.get(TEXT_VALUE) {
                    let _ = write!(out, "{value}");
                }
            }
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &entry.properties {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                for child in &entry.children {
                    self.write_markup(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    /// Elements below `root` (inclusive) with the given tag, in document order.
    #[must_use]
    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if self.tag(id) == Some(tag) {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    /// First element below `root` (inclusive) with the given tag.
    #[must_use]
    pub fn find(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find_all(root, tag).into_iter().next()
    }

    /// Delivers `event` to the listener installed on `node` for its name.
    ///
    /// Returns `false` if no such listener exists.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> bool {
        let handler = self
            .node(node)
            .and_then(|entry| entry.listeners.get(event.name()))
            .cloned();
        match handler {
            Some(handler) => {
                handler.call(event);
                true
            }
            None => {
                tracing::debug!(%node, event = event.name(), "no listener for event");
                false
            }
        }
    }

    fn node(&self, node: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(node.0)?.as_ref()
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut MemoryNode> {
        let found = self.nodes.get_mut(node.0).and_then(Option::as_mut);
        if found.is_none() {
            tracing::warn!(%node, "operation on unknown node ignored");
        }
        found
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(MemoryNode::new(kind)));
        id
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).and_then(|node| node.parent) else {
            return;
        };
        if let Some(entry) = self.nodes.get_mut(parent.0).and_then(Option::as_mut) {
            entry.children.retain(|id| *id != child);
        }
        if let Some(entry) = self.nodes.get_mut(child.0).and_then(Option::as_mut) {
            entry.parent = None;
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if self.node(child).is_none() || self.node(parent).is_none() {
            tracing::warn!(%parent, %child, "attach with unknown node ignored");
            return;
        }
        self.detach(child);
        let Some(entry) = self.node_mut(parent) else {
            return;
        };
        let position = reference.and_then(|reference| entry.children.iter().position(|id| *id == reference));
        match position {
            Some(position) => entry.children.insert(position, child),
            None => {
                if let Some(reference) = reference {
                    tracing::warn!(%parent, %reference, "reference is not a child, appending");
                }
                entry.children.push(child);
            }
        }
        if let Some(entry) = self.node_mut(child) {
            entry.parent = Some(parent);
        }
    }
}

impl HostTree for MemoryHost {
    type Node = NodeId;

    fn create_node(&mut self, kind: HostKind<'_>) -> NodeId {
        let (kind, label) = match kind {
            HostKind::Element(tag) => (NodeKind::Element(tag.to_owned()), tag.to_owned()),
            HostKind::Text => (NodeKind::Text, "#text".to_owned()),
        };
        let node = self.alloc(kind);
        self.log.push(HostOp::CreateNode { node, kind: label });
        node
    }

    fn set_property(&mut self, node: &NodeId, name: &str, value: &PropValue) {
        if let Some(entry) = self.node_mut(*node) {
            entry.properties.insert(name.to_owned(), value.clone());
        }
        self.log.push(HostOp::SetProperty {
            node: *node,
            name: name.to_owned(),
            value: value.clone(),
        });
    }

    fn remove_property(&mut self, node: &NodeId, name: &str, _previous: &PropValue) {
        if let Some(entry) = self.node_mut(*node) {
            entry.properties.remove(name);
        }
        self.log.push(HostOp::RemoveProperty {
            node: *node,
            name: name.to_owned(),
        });
    }

    fn add_listener(&mut self, node: &NodeId, event: &str, handler: &Handler) {
        if let Some(entry) = self.node_mut(*node) {
            entry.listeners.insert(event.to_owned(), handler.clone());
        }
        self.log.push(HostOp::AddListener {
            node: *node,
            event: event.to_owned(),
        });
    }

    fn remove_listener(&mut self, node: &NodeId, event: &str, handler: &Handler) {
        if let Some(entry) = self.node_mut(*node)
            && entry.listeners.get(event).is_some_and(|installed| installed.ptr_eq(handler))
        {
            entry.listeners.remove(event);
        }
        self.log.push(HostOp::RemoveListener {
            node: *node,
            event: event.to_owned(),
        });
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.attach(*parent, *child, None);
        self.log.push(HostOp::AppendChild {
            parent: *parent,
            child: *child,
        });
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, reference: &NodeId) {
        self.attach(*parent, *child, Some(*reference));
        self.log.push(HostOp::InsertBefore {
            parent: *parent,
            child: *child,
            reference: *reference,
        });
    }

    fn remove_node(&mut self, node: &NodeId) {
        self.detach(*node);
        self.log.push(HostOp::RemoveNode { node: *node });
    }

    fn release_node(&mut self, node: &NodeId) {
        let detached = self
            .node(*node)
            .map(|entry| entry.parent.is_none() && entry.children.is_empty());
        match detached {
            Some(true) => {
                if let Some(slot) = self.nodes.get_mut(node.0) {
                    *slot = None;
                }
            }
            Some(false) => tracing::warn!(%node, "release of attached node ignored"),
            None => tracing::warn!(%node, "release of unknown node ignored"),
        }
        self.log.push(HostOp::ReleaseNode { node: *node });
    }
}
