//! The work unit: one node of the mutable reconciliation tree.

use std::rc::Rc;

use undertow_core::{HookSlot, Key, NodeType, Props, VirtualNode};

slotmap::new_key_type! {
    /// Arena key of a [`WorkUnit`].
    ///
    /// Keys never dangle: once a unit is swept from the arena its key simply stops
    /// resolving, which is what makes links to the previous tree weak.
    pub struct UnitId;
}

/// Host mutation a unit asks the commit phase to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    /// Nothing to do. Only the root carries this effect.
    #[default]
    None,
    /// Insert a freshly created host node.
    Place,
    /// Reuse the host node of the previous unit and patch its properties.
    Update,
    /// Remove the host node. Only units in the deletion list carry this effect.
    Delete,
}

/// What a unit renders.
#[derive(Debug, Clone)]
pub enum UnitKind {
    /// The root of a render pass. Its host node is the container.
    Root,
    /// A unit created from a descriptor.
    Node(NodeType),
}

/// One node of the work-unit tree.
#[derive(Debug)]
pub struct WorkUnit<N> {
    pub(crate) kind: UnitKind,
    pub(crate) key: Option<Key>,
    pub(crate) props: Rc<Props>,
    pub(crate) host: Option<N>,
    pub(crate) previous: Option<UnitId>,
    pub(crate) effect: Effect,
    pub(crate) index: usize,
    pub(crate) relocate: bool,
    pub(crate) parent: Option<UnitId>,
    pub(crate) child: Option<UnitId>,
    pub(crate) sibling: Option<UnitId>,
    pub(crate) hooks: Vec<HookSlot>,
}

impl<N: Clone> WorkUnit<N> {
    /// Creates the root of a render pass over `container`.
    pub(crate) fn root(container: N, props: Rc<Props>, previous: Option<UnitId>) -> Self {
        Self {
            kind: UnitKind::Root,
            key: None,
            props,
            host: Some(container),
            previous,
            effect: Effect::None,
            index: 0,
            relocate: false,
            parent: None,
            child: None,
            sibling: None,
            hooks: Vec::new(),
        }
    }

    /// Creates a unit with no previous counterpart, to be inserted at commit.
    pub(crate) fn placed(descriptor: &VirtualNode, parent: UnitId, index: usize) -> Self {
        Self {
            kind: UnitKind::Node(descriptor.node_type().clone()),
            key: descriptor.key().cloned(),
            props: descriptor.props().clone(),
            host: None,
            previous: None,
            effect: Effect::Place,
            index,
            relocate: false,
            parent: Some(parent),
            child: None,
            sibling: None,
            hooks: Vec::new(),
        }
    }

    /// Creates a unit that takes over the host node of `previous`.
    pub(crate) fn reused(
        descriptor: &VirtualNode,
        previous_id: UnitId,
        previous: &Self,
        parent: UnitId,
        index: usize,
    ) -> Self {
        Self {
            kind: UnitKind::Node(descriptor.node_type().clone()),
            key: descriptor.key().cloned(),
            props: descriptor.props().clone(),
            host: previous.host.clone(),
            previous: Some(previous_id),
            effect: Effect::Update,
            index,
            relocate: false,
            parent: Some(parent),
            child: None,
            sibling: None,
            hooks: Vec::new(),
        }
    }
}

impl<N> WorkUnit<N> {
    /// Returns `true` if this unit can be reused for `descriptor`.
    pub(crate) fn matches(&self, descriptor: &VirtualNode) -> bool {
        self.key.as_ref() == descriptor.key()
            && match &self.kind {
                UnitKind::Node(node_type) => node_type.same_type(descriptor.node_type()),
                UnitKind::Root => false,
            }
    }

    /// Returns what this unit renders.
    #[must_use]
    pub const fn kind(&self) -> &UnitKind {
        &self.kind
    }

    /// Returns the descriptor type, or `None` for the root.
    #[must_use]
    pub const fn node_type(&self) -> Option<&NodeType> {
        match &self.kind {
            UnitKind::Node(node_type) => Some(node_type),
            UnitKind::Root => None,
        }
    }

    /// Label used in logs, errors and commit reports.
    #[must_use]
    pub fn label(&self) -> &str {
        match &self.kind {
            UnitKind::Node(node_type) => node_type.label(),
            UnitKind::Root => "#root",
        }
    }

    /// Returns the explicit key, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Returns the props this unit was rendered with.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Returns the host node owned by this unit.
    #[must_use]
    pub const fn host(&self) -> Option<&N> {
        self.host.as_ref()
    }

    /// Returns the unit this one was reconciled against.
    ///
    /// Cleared once the unit is committed.
    #[must_use]
    pub const fn previous(&self) -> Option<UnitId> {
        self.previous
    }

    /// Returns the effect assigned by reconciliation.
    #[must_use]
    pub const fn effect(&self) -> Effect {
        self.effect
    }

    /// Position among siblings.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` if the host node has to move to a new position among its siblings.
    #[must_use]
    pub const fn is_relocating(&self) -> bool {
        self.relocate
    }

    /// Returns the parent link.
    #[must_use]
    pub const fn parent(&self) -> Option<UnitId> {
        self.parent
    }

    /// Returns the first-child link.
    #[must_use]
    pub const fn child(&self) -> Option<UnitId> {
        self.child
    }

    /// Returns the next-sibling link.
    #[must_use]
    pub const fn sibling(&self) -> Option<UnitId> {
        self.sibling
    }

    /// Number of hook slots persisted by the last render of this unit.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}
