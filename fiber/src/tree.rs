//! Arena holding every live work unit.

use std::collections::HashSet;
use std::ops::{Index, IndexMut};

use slotmap::SlotMap;

use crate::unit::{UnitId, WorkUnit};

/// Arena of work units.
///
/// Units of the committed tree, of the work-in-progress tree and of abandoned passes
/// all live here until [`UnitTree::sweep`] drops whatever the committed root can no
/// longer reach.
#[derive(Debug)]
pub struct UnitTree<N> {
    units: SlotMap<UnitId, WorkUnit<N>>,
}

impl<N> Default for UnitTree<N> {
    fn default() -> Self {
        Self {
            units: SlotMap::with_key(),
        }
    }
}

impl<N> UnitTree<N> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, unit: WorkUnit<N>) -> UnitId {
        self.units.insert(unit)
    }

    /// Looks up a unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&WorkUnit<N>> {
        self.units.get(id)
    }

    /// Returns `true` if the key still resolves.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(id)
    }

    /// Number of units in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the arena holds no unit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterates over the children of `id` in sibling order.
    pub fn children(&self, id: UnitId) -> Children<'_, N> {
        Children {
            tree: self,
            next: self.get(id).and_then(|unit| unit.child),
        }
    }

    /// Returns the nearest ancestor of `id` that owns a host node.
    #[must_use]
    pub fn host_parent(&self, id: UnitId) -> Option<UnitId> {
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            let unit = self.get(parent)?;
            if unit.host.is_some() {
                return Some(parent);
            }
            current = unit.parent;
        }
        None
    }

    /// Collects the topmost host-owning units at or below `id`, in tree order.
    ///
    /// `descend` decides whether a host-less unit is searched.
    pub(crate) fn top_level_hosts(
        &self,
        id: UnitId,
        descend: &impl Fn(&WorkUnit<N>) -> bool,
        out: &mut Vec<UnitId>,
    ) {
        let Some(unit) = self.get(id) else {
            return;
        };
        if unit.host.is_some() {
            out.push(id);
            return;
        }
        if !descend(unit) {
            return;
        }
        let mut child = unit.child;
        while let Some(current) = child {
            self.top_level_hosts(current, descend, out);
            child = self.get(current).and_then(|unit| unit.sibling);
        }
    }

    /// Drops every unit not reachable from `root` and clears `previous` links.
    ///
    /// Returns the number of units removed.
    pub(crate) fn sweep(&mut self, root: UnitId) -> usize {
        let mut reachable = HashSet::with_capacity(self.units.len());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            reachable.insert(id);
            stack.extend(unit.child);
            stack.extend(unit.sibling);
        }

        let before = self.units.len();
        self.units.retain(|id, unit| {
            unit.previous = None;
            reachable.contains(&id)
        });
        before - self.units.len()
    }
}

impl<N> Index<UnitId> for UnitTree<N> {
    type Output = WorkUnit<N>;

    fn index(&self, id: UnitId) -> &Self::Output {
        &self.units[id]
    }
}

impl<N> IndexMut<UnitId> for UnitTree<N> {
    fn index_mut(&mut self, id: UnitId) -> &mut Self::Output {
        &mut self.units[id]
    }
}

/// Iterator over the children of a unit.
#[derive(Debug)]
pub struct Children<'a, N> {
    tree: &'a UnitTree<N>,
    next: Option<UnitId>,
}

impl<N> Iterator for Children<'_, N> {
    type Item = UnitId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.get(id).and_then(|unit| unit.sibling);
        Some(id)
    }
}
