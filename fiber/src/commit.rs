//! Applies a reconciled tree to the host.
//!
//! Commit runs to completion in one go. Deletions are processed first, then the
//! work-in-progress tree is walked depth first, child before sibling.

use std::fmt;
use std::ptr;

use undertow_core::{
    Handler, HostTree, Key, LISTENER_PREFIX, PropValue, Props, RenderError, event_name,
};

use crate::tree::UnitTree;
use crate::unit::{Effect, UnitId, WorkUnit};

/// One unit touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CommitRecord {
    /// Type label of the unit.
    pub label: String,
    /// Explicit key of the unit.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_key"))]
    pub key: Option<Key>,
    /// Effect that was applied.
    pub effect: Effect,
    /// Whether the host node was moved.
    pub relocated: bool,
}

#[cfg(feature = "serde")]
fn serialize_key<S: serde::Serializer>(key: &Option<Key>, serializer: S) -> Result<S::Ok, S::Error> {
    match key {
        Some(key) => serializer.collect_str(key),
        None => serializer.serialize_none(),
    }
}

/// Summary of a finished commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CommitReport {
    records: Vec<CommitRecord>,
    placed: usize,
    updated: usize,
    relocated: usize,
    deleted: usize,
}

impl CommitReport {
    /// Touched units in processing order: deletions first, then the tree walk.
    ///
    /// Empty when the scheduler was configured not to record commits.
    #[must_use]
    pub fn records(&self) -> &[CommitRecord] {
        &self.records
    }

    /// Units whose host nodes were inserted.
    #[must_use]
    pub const fn placed(&self) -> usize {
        self.placed
    }

    /// Units that kept their host node.
    #[must_use]
    pub const fn updated(&self) -> usize {
        self.updated
    }

    /// Updated units whose host nodes were moved.
    #[must_use]
    pub const fn relocated(&self) -> usize {
        self.relocated
    }

    /// Removed subtrees.
    #[must_use]
    pub const fn deleted(&self) -> usize {
        self.deleted
    }

    /// Returns records with the given effect.
    pub fn with_effect(&self, effect: Effect) -> impl Iterator<Item = &CommitRecord> {
        self.records.iter().filter(move |record| record.effect == effect)
    }

    /// Keys of the records with the given effect, rendered as strings.
    #[must_use]
    pub fn keys(&self, effect: Effect) -> Vec<String> {
        self.with_effect(effect)
            .filter_map(|record| record.key.as_ref().map(ToString::to_string))
            .collect()
    }
}

impl fmt::Display for CommitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} placed, {} updated ({} moved), {} deleted",
            self.placed, self.updated, self.relocated, self.deleted
        )
    }
}

pub(crate) struct Committer<'a, H: HostTree> {
    host: &'a mut H,
    tree: &'a UnitTree<H::Node>,
    report: CommitReport,
    record: bool,
}

impl<'a, H: HostTree> Committer<'a, H> {
    pub(crate) fn new(host: &'a mut H, tree: &'a UnitTree<H::Node>, record: bool) -> Self {
        Self {
            host,
            tree,
            report: CommitReport::default(),
            record,
        }
    }

    pub(crate) fn finish(self) -> CommitReport {
        self.report
    }

    /// Removes the host nodes of an old unit, or of its topmost host descendants.
    pub(crate) fn delete(&mut self, id: UnitId) {
        let tree = self.tree;
        let mut hosts = Vec::new();
        tree.top_level_hosts(id, &|_| true, &mut hosts);
        for node in hosts.iter().filter_map(|host| tree[*host].host.as_ref()) {
            self.host.remove_node(node);
        }
        self.note(id, Effect::Delete, false);
    }

    /// Applies the effects of every unit below `root`.
    pub(crate) fn walk(&mut self, root: UnitId) -> Result<(), RenderError> {
        let tree = self.tree;
        let mut stack: Vec<UnitId> = tree[root].child.into_iter().collect();
        while let Some(id) = stack.pop() {
            let unit = &tree[id];
            stack.extend(unit.sibling);
            match unit.effect {
                Effect::Delete => continue,
                Effect::Place => self.place(id)?,
                Effect::Update => self.update(id)?,
                Effect::None => {}
            }
            stack.extend(unit.child);
        }
        Ok(())
    }

    /// Fills in the properties of a node created during render and attaches it.
    fn place(&mut self, id: UnitId) -> Result<(), RenderError> {
        let tree = self.tree;
        let unit = &tree[id];
        if let Some(node) = &unit.host {
            let parent = self.parent_node(id)?;
            apply_props(self.host, node, &unit.props);
            let anchor = self.anchor(id);
            self.attach(parent, node, anchor);
        }
        self.note(id, Effect::Place, false);
        Ok(())
    }

    fn update(&mut self, id: UnitId) -> Result<(), RenderError> {
        let tree = self.tree;
        let unit = &tree[id];
        if let (Some(node), Some(previous)) =
            (&unit.host, unit.previous.and_then(|previous| tree.get(previous)))
        {
            diff_props(self.host, node, &previous.props, &unit.props);
        }

        if unit.relocate {
            let parent = self.parent_node(id)?;
            let anchor = self.anchor(id);
            let mut hosts = Vec::new();
            tree.top_level_hosts(id, &|unit| unit.effect == Effect::Update, &mut hosts);
            for host in hosts {
                let moved = &tree[host];
                if let (Effect::Update, Some(node)) = (moved.effect, &moved.host) {
                    self.attach(parent, node, anchor);
                }
            }
        }
        self.note(id, Effect::Update, unit.relocate);
        Ok(())
    }

    fn attach(&mut self, parent: &H::Node, node: &H::Node, anchor: Option<&H::Node>) {
        match anchor {
            Some(reference) => self.host.insert_before(parent, node, reference),
            None => self.host.append_child(parent, node),
        }
    }

    fn parent_node(&self, id: UnitId) -> Result<&'a H::Node, RenderError> {
        let tree = self.tree;
        tree.host_parent(id)
            .and_then(|parent| tree[parent].host.as_ref())
            .ok_or_else(|| RenderError::MissingHostAncestor {
                unit: tree[id].label().to_owned(),
            })
    }

    /// Finds the host node `id` has to be inserted before.
    ///
    /// Only units that stay where they are qualify: a sibling that is itself being
    /// placed or moved has no settled position yet. The search climbs through
    /// host-less ancestors until it reaches the host parent, where `None` means append.
    fn anchor(&self, id: UnitId) -> Option<&'a H::Node> {
        let tree = self.tree;
        let mut current = id;
        loop {
            let mut sibling = tree[current].sibling;
            while let Some(candidate) = sibling {
                if let Some(node) = stable_host(tree, candidate) {
                    return Some(node);
                }
                sibling = tree[candidate].sibling;
            }
            let parent = tree[current].parent?;
            if tree[parent].host.is_some() {
                return None;
            }
            current = parent;
        }
    }

    fn note(&mut self, id: UnitId, effect: Effect, relocated: bool) {
        let report = &mut self.report;
        match effect {
            Effect::Place => report.placed += 1,
            Effect::Update => report.updated += 1,
            Effect::Delete => report.deleted += 1,
            Effect::None => {}
        }
        if relocated {
            report.relocated += 1;
        }
        if self.record {
            let unit = &self.tree[id];
            report.records.push(CommitRecord {
                label: unit.label().to_owned(),
                key: unit.key.clone(),
                effect,
                relocated,
            });
        }
    }
}

/// First host node, in tree order, of a unit that keeps its position.
fn stable_host<N>(tree: &UnitTree<N>, id: UnitId) -> Option<&N> {
    let unit: &WorkUnit<N> = &tree[id];
    if unit.effect != Effect::Update || unit.relocate {
        return None;
    }
    if let Some(node) = &unit.host {
        return Some(node);
    }
    tree.children(id).find_map(|child| stable_host(tree, child))
}

fn listener<'p>(name: &str, value: &'p PropValue) -> Option<(String, &'p Handler)> {
    let handler = value.as_handler()?;
    let event = event_name(LISTENER_PREFIX, name)?;
    Some((event, handler))
}

fn apply_prop<H: HostTree>(host: &mut H, node: &H::Node, name: &str, value: &PropValue) {
    match listener(name, value) {
        Some((event, handler)) => host.add_listener(node, &event, handler),
        None => host.set_property(node, name, value),
    }
}

fn detach_prop<H: HostTree>(host: &mut H, node: &H::Node, name: &str, previous: &PropValue) {
    match listener(name, previous) {
        Some((event, handler)) => host.remove_listener(node, &event, handler),
        None => host.remove_property(node, name, previous),
    }
}

/// Applies every property of a freshly created host node.
fn apply_props<H: HostTree>(host: &mut H, node: &H::Node, props: &Props) {
    for (name, value) in props.attributes() {
        apply_prop(host, node, name, value);
    }
}

/// Brings a host node from `previous` to `next`, skipping unchanged values.
pub(crate) fn diff_props<H: HostTree>(host: &mut H, node: &H::Node, previous: &Props, next: &Props) {
    if ptr::eq(previous, next) {
        return;
    }
    for (name, old) in previous.attributes() {
        if !next.contains(name) {
            detach_prop(host, node, name, old);
        }
    }
    for (name, value) in next.attributes() {
        if let Some(old) = previous.get(name) {
            if old == value {
                continue;
            }
            if listener(name, old).is_some() || listener(name, value).is_some() {
                detach_prop(host, node, name, old);
            }
        }
        apply_prop(host, node, name, value);
    }
}
