//! Child list diffing.
//!
//! [`reconcile_children`] compares the children of a unit's previous counterpart with
//! a fresh list of descriptors and links a new child chain under the unit. Old units
//! are only read: reuse is expressed by `previous` links on the new units and removal
//! by pushing old ids onto the deletion list.

use std::collections::{HashMap, HashSet};

use undertow_core::{LookupKey, VirtualNode};

use crate::tree::UnitTree;
use crate::unit::{UnitId, WorkUnit};

/// Builds the child chain of `parent` for `descriptors`.
///
/// The list is matched in three phases: a positional walk while keys and types agree,
/// the two tail cases where one side is exhausted, and finally a lookup by key (or
/// position, for unkeyed children) over whatever old children remain.
pub(crate) fn reconcile_children<N: Clone>(
    tree: &mut UnitTree<N>,
    deletions: &mut Vec<UnitId>,
    parent: UnitId,
    descriptors: &[VirtualNode],
) {
    let mut chain = Chain::new(parent);
    let mut old = tree[parent]
        .previous
        .and_then(|previous| tree.get(previous))
        .and_then(|previous| previous.child);
    let mut index = 0;

    while let (Some(old_id), Some(descriptor)) = (old, descriptors.get(index)) {
        let previous = &tree[old_id];
        if !previous.matches(descriptor) {
            break;
        }
        let next_old = previous.sibling;
        let unit = WorkUnit::reused(descriptor, old_id, previous, parent, index);
        chain.push(tree, unit);
        old = next_old;
        index += 1;
    }

    if index == descriptors.len() {
        let mut remaining = old;
        while let Some(old_id) = remaining {
            deletions.push(old_id);
            remaining = tree[old_id].sibling;
        }
        chain.trace(tree, deletions.len());
        return;
    }

    let Some(first_remaining) = old else {
        for (index, descriptor) in descriptors.iter().enumerate().skip(index) {
            chain.push(tree, WorkUnit::placed(descriptor, parent, index));
        }
        chain.trace(tree, deletions.len());
        return;
    };

    let mut lookup: HashMap<LookupKey, UnitId> = HashMap::new();
    let mut remaining = Some(first_remaining);
    while let Some(old_id) = remaining {
        let unit = &tree[old_id];
        lookup
            .entry(LookupKey::new(unit.key.as_ref(), unit.index))
            .or_insert(old_id);
        remaining = unit.sibling;
    }

    let mut reused = HashSet::new();
    for (index, descriptor) in descriptors.iter().enumerate().skip(index) {
        let candidate = LookupKey::new(descriptor.key(), index);
        let found = lookup
            .get(&candidate)
            .copied()
            .filter(|old_id| tree[*old_id].matches(descriptor));
        let unit = match found {
            Some(old_id) => {
                lookup.remove(&candidate);
                reused.insert(old_id);
                WorkUnit::reused(descriptor, old_id, &tree[old_id], parent, index)
            }
            None => WorkUnit::placed(descriptor, parent, index),
        };
        chain.push(tree, unit);
    }

    let mut remaining = Some(first_remaining);
    while let Some(old_id) = remaining {
        if !reused.contains(&old_id) {
            deletions.push(old_id);
        }
        remaining = tree[old_id].sibling;
    }
    chain.trace(tree, deletions.len());
}

/// Appends new units to a parent's child chain and tracks the last placed position.
struct Chain {
    parent: UnitId,
    last: Option<UnitId>,
    last_placed: usize,
    len: usize,
}

impl Chain {
    const fn new(parent: UnitId) -> Self {
        Self {
            parent,
            last: None,
            last_placed: 0,
            len: 0,
        }
    }

    fn push<N>(&mut self, tree: &mut UnitTree<N>, mut unit: WorkUnit<N>) {
        if let Some(previous) = unit.previous {
            let old_index = tree[previous].index;
            if old_index < self.last_placed {
                unit.relocate = true;
            } else {
                self.last_placed = old_index;
            }
        }

        let id = tree.insert(unit);
        match self.last {
            Some(last) => tree[last].sibling = Some(id),
            None => tree[self.parent].child = Some(id),
        }
        self.last = Some(id);
        self.len += 1;
    }

    fn trace<N>(&self, tree: &UnitTree<N>, pending_deletions: usize) {
        tracing::trace!(
            target: "undertow::reconcile",
            parent = tree[self.parent].label(),
            children = self.len,
            pending_deletions,
            "reconciled children"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use undertow_core::{Props, element, text};

    use super::*;
    use crate::unit::Effect;

    struct Pass {
        tree: UnitTree<u32>,
        deletions: Vec<UnitId>,
        root: UnitId,
    }

    impl Pass {
        fn first(children: &[VirtualNode]) -> Self {
            let mut tree = UnitTree::new();
            let root = tree.insert(WorkUnit::root(0, Rc::new(Props::new()), None));
            let mut deletions = Vec::new();
            reconcile_children(&mut tree, &mut deletions, root, children);
            // Pretend the first pass committed: give every unit a host node.
            let ids: Vec<_> = tree.children(root).collect();
            for (n, id) in ids.into_iter().enumerate() {
                tree[id].host = Some(u32::try_from(n).unwrap_or_default() + 1);
            }
            Self {
                tree,
                deletions,
                root,
            }
        }

        fn next(mut self, children: &[VirtualNode]) -> Self {
            let root = self
                .tree
                .insert(WorkUnit::root(0, Rc::new(Props::new()), Some(self.root)));
            self.deletions.clear();
            reconcile_children(&mut self.tree, &mut self.deletions, root, children);
            self.root = root;
            self
        }

        fn summary(&self) -> Vec<(String, Effect, bool)> {
            self.tree
                .children(self.root)
                .map(|id| {
                    let unit = &self.tree[id];
                    let key = unit.key().map_or_else(|| "-".to_owned(), ToString::to_string);
                    (key, unit.effect(), unit.is_relocating())
                })
                .collect()
        }

        fn deleted_keys(&self) -> Vec<String> {
            self.deletions
                .iter()
                .map(|id| self.tree[*id].key().map_or_else(|| "-".to_owned(), ToString::to_string))
                .collect()
        }
    }

    fn items(keys: &[&'static str]) -> Vec<VirtualNode> {
        keys.iter().map(|key| element("li").key(*key).build()).collect()
    }

    fn row(key: &str, effect: Effect, relocate: bool) -> (String, Effect, bool) {
        (key.to_owned(), effect, relocate)
    }

    #[test]
    fn first_pass_places_everything() {
        let pass = Pass::first(&items(&["a", "b"]));
        assert_eq!(
            pass.summary(),
            vec![row("a", Effect::Place, false), row("b", Effect::Place, false)]
        );
        assert!(pass.deletions.is_empty());
    }

    #[test]
    fn unchanged_list_reuses_in_place() {
        let pass = Pass::first(&items(&["a", "b", "c"])).next(&items(&["a", "b", "c"]));
        assert!(pass.summary().iter().all(|(_, effect, relocate)| *effect == Effect::Update && !relocate));
        assert!(pass.deletions.is_empty());
    }

    #[test]
    fn truncated_list_deletes_tail() {
        let pass = Pass::first(&items(&["a", "b", "c"])).next(&items(&["a"]));
        assert_eq!(pass.summary(), vec![row("a", Effect::Update, false)]);
        assert_eq!(pass.deleted_keys(), vec!["b", "c"]);
    }

    #[test]
    fn extended_list_places_tail() {
        let pass = Pass::first(&items(&["a"])).next(&items(&["a", "b"]));
        assert_eq!(
            pass.summary(),
            vec![row("a", Effect::Update, false), row("b", Effect::Place, false)]
        );
    }

    #[test]
    fn keyed_reorder_flags_regressed_units() {
        let pass = Pass::first(&items(&["a", "b", "c"])).next(&items(&["c", "a"]));
        assert_eq!(
            pass.summary(),
            vec![row("c", Effect::Update, false), row("a", Effect::Update, true)]
        );
        assert_eq!(pass.deleted_keys(), vec!["b"]);
    }

    #[test]
    fn reversed_list_keeps_host_nodes() {
        let pass = Pass::first(&items(&["a", "b", "c"])).next(&items(&["c", "b", "a"]));
        assert_eq!(
            pass.summary(),
            vec![
                row("c", Effect::Update, false),
                row("b", Effect::Update, true),
                row("a", Effect::Update, true),
            ]
        );
        let hosts: Vec<_> = pass
            .tree
            .children(pass.root)
            .filter_map(|id| pass.tree[id].host().copied())
            .collect();
        assert_eq!(hosts, vec![3, 2, 1]);
    }

    #[test]
    fn type_change_replaces_unit() {
        let pass = Pass::first(&items(&["a"])).next(&[element("p").key("a").build()]);
        assert_eq!(pass.summary(), vec![row("a", Effect::Place, false)]);
        assert_eq!(pass.deleted_keys(), vec!["a"]);
    }

    #[test]
    fn text_children_match_by_position() {
        let pass = Pass::first(&[text("x"), element("b").build()])
            .next(&[element("b").build(), text("x")]);
        let effects: Vec<_> = pass.summary().into_iter().map(|(_, effect, _)| effect).collect();
        assert_eq!(effects, vec![Effect::Place, Effect::Place]);
        assert_eq!(pass.deletions.len(), 2);
    }

    #[test]
    fn keys_on_text_children_are_ignored() {
        let pass = Pass::first(&[text("a").with_key("k1")]).next(&[text("b").with_key("k2")]);
        assert_eq!(pass.summary(), vec![row("-", Effect::Update, false)]);
        assert!(pass.deletions.is_empty());
        let child = pass.tree.children(pass.root).next().expect("no child");
        assert_eq!(pass.tree[child].host(), Some(&1));
    }

    #[test]
    fn duplicate_keys_do_not_leak_old_units() {
        let pass = Pass::first(&items(&["a", "a", "b"])).next(&items(&["b"]));
        assert_eq!(pass.summary(), vec![row("b", Effect::Update, false)]);
        assert_eq!(pass.deleted_keys(), vec!["a", "a"]);
    }
}
