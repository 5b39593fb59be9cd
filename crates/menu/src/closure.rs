//! Ancestor-Closure Resolver.
//!
//! A role may be granted only a deep leaf. To render a connected tree every
//! ancestor of a granted node has to come along, granted or not.

use std::collections::{BTreeSet, HashMap};

use menuauth_core::NodeId;

use crate::node::Node;

/// Bulk parent-pointer lookup.
///
/// One call per closure round; stores can answer it with a single batched
/// query. Ids unknown to the lookup are simply absent from the result.
pub trait ParentLookup {
    fn parents_of(&self, ids: &BTreeSet<NodeId>) -> Vec<(NodeId, Option<NodeId>)>;
}

/// In-memory parent index built from a node snapshot.
#[derive(Debug, Clone, Default)]
pub struct ParentIndex {
    parents: HashMap<NodeId, Option<NodeId>>,
}

impl ParentIndex {
    pub fn from_nodes(nodes: &[Node]) -> Self {
        Self {
            parents: nodes.iter().map(|n| (n.id, n.parent_id)).collect(),
        }
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.parents.contains_key(id)
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<NodeId> {
        self.parents.get(id).copied().flatten()
    }
}

impl ParentLookup for ParentIndex {
    fn parents_of(&self, ids: &BTreeSet<NodeId>) -> Vec<(NodeId, Option<NodeId>)> {
        ids.iter()
            .filter_map(|id| self.parents.get(id).map(|parent| (*id, *parent)))
            .collect()
    }
}

/// Close `granted` over the parent relation of `nodes`.
///
/// The result always contains `granted` itself (including ids that do not
/// resolve to any node) plus every ancestor reachable through `parent_id`.
pub fn close_ancestors(granted: &BTreeSet<NodeId>, nodes: &[Node]) -> BTreeSet<NodeId> {
    close_ancestors_with(granted, &ParentIndex::from_nodes(nodes))
}

/// Round-based closure against any [`ParentLookup`].
///
/// Each round looks up the parents of the ids added by the previous round and
/// keeps only those not yet in the result. The loop ends on the first round
/// that adds nothing, so even a corrupted cyclic parent graph terminates.
pub fn close_ancestors_with<L>(granted: &BTreeSet<NodeId>, lookup: &L) -> BTreeSet<NodeId>
where
    L: ParentLookup + ?Sized,
{
    let mut closed = granted.clone();
    let mut frontier = granted.clone();

    while !frontier.is_empty() {
        let next: BTreeSet<NodeId> = lookup
            .parents_of(&frontier)
            .into_iter()
            .filter_map(|(_, parent)| parent)
            .filter(|parent| !closed.contains(parent))
            .collect();

        closed.extend(next.iter().copied());
        frontier = next;
    }

    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use proptest::prelude::*;

    fn id(n: u128) -> NodeId {
        NodeId::from_u128(n)
    }

    fn node(n: u128, parent: Option<u128>) -> Node {
        let node = Node::new(id(n), format!("n{n}"), NodeKind::Group);
        match parent {
            Some(p) => node.with_parent(id(p)),
            None => node,
        }
    }

    fn set(ids: &[u128]) -> BTreeSet<NodeId> {
        ids.iter().map(|n| id(*n)).collect()
    }

    #[test]
    fn adds_every_ancestor_of_a_deep_leaf() {
        let nodes = vec![
            node(1, None),
            node(2, Some(1)),
            node(3, Some(2)),
            node(4, Some(3)),
            node(5, Some(1)),
        ];

        assert_eq!(close_ancestors(&set(&[4]), &nodes), set(&[1, 2, 3, 4]));
    }

    #[test]
    fn keeps_ids_without_nodes() {
        let nodes = vec![node(1, None)];
        assert_eq!(close_ancestors(&set(&[1, 42]), &nodes), set(&[1, 42]));
    }

    #[test]
    fn empty_grant_closes_to_empty() {
        let nodes = vec![node(1, None)];
        assert!(close_ancestors(&BTreeSet::new(), &nodes).is_empty());
    }

    #[test]
    fn terminates_on_corrupted_cycle() {
        let nodes = vec![node(1, Some(3)), node(2, Some(1)), node(3, Some(2))];
        assert_eq!(close_ancestors(&set(&[2]), &nodes), set(&[1, 2, 3]));
    }

    #[test]
    fn counts_one_lookup_per_round() {
        struct Counting<'a> {
            index: ParentIndex,
            calls: &'a core::cell::Cell<usize>,
        }

        impl ParentLookup for Counting<'_> {
            fn parents_of(&self, ids: &BTreeSet<NodeId>) -> Vec<(NodeId, Option<NodeId>)> {
                self.calls.set(self.calls.get() + 1);
                self.index.parents_of(ids)
            }
        }

        let nodes = vec![node(1, None), node(2, Some(1)), node(3, Some(2))];
        let calls = core::cell::Cell::new(0);
        let lookup = Counting {
            index: ParentIndex::from_nodes(&nodes),
            calls: &calls,
        };

        let closed = close_ancestors_with(&set(&[3]), &lookup);
        assert_eq!(closed, set(&[1, 2, 3]));
        // {3} -> {2} -> {1} -> {} : three rounds.
        assert_eq!(calls.get(), 3);
    }

    fn acyclic_nodes() -> impl Strategy<Value = Vec<Node>> {
        prop::collection::vec(prop::option::of(any::<prop::sample::Index>()), 1..40).prop_map(
            |parents| {
                parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, parent)| match parent {
                        Some(ix) if i > 0 => node(i as u128 + 1, Some(ix.index(i) as u128 + 1)),
                        _ => node(i as u128 + 1, None),
                    })
                    .collect()
            },
        )
    }

    proptest! {
        /// Property: closing an already-closed set changes nothing.
        #[test]
        fn closure_is_idempotent(
            nodes in acyclic_nodes(),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
        ) {
            let granted: BTreeSet<NodeId> =
                picks.iter().map(|ix| nodes[ix.index(nodes.len())].id).collect();

            let once = close_ancestors(&granted, &nodes);
            let twice = close_ancestors(&once, &nodes);
            prop_assert_eq!(&once, &twice);
            prop_assert!(granted.is_subset(&once));
        }

        /// Property: every member's parent is also a member.
        #[test]
        fn closure_is_parent_complete(
            nodes in acyclic_nodes(),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
        ) {
            let granted: BTreeSet<NodeId> =
                picks.iter().map(|ix| nodes[ix.index(nodes.len())].id).collect();
            let index = ParentIndex::from_nodes(&nodes);

            let closed = close_ancestors(&granted, &nodes);
            for member in &closed {
                if let Some(parent) = index.parent_of(member) {
                    prop_assert!(closed.contains(&parent));
                }
            }
        }
    }
}
