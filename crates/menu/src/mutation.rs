//! Mutation Guard: structural validation of node edits.
//!
//! Validation runs against a snapshot that the caller must hold stable until
//! the edit is written (the store does this under its write lock).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use menuauth_core::{DomainError, NodeId, index_by_id};

use crate::node::Node;

/// A single administrative edit of the node tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NodeMutation {
    /// Add a new node.
    Insert(Node),
    /// Replace an existing node (same id), possibly under a new parent.
    Update(Node),
    /// Move an existing node under `parent_id` (`None` makes it a root).
    Relocate {
        id: NodeId,
        parent_id: Option<NodeId>,
    },
    /// Remove a leaf node.
    Delete { id: NodeId },
}

impl NodeMutation {
    /// The id of the node being edited.
    pub fn target(&self) -> NodeId {
        match self {
            NodeMutation::Insert(node) | NodeMutation::Update(node) => node.id,
            NodeMutation::Relocate { id, .. } | NodeMutation::Delete { id } => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NodeMutation::Insert(_) => "insert",
            NodeMutation::Update(_) => "update",
            NodeMutation::Relocate { .. } => "relocate",
            NodeMutation::Delete { .. } => "delete",
        }
    }
}

/// Reason a mutation was rejected. Nothing is applied on rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationRejected {
    #[error("node id {id} already exists")]
    DuplicateId { id: NodeId },

    #[error("node {id} does not exist")]
    NodeNotFound { id: NodeId },

    #[error("node name '{name}' is already used by node {existing}")]
    NameTaken { name: String, existing: NodeId },

    #[error("node {id} cannot be its own parent")]
    SelfParent { id: NodeId },

    #[error("parent node {parent_id} does not exist")]
    ParentNotFound { parent_id: NodeId },

    #[error("moving node {id} under {parent_id} would make it its own ancestor")]
    Cycle { id: NodeId, parent_id: NodeId },

    #[error("node {id} still has {children} child node(s)")]
    HasChildren { id: NodeId, children: usize },
}

impl MutationRejected {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            MutationRejected::DuplicateId { .. } => "duplicate_id",
            MutationRejected::NodeNotFound { .. } => "node_not_found",
            MutationRejected::NameTaken { .. } => "name_taken",
            MutationRejected::SelfParent { .. } => "self_parent",
            MutationRejected::ParentNotFound { .. } => "parent_not_found",
            MutationRejected::Cycle { .. } => "cycle",
            MutationRejected::HasChildren { .. } => "has_children",
        }
    }
}

impl From<MutationRejected> for DomainError {
    fn from(value: MutationRejected) -> Self {
        match value {
            MutationRejected::NodeNotFound { id } => DomainError::not_found("node", id),
            other => DomainError::validation(format!("{}: {other}", other.code())),
        }
    }
}

/// Validate `mutation` against the current `nodes`.
///
/// Checks run in order and stop at the first failure:
/// 1. name collision with a different node,
/// 2. self-parenting,
/// 3. missing parent,
/// 4. cycle introduction,
/// 5. deleting a node that still has children.
///
/// Id existence (`DuplicateId` for inserts, `NodeNotFound` otherwise) is
/// checked before any of these.
pub fn validate_mutation(mutation: &NodeMutation, nodes: &[Node]) -> Result<(), MutationRejected> {
    let by_id = index_by_id(nodes);

    match mutation {
        NodeMutation::Insert(candidate) => {
            if by_id.contains_key(&candidate.id) {
                return Err(MutationRejected::DuplicateId { id: candidate.id });
            }
            check_name(candidate, nodes)?;
            check_parent(candidate.id, candidate.parent_id, &by_id)
        }
        NodeMutation::Update(candidate) => {
            if !by_id.contains_key(&candidate.id) {
                return Err(MutationRejected::NodeNotFound { id: candidate.id });
            }
            check_name(candidate, nodes)?;
            check_parent(candidate.id, candidate.parent_id, &by_id)
        }
        NodeMutation::Relocate { id, parent_id } => {
            if !by_id.contains_key(id) {
                return Err(MutationRejected::NodeNotFound { id: *id });
            }
            check_parent(*id, *parent_id, &by_id)
        }
        NodeMutation::Delete { id } => {
            if !by_id.contains_key(id) {
                return Err(MutationRejected::NodeNotFound { id: *id });
            }
            let children = nodes.iter().filter(|n| n.parent_id == Some(*id)).count();
            if children > 0 {
                return Err(MutationRejected::HasChildren { id: *id, children });
            }
            Ok(())
        }
    }
}

/// Apply an already-validated mutation to an owned snapshot.
///
/// Stores call this after [`validate_mutation`] succeeded under the same lock.
pub fn apply_mutation(nodes: &mut Vec<Node>, mutation: NodeMutation) {
    match mutation {
        NodeMutation::Insert(node) => nodes.push(node),
        NodeMutation::Update(node) => {
            if let Some(slot) = nodes.iter_mut().find(|n| n.id == node.id) {
                *slot = node;
            }
        }
        NodeMutation::Relocate { id, parent_id } => {
            if let Some(slot) = nodes.iter_mut().find(|n| n.id == id) {
                slot.parent_id = parent_id;
            }
        }
        NodeMutation::Delete { id } => nodes.retain(|n| n.id != id),
    }
}

fn check_name(candidate: &Node, nodes: &[Node]) -> Result<(), MutationRejected> {
    match nodes
        .iter()
        .find(|n| n.name == candidate.name && n.id != candidate.id)
    {
        Some(existing) => Err(MutationRejected::NameTaken {
            name: candidate.name.clone(),
            existing: existing.id,
        }),
        None => Ok(()),
    }
}

fn check_parent(
    id: NodeId,
    parent_id: Option<NodeId>,
    by_id: &HashMap<NodeId, &Node>,
) -> Result<(), MutationRejected> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    if parent_id == id {
        return Err(MutationRejected::SelfParent { id });
    }

    if !by_id.contains_key(&parent_id) {
        return Err(MutationRejected::ParentNotFound { parent_id });
    }

    // Walk upward from the candidate parent; meeting `id` means the edit
    // would place the node beneath its own descendant.
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut current = Some(parent_id);
    while let Some(cursor) = current {
        if cursor == id {
            return Err(MutationRejected::Cycle { id, parent_id });
        }
        if !visited.insert(cursor) {
            break;
        }
        current = by_id.get(&cursor).and_then(|n| n.parent_id);
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

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

    /// 1 -> 2 -> 3, and 4 as a separate root.
    fn chain() -> Vec<Node> {
        vec![node(1, None), node(2, Some(1)), node(3, Some(2)), node(4, None)]
    }

    #[test]
    fn insert_accepts_fresh_leaf() {
        let op = NodeMutation::Insert(node(5, Some(3)));
        assert_eq!(validate_mutation(&op, &chain()), Ok(()));
    }

    #[test]
    fn insert_rejects_taken_name() {
        let candidate = Node::new(id(5), "n2", NodeKind::Page);
        let err = validate_mutation(&NodeMutation::Insert(candidate), &chain()).unwrap_err();
        assert_eq!(err.code(), "name_taken");
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let candidate = Node::new(id(2), "fresh", NodeKind::Page);
        let err = validate_mutation(&NodeMutation::Insert(candidate), &chain()).unwrap_err();
        assert_eq!(err, MutationRejected::DuplicateId { id: id(2) });
    }

    #[test]
    fn update_may_keep_its_own_name() {
        let op = NodeMutation::Update(node(2, Some(4)));
        assert_eq!(validate_mutation(&op, &chain()), Ok(()));
    }

    #[test]
    fn name_check_runs_before_parent_checks() {
        let mut candidate = node(2, Some(2));
        candidate.name = "n3".to_string();
        let err = validate_mutation(&NodeMutation::Update(candidate), &chain()).unwrap_err();
        assert_eq!(err.code(), "name_taken");
    }

    #[test]
    fn rejects_self_parent() {
        let op = NodeMutation::Relocate {
            id: id(2),
            parent_id: Some(id(2)),
        };
        assert_eq!(
            validate_mutation(&op, &chain()),
            Err(MutationRejected::SelfParent { id: id(2) })
        );
    }

    #[test]
    fn rejects_missing_parent() {
        let op = NodeMutation::Insert(node(9, Some(77)));
        assert_eq!(
            validate_mutation(&op, &chain()),
            Err(MutationRejected::ParentNotFound { parent_id: id(77) })
        );
    }

    #[test]
    fn rejects_move_under_descendant() {
        let op = NodeMutation::Relocate {
            id: id(1),
            parent_id: Some(id(3)),
        };
        assert_eq!(
            validate_mutation(&op, &chain()),
            Err(MutationRejected::Cycle {
                id: id(1),
                parent_id: id(3)
            })
        );
    }

    #[test]
    fn move_to_root_is_accepted() {
        let op = NodeMutation::Relocate {
            id: id(3),
            parent_id: None,
        };
        assert_eq!(validate_mutation(&op, &chain()), Ok(()));
    }

    #[test]
    fn cycle_walk_is_bounded_on_corrupt_data() {
        // 5 <-> 6 already form a cycle that does not contain node 1.
        let mut nodes = chain();
        nodes.push(node(5, Some(6)));
        nodes.push(node(6, Some(5)));

        let op = NodeMutation::Relocate {
            id: id(1),
            parent_id: Some(id(5)),
        };
        assert_eq!(validate_mutation(&op, &nodes), Ok(()));
    }

    #[test]
    fn delete_rejects_non_leaf_and_missing() {
        assert_eq!(
            validate_mutation(&NodeMutation::Delete { id: id(1) }, &chain()),
            Err(MutationRejected::HasChildren {
                id: id(1),
                children: 1
            })
        );
        assert_eq!(
            validate_mutation(&NodeMutation::Delete { id: id(3) }, &chain()),
            Ok(())
        );
        let err = validate_mutation(&NodeMutation::Delete { id: id(40) }, &chain()).unwrap_err();
        assert!(DomainError::from(err).is_not_found());
    }

    #[test]
    fn rejection_maps_to_validation_error() {
        let err = DomainError::from(MutationRejected::SelfParent { id: id(1) });
        assert!(matches!(err, DomainError::Validation(msg) if msg.starts_with("self_parent")));
    }

    #[test]
    fn apply_mutation_edits_snapshot() {
        let mut nodes = chain();
        apply_mutation(
            &mut nodes,
            NodeMutation::Relocate {
                id: id(3),
                parent_id: Some(id(4)),
            },
        );
        apply_mutation(&mut nodes, NodeMutation::Delete { id: id(2) });
        apply_mutation(&mut nodes, NodeMutation::Insert(node(8, None)));

        assert_eq!(nodes.len(), 4);
        let moved = nodes.iter().find(|n| n.id == id(3)).unwrap();
        assert_eq!(moved.parent_id, Some(id(4)));
    }

    proptest! {
        /// Property: re-parenting a node under any of its descendants is rejected.
        #[test]
        fn moving_under_descendant_always_rejected(
            depth in 2u128..20,
            pick in any::<prop::sample::Index>(),
        ) {
            let nodes: Vec<Node> = (1..=depth)
                .map(|n| node(n, if n == 1 { None } else { Some(n - 1) }))
                .collect();
            let ancestor = pick.index(depth as usize - 1) as u128 + 1;
            let descendant = ancestor + 1 + (depth - ancestor) / 2;

            let op = NodeMutation::Relocate {
                id: id(ancestor),
                parent_id: Some(id(descendant)),
            };
            let rejected = validate_mutation(&op, &nodes).unwrap_err();
            prop_assert_eq!(rejected.code(), "cycle");
        }
    }
}
