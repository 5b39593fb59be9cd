//! Tree Builder: flat node snapshot -> ordered forest.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use menuauth_core::NodeId;

use crate::node::Node;

/// A node together with its materialized, ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::subtree_len).sum::<usize>()
    }

    /// Pre-order walk over the subtree.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Assemble a flat node collection into an ordered forest.
///
/// A node whose `parent_id` does not resolve inside `nodes` becomes a root.
/// Every children list, and the root list, is sorted by `(order, created_at)`;
/// ties keep input order.
///
/// Every input node appears exactly once in the output. On corrupted input
/// where a group of nodes forms a parent cycle (no member reachable from a
/// root), the first member in input order is promoted to a root and the
/// cycle is cut there.
pub fn build_forest(nodes: &[Node]) -> Vec<TreeNode> {
    let position: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id, idx))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (idx, node) in nodes.iter().enumerate() {
        match node.parent_id.and_then(|pid| position.get(&pid)) {
            Some(&parent) if parent != idx => children[parent].push(idx),
            _ => roots.push(idx),
        }
    }

    sort_siblings(&mut roots, nodes);
    for list in &mut children {
        sort_siblings(list, nodes);
    }

    let mut placed: HashSet<usize> = HashSet::with_capacity(nodes.len());
    let mut forest: Vec<TreeNode> = roots
        .iter()
        .map(|&idx| assemble(idx, nodes, &children, &mut placed))
        .collect();

    if placed.len() < nodes.len() {
        for idx in 0..nodes.len() {
            if !placed.contains(&idx) {
                forest.push(assemble(idx, nodes, &children, &mut placed));
            }
        }
    }

    forest
}

/// Ids of nodes whose `parent_id` points outside the snapshot.
pub fn dangling_parents(nodes: &[Node]) -> Vec<NodeId> {
    let ids: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
    nodes
        .iter()
        .filter(|n| n.parent_id.is_some_and(|pid| !ids.contains(&pid)))
        .map(|n| n.id)
        .collect()
}

fn sort_siblings(list: &mut [usize], nodes: &[Node]) {
    list.sort_by_key(|&idx| nodes[idx].sort_key());
}

fn assemble(
    idx: usize,
    nodes: &[Node],
    children: &[Vec<usize>],
    placed: &mut HashSet<usize>,
) -> TreeNode {
    placed.insert(idx);

    let mut kids = Vec::with_capacity(children[idx].len());
    for &child in &children[idx] {
        if placed.contains(&child) {
            continue;
        }
        kids.push(assemble(child, nodes, children, placed));
    }

    TreeNode {
        node: nodes[idx].clone(),
        children: kids,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
