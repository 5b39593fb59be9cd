//! Route Projector: navigable nodes -> route tree with redirects resolved.

use serde::Serialize;

use menuauth_core::NodeId;

use crate::forest::{TreeNode, build_forest};
use crate::node::{Node, NodeKind, NodeMeta};

/// `meta` block of a route node: the node's presentation metadata plus its
/// sibling order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(flatten)]
    pub presentation: NodeMeta,
    pub order: i32,
}

/// Consumer-facing navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    #[serde(skip)]
    pub id: NodeId,
    pub name: String,
    /// The node's destination; empty when it has none.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// For a branch without its own destination: the first child's destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    pub meta: RouteMeta,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    /// Pre-order search by node id.
    pub fn find(&self, id: NodeId) -> Option<&RouteNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Number of routes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(RouteNode::subtree_len).sum::<usize>()
    }
}

/// Project the enabled, navigable part of a snapshot into a route tree.
///
/// Disabled nodes and Action nodes are dropped before the forest is built,
/// so an enabled node under a disabled parent surfaces as a root.
pub fn project_routes(nodes: &[Node]) -> Vec<RouteNode> {
    let selected: Vec<Node> = nodes
        .iter()
        .filter(|n| n.enabled && n.kind.is_navigable())
        .cloned()
        .collect();
    project_route_forest(&selected)
}

/// Project an already-selected node set without the enabled filter.
///
/// Used when the caller has chosen the nodes for structural reasons (e.g.
/// disabled ancestors kept so a granted page stays reachable). Action nodes
/// are still dropped.
pub fn project_route_forest(nodes: &[Node]) -> Vec<RouteNode> {
    let navigable: Vec<Node> = nodes
        .iter()
        .filter(|n| n.kind.is_navigable())
        .cloned()
        .collect();

    build_forest(&navigable).into_iter().map(to_route).collect()
}

fn to_route(tree: TreeNode) -> RouteNode {
    let TreeNode { node, children } = tree;

    let redirect = match (node.destination(), children.first()) {
        (None, Some(first)) => first.node.destination().map(str::to_string),
        _ => None,
    };

    let component = match node.kind {
        NodeKind::Page => node.component.clone().filter(|c| !c.is_empty()),
        _ => None,
    };

    RouteNode {
        id: node.id,
        path: node.destination().unwrap_or_default().to_string(),
        name: node.name,
        component,
        redirect,
        meta: RouteMeta {
            presentation: node.meta,
            order: node.order,
        },
        children: children.into_iter().map(to_route).collect(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
