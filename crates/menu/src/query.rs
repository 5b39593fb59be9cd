//! Administrative listing filters and uniqueness probes.

use serde::Deserialize;

use menuauth_core::NodeId;

use crate::node::{Node, NodeKind};

/// Listing filter for the menu management screen.
///
/// All criteria are optional and combined with AND. String criteria are
/// substring matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeQuery {
    pub name: Option<String>,
    pub title: Option<String>,
    pub enabled: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<NodeKind>,
    pub parent_id: Option<NodeId>,
}

impl NodeQuery {
    /// Only enabled nodes; what role editors pick grants from.
    pub fn enabled_only() -> Self {
        Self {
            enabled: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        if let Some(name) = self.name.as_deref()
            && !node.name.contains(name)
        {
            return false;
        }
        if let Some(title) = self.title.as_deref()
            && !node.meta.title.contains(title)
        {
            return false;
        }
        if self.enabled.is_some_and(|enabled| enabled != node.enabled) {
            return false;
        }
        if self.kind.is_some_and(|kind| kind != node.kind) {
            return false;
        }
        if self.parent_id.is_some() && self.parent_id != node.parent_id {
            return false;
        }
        true
    }

    /// Keep the nodes matching this query, in input order.
    pub fn filter(&self, nodes: &[Node]) -> Vec<Node> {
        nodes.iter().filter(|n| self.matches(n)).cloned().collect()
    }
}

/// Whether `name` is used by any node other than `exclude`.
pub fn name_in_use(nodes: &[Node], name: &str, exclude: Option<NodeId>) -> bool {
    nodes
        .iter()
        .any(|n| n.name == name && Some(n.id) != exclude)
}

/// Whether `destination` is used by any node other than `exclude`.
pub fn destination_in_use(nodes: &[Node], destination: &str, exclude: Option<NodeId>) -> bool {
    nodes
        .iter()
        .any(|n| n.destination() == Some(destination) && Some(n.id) != exclude)
}
