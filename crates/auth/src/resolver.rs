//! Permission Resolver: roles + node snapshot -> visible routes and held codes.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use menuauth_core::{NodeId, index_by_id};
use menuauth_menu::{
    Node, ParentIndex, ParentLookup, RouteNode, close_ancestors_with, dangling_parents,
    project_route_forest, project_routes,
};

use crate::grant::Grant;
use crate::roles::{AccessPolicy, Role};

/// What a set of roles may see and do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub routes: Vec<RouteNode>,
    pub codes: BTreeSet<String>,
    /// True when some role bypassed grant checks.
    pub unrestricted: bool,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.codes.is_empty()
    }
}

/// Union of what the enabled roles grant.
///
/// Any role the policy deems unrestricted makes the whole set unrestricted.
/// Disabled roles contribute nothing.
pub fn effective_grant(roles: &[Role], policy: &AccessPolicy) -> Grant {
    if let Some(role) = roles.iter().find(|r| policy.is_unrestricted(r)) {
        debug!(role = %role.name, "unrestricted role present");
        return Grant::Unrestricted;
    }

    roles
        .iter()
        .filter(|r| r.enabled)
        .fold(Grant::none(), |acc, role| acc.union(&role.grant))
}

/// Resolve the route tree and permission codes for `roles`.
pub fn resolve_for_roles(roles: &[Role], nodes: &[Node], policy: &AccessPolicy) -> Resolution {
    resolve_with(roles, nodes, policy, &ParentIndex::from_nodes(nodes))
}

/// [`resolve_for_roles`] with ancestor closure answered by `lookup`.
pub fn resolve_with<L>(
    roles: &[Role],
    nodes: &[Node],
    policy: &AccessPolicy,
    lookup: &L,
) -> Resolution
where
    L: ParentLookup + ?Sized,
{
    for node_id in dangling_parents(nodes) {
        warn!(%node_id, "node parent is outside the snapshot; treating the node as a root");
    }

    let direct = match effective_grant(roles, policy) {
        Grant::Unrestricted => {
            return Resolution {
                routes: project_routes(nodes),
                codes: all_access_codes(nodes),
                unrestricted: true,
            };
        }
        Grant::Specific(ids) => ids,
    };

    if direct.is_empty() {
        debug!(roles = roles.len(), "no grants; denying by default");
        return Resolution::default();
    }

    let anchors = anchors(&direct, nodes);
    let closed = close_ancestors_with(&anchors, lookup);

    let selected: Vec<Node> = nodes
        .iter()
        .filter(|n| closed.contains(&n.id) && !n.kind.is_action())
        .cloned()
        .collect();

    let resolution = Resolution {
        routes: project_route_forest(&selected),
        codes: codes_for(&direct, nodes),
        unrestricted: false,
    };
    debug!(
        granted = direct.len(),
        closed = closed.len(),
        codes = resolution.codes.len(),
        "resolved roles"
    );
    resolution
}

/// Codes `roles` hold, without building any tree.
pub fn access_codes(roles: &[Role], nodes: &[Node], policy: &AccessPolicy) -> BTreeSet<String> {
    match effective_grant(roles, policy) {
        Grant::Unrestricted => all_access_codes(nodes),
        Grant::Specific(ids) => codes_for(&ids, nodes),
    }
}

/// Codes of every enabled Action node.
pub fn all_access_codes(nodes: &[Node]) -> BTreeSet<String> {
    nodes
        .iter()
        .filter(|n| n.kind.is_action() && n.enabled)
        .filter_map(|n| n.permission_code().map(str::to_string))
        .collect()
}

// Codes are never inherited through the tree: only directly granted actions count.
fn codes_for(direct: &BTreeSet<NodeId>, nodes: &[Node]) -> BTreeSet<String> {
    nodes
        .iter()
        .filter(|n| n.kind.is_action() && n.enabled && direct.contains(&n.id))
        .filter_map(|n| n.permission_code().map(str::to_string))
        .collect()
}

/// Granted ids that anchor the visible tree: existing, enabled nodes.
///
/// Disabled ancestors still come in through the closure; a disabled grant on
/// its own does not.
fn anchors(direct: &BTreeSet<NodeId>, nodes: &[Node]) -> BTreeSet<NodeId> {
    let by_id = index_by_id(nodes);
    let mut anchors = BTreeSet::new();
    for id in direct {
        match by_id.get(id) {
            Some(node) if node.enabled => {
                anchors.insert(*id);
            }
            Some(_) => debug!(node_id = %id, "granted node is disabled"),
            None => warn!(node_id = %id, "grant refers to a node that does not exist"),
        }
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuauth_core::RoleId;
    use menuauth_menu::NodeKind;

    fn id(n: u128) -> NodeId {
        NodeId::from_u128(n)
    }

    fn scenario() -> Vec<Node> {
        vec![
            Node::new(id(1), "root", NodeKind::Group),
            Node::new(id(2), "users", NodeKind::Page)
                .with_parent(id(1))
                .with_destination("/users"),
            Node::new(id(3), "user-create", NodeKind::Action)
                .with_parent(id(2))
                .with_permission_code("user:create"),
        ]
    }

    fn role(grants: impl IntoIterator<Item = NodeId>) -> Role {
        Role::new(RoleId::new(), "r").with_grants(grants)
    }

    #[test]
    fn leaf_action_grant_pulls_in_its_ancestors() {
        let nodes = scenario();
        let res = resolve_for_roles(&[role([id(3)])], &nodes, &AccessPolicy::default());

        assert_eq!(res.routes.len(), 1);
        let root = &res.routes[0];
        assert_eq!(root.id, id(1));
        assert_eq!(root.redirect.as_deref(), Some("/users"));
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id, id(2));
        assert!(root.children[0].children.is_empty());

        assert_eq!(res.codes, BTreeSet::from(["user:create".to_string()]));
        assert!(!res.unrestricted);
    }

    #[test]
    fn super_admin_sees_everything_with_no_grants() {
        let nodes = scenario();
        let admin = Role::new(RoleId::new(), "ops").super_admin();
        let res = resolve_for_roles(&[admin], &nodes, &AccessPolicy::default());

        assert!(res.unrestricted);
        assert_eq!(res.routes[0].subtree_len(), 2);
        assert!(res.codes.contains("user:create"));
    }

    #[test]
    fn empty_grants_deny_by_default() {
        let res = resolve_for_roles(&[role([])], &scenario(), &AccessPolicy::default());
        assert!(res.is_empty());
        assert!(resolve_for_roles(&[], &scenario(), &AccessPolicy::default()).is_empty());
    }

    #[test]
    fn codes_are_not_inherited_from_granted_pages() {
        let nodes = scenario();
        let res = resolve_for_roles(&[role([id(2)])], &nodes, &AccessPolicy::default());
        assert_eq!(res.routes[0].subtree_len(), 2);
        assert!(res.codes.is_empty());
    }

    #[test]
    fn disabled_roles_contribute_nothing() {
        let nodes = scenario();
        let disabled = role([id(3)]).disabled();
        let res = resolve_for_roles(&[disabled], &nodes, &AccessPolicy::default());
        assert!(res.is_empty());

        let admin = Role::new(RoleId::new(), "admin").disabled();
        assert!(!resolve_for_roles(&[admin], &nodes, &AccessPolicy::default()).unrestricted);
    }

    #[test]
    fn dangling_grants_are_ignored() {
        let nodes = scenario();
        let res = resolve_for_roles(&[role([id(99), id(3)])], &nodes, &AccessPolicy::default());
        assert_eq!(res.routes.len(), 1);
        assert_eq!(res.codes.len(), 1);
    }

    #[test]
    fn disabled_ancestor_is_kept_for_structure() {
        let mut nodes = scenario();
        nodes[0].enabled = false;

        let res = resolve_for_roles(&[role([id(2)])], &nodes, &AccessPolicy::default());
        assert_eq!(res.routes[0].id, id(1));
        assert_eq!(res.routes[0].children[0].id, id(2));
    }

    #[test]
    fn disabled_grant_without_enabled_descendant_is_hidden() {
        let mut nodes = scenario();
        nodes[1].enabled = false;

        let res = resolve_for_roles(&[role([id(2)])], &nodes, &AccessPolicy::default());
        assert!(res.routes.is_empty());
    }

    #[test]
    fn disabled_actions_yield_no_codes() {
        let mut nodes = scenario();
        nodes[2].enabled = false;

        assert!(access_codes(&[role([id(3)])], &nodes, &AccessPolicy::default()).is_empty());
        assert!(all_access_codes(&nodes).is_empty());
    }

    #[test]
    fn wildcard_grant_equals_bypass() {
        let nodes = scenario();
        let wildcard = Role::new(RoleId::new(), "ops").with_grant(Grant::Unrestricted);
        let res = resolve_for_roles(&[wildcard], &nodes, &AccessPolicy::default());
        assert!(res.unrestricted);
        assert_eq!(res.codes, all_access_codes(&nodes));
    }

    #[test]
    fn grants_union_across_roles() {
        let nodes = vec![
            Node::new(id(1), "a", NodeKind::Action).with_permission_code("a"),
            Node::new(id(2), "b", NodeKind::Action).with_permission_code("b"),
        ];
        let codes = access_codes(&[role([id(1)]), role([id(2)])], &nodes, &AccessPolicy::default());
        assert_eq!(codes.len(), 2);
    }
}
