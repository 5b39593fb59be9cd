//! In-memory Node/Role Store for tests and single-process deployments.

use std::collections::BTreeSet;
use std::sync::RwLock;

use tracing::{info, warn};

use menuauth_auth::{
    AccessPolicy, Role, RoleMutation, apply_role_mutation, builtin_roles, validate_role_mutation,
};
use menuauth_core::NodeId;
use menuauth_menu::{Node, NodeMutation, ParentLookup, apply_mutation, validate_mutation};

use crate::store::{NodeStore, RoleFilter, RoleStore, StoreError};

/// Nodes and roles behind one `RwLock` each.
///
/// Mutations are validated and applied while holding the write lock, so the
/// check-then-write sequence sees a single consistent snapshot.
#[derive(Debug, Default)]
pub struct InMemoryMenuStore {
    nodes: RwLock<Vec<Node>>,
    roles: RwLock<Vec<Role>>,
}

impl InMemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(nodes: Vec<Node>, roles: Vec<Role>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
            roles: RwLock::new(roles),
        }
    }

    /// Add the built-in roles that are missing (matched by name).
    pub fn seed_builtin_roles(&self, policy: &AccessPolicy) -> Result<usize, StoreError> {
        let mut roles = self.roles.write().map_err(poisoned)?;
        let mut added = 0;
        for builtin in builtin_roles(policy) {
            if roles.iter().all(|r| r.name != builtin.name) {
                info!(role = %builtin.name, "seeding built-in role");
                roles.push(builtin);
                added += 1;
            }
        }
        Ok(added)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl NodeStore for InMemoryMenuStore {
    fn list_nodes(&self) -> Result<Vec<Node>, StoreError> {
        Ok(self.nodes.read().map_err(poisoned)?.clone())
    }

    fn apply_node_mutation(&self, mutation: NodeMutation) -> Result<(), StoreError> {
        let mut nodes = self.nodes.write().map_err(poisoned)?;
        if let Err(rejected) = validate_mutation(&mutation, &nodes) {
            warn!(
                op = mutation.kind(),
                node_id = %mutation.target(),
                code = rejected.code(),
                "node mutation rejected"
            );
            return Err(rejected.into());
        }

        let (op, target) = (mutation.kind(), mutation.target());
        apply_mutation(&mut nodes, mutation);
        info!(op, node_id = %target, "node mutation applied");
        Ok(())
    }
}

impl RoleStore for InMemoryMenuStore {
    fn list_roles(&self, filter: &RoleFilter) -> Result<Vec<Role>, StoreError> {
        let roles = self.roles.read().map_err(poisoned)?;
        Ok(roles.iter().filter(|r| filter.matches(r)).cloned().collect())
    }

    fn apply_role_mutation(
        &self,
        mutation: RoleMutation,
        policy: &AccessPolicy,
    ) -> Result<(), StoreError> {
        let mut roles = self.roles.write().map_err(poisoned)?;
        if let Err(rejected) = validate_role_mutation(&mutation, &roles, policy) {
            warn!(role_id = %mutation.target(), code = rejected.code(), "role mutation rejected");
            return Err(rejected.into());
        }
        apply_role_mutation(&mut roles, mutation);
        Ok(())
    }
}

/// One batched read per closure round.
impl ParentLookup for InMemoryMenuStore {
    fn parents_of(&self, ids: &BTreeSet<NodeId>) -> Vec<(NodeId, Option<NodeId>)> {
        match self.nodes.read() {
            Ok(nodes) => nodes
                .iter()
                .filter(|n| ids.contains(&n.id))
                .map(|n| (n.id, n.parent_id))
                .collect(),
            Err(_) => {
                warn!("node lock poisoned; parent lookup returns nothing");
                Vec::new()
            }
        }
    }
}
