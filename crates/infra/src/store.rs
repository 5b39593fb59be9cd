//! Node/Role Store collaborator contracts.

use std::sync::Arc;

use thiserror::Error;

use menuauth_auth::{AccessPolicy, Role, RoleMutation, RoleName, RoleRejected};
use menuauth_core::{DomainError, RoleId};
use menuauth_menu::{MutationRejected, Node, NodeMutation};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("node mutation rejected: {0}")]
    Rejected(#[from] MutationRejected),

    #[error("role mutation rejected: {0}")]
    RoleRejected(#[from] RoleRejected),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Stable reason code of a rejection, if this is one.
    pub fn rejection_code(&self) -> Option<&'static str> {
        match self {
            StoreError::Rejected(r) => Some(r.code()),
            StoreError::RoleRejected(r) => Some(r.code()),
            StoreError::Unavailable(_) => None,
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Rejected(r) => r.into(),
            StoreError::RoleRejected(r) => r.into(),
            StoreError::Unavailable(msg) => DomainError::invariant(format!("store unavailable: {msg}")),
        }
    }
}

/// Which roles to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleFilter {
    All,
    ByIds(Vec<RoleId>),
    ByNames(Vec<RoleName>),
}

impl RoleFilter {
    pub fn matches(&self, role: &Role) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::ByIds(ids) => ids.contains(&role.id),
            RoleFilter::ByNames(names) => names.contains(&role.name),
        }
    }

    /// True when the filter cannot match anything.
    pub fn is_empty(&self) -> bool {
        match self {
            RoleFilter::All => false,
            RoleFilter::ByIds(ids) => ids.is_empty(),
            RoleFilter::ByNames(names) => names.is_empty(),
        }
    }
}

/// Source of node snapshots and sink for validated node edits.
///
/// `apply_node_mutation` must validate and write against one consistent
/// snapshot (a transaction, a write lock, ...); two concurrent moves must not
/// be able to slip a cycle past each other.
pub trait NodeStore: Send + Sync {
    fn list_nodes(&self) -> Result<Vec<Node>, StoreError>;
    fn apply_node_mutation(&self, mutation: NodeMutation) -> Result<(), StoreError>;
}

pub trait RoleStore: Send + Sync {
    fn list_roles(&self, filter: &RoleFilter) -> Result<Vec<Role>, StoreError>;
    fn apply_role_mutation(
        &self,
        mutation: RoleMutation,
        policy: &AccessPolicy,
    ) -> Result<(), StoreError>;
}

impl<S> NodeStore for Arc<S>
where
    S: NodeStore + ?Sized,
{
    fn list_nodes(&self) -> Result<Vec<Node>, StoreError> {
        (**self).list_nodes()
    }

    fn apply_node_mutation(&self, mutation: NodeMutation) -> Result<(), StoreError> {
        (**self).apply_node_mutation(mutation)
    }
}

impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    fn list_roles(&self, filter: &RoleFilter) -> Result<Vec<Role>, StoreError> {
        (**self).list_roles(filter)
    }

    fn apply_role_mutation(
        &self,
        mutation: RoleMutation,
        policy: &AccessPolicy,
    ) -> Result<(), StoreError> {
        (**self).apply_role_mutation(mutation, policy)
    }
}
