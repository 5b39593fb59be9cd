//! Guard for administrative role edits.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use menuauth_core::{DomainError, RoleId};

use crate::roles::{AccessPolicy, Role};

/// A single role edit, as submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RoleMutation {
    Create(Role),
    Update(Role),
    /// `assigned_users` is the number of users still holding the role.
    Delete { id: RoleId, assigned_users: usize },
}

impl RoleMutation {
    pub fn target(&self) -> RoleId {
        match self {
            RoleMutation::Create(role) | RoleMutation::Update(role) => role.id,
            RoleMutation::Delete { id, .. } => *id,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleRejected {
    #[error("role {id} already exists")]
    DuplicateId { id: RoleId },

    #[error("role {id} does not exist")]
    RoleNotFound { id: RoleId },

    #[error("role name '{name}' is already taken")]
    NameTaken { name: String },

    #[error("built-in role '{name}' cannot be renamed")]
    BuiltinRename { name: String },

    #[error("built-in role '{name}' cannot be deleted")]
    BuiltinDelete { name: String },

    #[error("built-in flag of role '{name}' cannot be changed")]
    BuiltinFlag { name: String },

    #[error("super-admin role '{name}' cannot be disabled")]
    SuperAdminDisabled { name: String },

    #[error("role '{name}' is still assigned to {users} user(s)")]
    InUse { name: String, users: usize },
}

impl RoleRejected {
    pub fn code(&self) -> &'static str {
        match self {
            RoleRejected::DuplicateId { .. } => "duplicate_id",
            RoleRejected::RoleNotFound { .. } => "role_not_found",
            RoleRejected::NameTaken { .. } => "name_taken",
            RoleRejected::BuiltinRename { .. } => "builtin_rename",
            RoleRejected::BuiltinDelete { .. } => "builtin_delete",
            RoleRejected::BuiltinFlag { .. } => "builtin_flag",
            RoleRejected::SuperAdminDisabled { .. } => "super_admin_disabled",
            RoleRejected::InUse { .. } => "in_use",
        }
    }
}

impl From<RoleRejected> for DomainError {
    fn from(value: RoleRejected) -> Self {
        match value {
            RoleRejected::RoleNotFound { id } => DomainError::not_found("role", id),
            RoleRejected::NameTaken { .. } | RoleRejected::DuplicateId { .. } => {
                DomainError::conflict(value.to_string())
            }
            other => DomainError::validation(format!("{}: {other}", other.code())),
        }
    }
}

/// Validate a role edit against the current role set.
pub fn validate_role_mutation(
    mutation: &RoleMutation,
    roles: &[Role],
    policy: &AccessPolicy,
) -> Result<(), RoleRejected> {
    match mutation {
        RoleMutation::Create(role) => {
            if roles.iter().any(|r| r.id == role.id) {
                return Err(RoleRejected::DuplicateId { id: role.id });
            }
            // Built-in roles are seeded by the store, never created.
            if role.is_builtin {
                return Err(RoleRejected::BuiltinFlag {
                    name: role.name.to_string(),
                });
            }
            ensure_name_free(role, roles)
        }
        RoleMutation::Update(role) => {
            let existing = find(roles, role.id)?;
            if existing.is_builtin != role.is_builtin {
                return Err(RoleRejected::BuiltinFlag {
                    name: existing.name.to_string(),
                });
            }
            if existing.is_builtin && existing.name != role.name {
                return Err(RoleRejected::BuiltinRename {
                    name: existing.name.to_string(),
                });
            }
            if existing.name == *policy.super_admin_name() && !role.enabled {
                return Err(RoleRejected::SuperAdminDisabled {
                    name: existing.name.to_string(),
                });
            }
            ensure_name_free(role, roles)
        }
        RoleMutation::Delete { id, assigned_users } => {
            let existing = find(roles, *id)?;
            if existing.is_builtin {
                return Err(RoleRejected::BuiltinDelete {
                    name: existing.name.to_string(),
                });
            }
            if *assigned_users > 0 {
                return Err(RoleRejected::InUse {
                    name: existing.name.to_string(),
                    users: *assigned_users,
                });
            }
            Ok(())
        }
    }
}

/// Apply an already validated edit.
///
/// The built-in flag is owned by the store: creates always clear it and
/// updates keep the stored value.
pub fn apply_role_mutation(roles: &mut Vec<Role>, mutation: RoleMutation) {
    let target = mutation.target();
    match mutation {
        RoleMutation::Create(mut role) => {
            role.is_builtin = false;
            roles.push(role);
        }
        RoleMutation::Update(mut role) => {
            if let Some(slot) = roles.iter_mut().find(|r| r.id == role.id) {
                role.is_builtin = slot.is_builtin;
                *slot = role;
            }
        }
        RoleMutation::Delete { id, .. } => roles.retain(|r| r.id != id),
    }
    info!(role_id = %target, "role mutation applied");
}

fn find(roles: &[Role], id: RoleId) -> Result<&Role, RoleRejected> {
    roles
        .iter()
        .find(|r| r.id == id)
        .ok_or(RoleRejected::RoleNotFound { id })
}

fn ensure_name_free(role: &Role, roles: &[Role]) -> Result<(), RoleRejected> {
    if roles.iter().any(|r| r.name == role.name && r.id != role.id) {
        return Err(RoleRejected::NameTaken {
            name: role.name.to_string(),
        });
    }
    Ok(())
}
