//! `menuauth-auth`: role-based access over the menu tree.
//!
//! This crate is decoupled from HTTP and storage: every function takes the
//! role and node snapshots it needs as arguments.

pub mod authorize;
pub mod grant;
pub mod permissions;
pub mod principal;
pub mod resolver;
pub mod role_guard;
pub mod roles;

pub use authorize::{
    AuthorizationExplanation, AuthzError, DenialKind, DenialReason, RequiresPermission, authorize,
    authorize_operation, explain_authorization, has_any_role, is_authorized,
};
pub use grant::{Grant, WILDCARD_TOKEN};
pub use permissions::PermissionCode;
pub use principal::{Principal, ResolvedRoles, RoleRef, normalize_role_refs};
pub use resolver::{
    Resolution, access_codes, all_access_codes, effective_grant, resolve_for_roles, resolve_with,
};
pub use role_guard::{RoleMutation, RoleRejected, apply_role_mutation, validate_role_mutation};
pub use roles::{
    AccessPolicy, DEFAULT_SUPER_ADMIN_ROLE, DEFAULT_USER_ROLE, Role, RoleName, builtin_roles,
};
