use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use menuauth_menu::Node;

use crate::permissions::PermissionCode;
use crate::resolver::access_codes;
use crate::roles::{AccessPolicy, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires one of [{}]", .0.join(", "))]
    Forbidden(Vec<String>),
}

/// Operation-side authorization contract.
///
/// Implement this on operations guarded by permission codes; callers check
/// it with [`authorize_operation`] before dispatching.
pub trait RequiresPermission {
    fn required_permissions(&self) -> &[PermissionCode];
}

/// Authorization Guard.
///
/// - empty `required` allows (nothing declared, nothing restricted)
/// - any unrestricted role allows
/// - otherwise allows iff at least one required code is held (OR semantics)
pub fn is_authorized<S>(required: &[S], roles: &[Role], nodes: &[Node], policy: &AccessPolicy) -> bool
where
    S: AsRef<str>,
{
    if required.is_empty() {
        return true;
    }
    if roles.iter().any(|r| policy.is_unrestricted(r)) {
        return true;
    }

    let held = access_codes(roles, nodes, policy);
    let allowed = required.iter().any(|code| held.contains(code.as_ref()));
    debug!(required = required.len(), held = held.len(), allowed, "authorization check");
    allowed
}

/// [`is_authorized`] as a `Result`.
pub fn authorize<S>(
    required: &[S],
    roles: &[Role],
    nodes: &[Node],
    policy: &AccessPolicy,
) -> Result<(), AuthzError>
where
    S: AsRef<str>,
{
    if is_authorized(required, roles, nodes, policy) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(
            required.iter().map(|c| c.as_ref().to_string()).collect(),
        ))
    }
}

pub fn authorize_operation<O>(
    operation: &O,
    roles: &[Role],
    nodes: &[Node],
    policy: &AccessPolicy,
) -> Result<(), AuthzError>
where
    O: RequiresPermission + ?Sized,
{
    let required: Vec<&str> = operation
        .required_permissions()
        .iter()
        .map(PermissionCode::as_str)
        .collect();
    authorize(&required, roles, nodes, policy)
}

/// Role-name guard: allows if any enabled role is named in `required`.
///
/// Unrestricted roles always pass; an empty requirement always passes.
pub fn has_any_role<S>(required: &[S], roles: &[Role], policy: &AccessPolicy) -> bool
where
    S: AsRef<str>,
{
    if required.is_empty() {
        return true;
    }
    roles.iter().any(|role| {
        policy.is_unrestricted(role)
            || (role.enabled && required.iter().any(|name| role.name.as_str() == name.as_ref()))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Auditable record of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub required: Vec<String>,
    pub granted: bool,
    pub reason: String,
    /// Name of the role that bypassed grant checks, if any.
    pub unrestricted_role: Option<String>,
    /// Enabled roles taken into account.
    pub roles: Vec<String>,
    pub held_codes: Vec<String>,
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The roles hold no permission codes at all.
    NoGrants,
    MissingPermission,
}

/// Explain the decision [`is_authorized`] makes for the same inputs.
pub fn explain_authorization<S>(
    required: &[S],
    roles: &[Role],
    nodes: &[Node],
    policy: &AccessPolicy,
) -> AuthorizationExplanation
where
    S: AsRef<str>,
{
    let required: Vec<String> = required.iter().map(|c| c.as_ref().to_string()).collect();
    let role_names: Vec<String> = roles
        .iter()
        .filter(|r| r.enabled)
        .map(|r| r.name.to_string())
        .collect();
    let unrestricted_role = roles
        .iter()
        .find(|r| policy.is_unrestricted(r))
        .map(|r| r.name.to_string());
    let held: BTreeSet<String> = access_codes(roles, nodes, policy);

    let mut explanation = AuthorizationExplanation {
        required: required.clone(),
        granted: true,
        reason: String::new(),
        unrestricted_role: unrestricted_role.clone(),
        roles: role_names,
        held_codes: held.iter().cloned().collect(),
        denial_reason: None,
    };

    if required.is_empty() {
        explanation.reason = "no permission required".to_string();
        return explanation;
    }
    if let Some(role) = unrestricted_role {
        explanation.reason = format!("role '{role}' is unrestricted");
        return explanation;
    }
    if let Some(code) = required.iter().find(|c| held.contains(c.as_str())) {
        explanation.reason = format!("holds permission '{code}'");
        return explanation;
    }

    explanation.granted = false;
    explanation.reason = format!("none of [{}] is held", required.join(", "));
    explanation.denial_reason = Some(if held.is_empty() {
        DenialReason {
            kind: DenialKind::NoGrants,
            message: "roles grant no permission codes".to_string(),
            missing: required,
        }
    } else {
        DenialReason {
            kind: DenialKind::MissingPermission,
            message: "roles grant other permission codes only".to_string(),
            missing: required,
        }
    });
    explanation
}

#[cfg(test)]
mod tests {
    use super::*;
    use menuauth_core::{NodeId, RoleId};
    use menuauth_menu::NodeKind;
    use proptest::prelude::*;

    fn id(n: u128) -> NodeId {
        NodeId::from_u128(n)
    }

    fn nodes() -> Vec<Node> {
        vec![
            Node::new(id(1), "root", NodeKind::Group),
            Node::new(id(2), "users", NodeKind::Page)
                .with_parent(id(1))
                .with_destination("/users"),
            Node::new(id(3), "user-create", NodeKind::Action)
                .with_parent(id(2))
                .with_permission_code("user:create"),
            Node::new(id(4), "user-delete", NodeKind::Action)
                .with_parent(id(2))
                .with_permission_code("user:delete"),
        ]
    }

    fn role(grants: impl IntoIterator<Item = NodeId>) -> Role {
        Role::new(RoleId::new(), "editor").with_grants(grants)
    }

    #[test]
    fn scenario_checks() {
        let policy = AccessPolicy::default();
        let nodes = nodes();
        let roles = [role([id(3)])];

        assert!(is_authorized(&["user:create"], &roles, &nodes, &policy));
        assert!(!is_authorized(&["user:delete"], &roles, &nodes, &policy));
        assert!(is_authorized(&["user:delete", "user:create"], &roles, &nodes, &policy));
    }

    #[test]
    fn empty_requirement_always_allows() {
        let none: [&str; 0] = [];
        assert!(is_authorized(&none, &[], &nodes(), &AccessPolicy::default()));
    }

    #[test]
    fn authorize_reports_required_codes() {
        let err = authorize(&["user:delete"], &[role([id(3)])], &nodes(), &AccessPolicy::default())
            .unwrap_err();
        assert_eq!(err, AuthzError::Forbidden(vec!["user:delete".to_string()]));
        assert_eq!(err.to_string(), "forbidden: requires one of [user:delete]");
    }

    struct ListUsers;

    impl RequiresPermission for ListUsers {
        fn required_permissions(&self) -> &[PermissionCode] {
            const REQUIRED: &[PermissionCode] = &[];
            REQUIRED
        }
    }

    struct CreateUser(Vec<PermissionCode>);

    impl RequiresPermission for CreateUser {
        fn required_permissions(&self) -> &[PermissionCode] {
            &self.0
        }
    }

    #[test]
    fn operations_declare_their_codes() {
        let policy = AccessPolicy::default();
        let nodes = nodes();
        let roles = [role([id(3)])];

        assert!(authorize_operation(&ListUsers, &[], &nodes, &policy).is_ok());
        let create = CreateUser(vec![PermissionCode::new("user:create")]);
        assert!(authorize_operation(&create, &roles, &nodes, &policy).is_ok());
        let delete = CreateUser(vec![PermissionCode::new("user:delete")]);
        assert!(authorize_operation(&delete, &roles, &nodes, &policy).is_err());
    }

    #[test]
    fn role_guard_honours_bypass_and_disabled_roles() {
        let policy = AccessPolicy::default();
        let editor = Role::new(RoleId::new(), "editor");
        let admin = Role::new(RoleId::new(), "admin");

        assert!(has_any_role(&["editor"], std::slice::from_ref(&editor), &policy));
        assert!(!has_any_role(&["auditor"], std::slice::from_ref(&editor), &policy));
        assert!(has_any_role(&["auditor"], &[admin], &policy));
        assert!(!has_any_role(&["editor"], &[editor.disabled()], &policy));
    }

    #[test]
    fn explanation_matches_decision() {
        let policy = AccessPolicy::default();
        let nodes = nodes();

        let granted = explain_authorization(&["user:create"], &[role([id(3)])], &nodes, &policy);
        assert!(granted.granted);
        assert_eq!(granted.held_codes, vec!["user:create".to_string()]);

        let missing = explain_authorization(&["user:delete"], &[role([id(3)])], &nodes, &policy);
        assert!(!missing.granted);
        let denial = missing.denial_reason.unwrap();
        assert_eq!(denial.kind, DenialKind::MissingPermission);
        assert_eq!(denial.missing, vec!["user:delete".to_string()]);

        let nothing = explain_authorization(&["user:delete"], &[role([])], &nodes, &policy);
        assert_eq!(nothing.denial_reason.unwrap().kind, DenialKind::NoGrants);

        let admin = Role::new(RoleId::new(), "ops").super_admin();
        let bypass = explain_authorization(&["anything"], &[admin], &nodes, &policy);
        assert!(bypass.granted);
        assert_eq!(bypass.unrestricted_role.as_deref(), Some("ops"));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn super_admin_is_authorized_for_any_code(codes in prop::collection::vec("[a-z]{1,8}:[a-z]{1,8}", 1..5)) {
            let admin = Role::new(RoleId::new(), "ops").super_admin();
            prop_assert!(is_authorized(codes.as_slice(), &[admin], &nodes(), &AccessPolicy::default()));
        }

        #[test]
        fn empty_grants_are_denied_for_any_code(codes in prop::collection::vec("[a-z]{1,8}:[a-z]{1,8}", 1..5)) {
            prop_assert!(!is_authorized(codes.as_slice(), &[role([])], &nodes(), &AccessPolicy::default()));
        }
    }
}
