use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use menuauth_core::{Entity, NodeId, RoleId};

use crate::grant::Grant;

/// Name of the reserved super-admin role.
pub const DEFAULT_SUPER_ADMIN_ROLE: &str = "admin";

/// Name of the built-in default role.
pub const DEFAULT_USER_ROLE: &str = "user";

/// Role name, unique across roles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A role record as held by the role store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    #[serde(rename = "permissions", default)]
    pub grant: Grant,
    #[serde(rename = "isSuper", default)]
    pub is_super_admin: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub is_builtin: bool,
    #[serde(default)]
    pub remark: String,
}

fn default_enabled() -> bool {
    true
}

impl Role {
    /// An enabled, non-privileged role with no grants.
    pub fn new(id: RoleId, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            name: RoleName::new(name),
            grant: Grant::none(),
            is_super_admin: false,
            enabled: true,
            is_builtin: false,
            remark: String::new(),
        }
    }

    pub fn with_grants(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.grant = Grant::specific(ids);
        self
    }

    pub fn with_grant(mut self, grant: Grant) -> Self {
        self.grant = grant;
        self
    }

    pub fn super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }

    pub fn builtin(mut self) -> Self {
        self.is_builtin = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Replace the grant from administrator tokens.
    ///
    /// The super-admin flag follows the wildcard token: present sets it,
    /// absent clears it.
    pub fn set_grant_tokens<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.grant = Grant::from_tokens(tokens);
        self.is_super_admin = self.grant.is_unrestricted();
    }

    /// Grant tokens as shown to administrators (`["*"]` for super-admins).
    pub fn grant_tokens(&self) -> Vec<String> {
        if self.is_super_admin {
            Grant::Unrestricted.to_tokens()
        } else {
            self.grant.to_tokens()
        }
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> RoleId {
        self.id
    }
}

/// Decides which roles bypass grant checks.
///
/// Three signals mean the same thing: the super-admin flag, the reserved
/// sentinel name, and an unrestricted grant. All of them are evaluated here
/// and nowhere else. Disabled roles never bypass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    super_admin_name: RoleName,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SUPER_ADMIN_ROLE)
    }
}

impl AccessPolicy {
    pub fn new(super_admin_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            super_admin_name: RoleName::new(super_admin_name),
        }
    }

    pub fn super_admin_name(&self) -> &RoleName {
        &self.super_admin_name
    }

    pub fn is_unrestricted(&self, role: &Role) -> bool {
        role.enabled
            && (role.is_super_admin
                || role.name == self.super_admin_name
                || role.grant.is_unrestricted())
    }
}

/// Roles every store starts with: the super-admin role and the default user role.
pub fn builtin_roles(policy: &AccessPolicy) -> Vec<Role> {
    let mut admin = Role::new(RoleId::new(), policy.super_admin_name().as_str().to_string())
        .super_admin()
        .builtin();
    admin.remark = "built-in administrator role".to_string();

    let mut user = Role::new(RoleId::new(), DEFAULT_USER_ROLE).builtin();
    user.remark = "default user role".to_string();

    vec![admin, user]
}
