use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use menuauth_core::RoleId;

use crate::roles::{Role, RoleName};

/// A role reference as supplied by callers: either a role id or a role name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum RoleRef {
    Id(RoleId),
    Name(RoleName),
}

impl RoleRef {
    /// Classify a raw reference. UUID-shaped strings are ids, anything else
    /// is a name. Blank input yields `None`.
    ///
    /// An id reference still matches a role whose name is that same UUID
    /// text (see [`RoleRef::matches`]).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match RoleId::from_str(raw) {
            Ok(id) => RoleRef::Id(id),
            Err(_) => RoleRef::Name(RoleName::new(raw.to_string())),
        })
    }

    /// Names compare exactly; ids compare against the role id or, for roles
    /// named like a UUID, against the name.
    pub fn matches(&self, role: &Role) -> bool {
        match self {
            RoleRef::Id(id) => role.id == *id || role.name.as_str() == id.to_string(),
            RoleRef::Name(name) => role.name == *name,
        }
    }
}

impl core::fmt::Display for RoleRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RoleRef::Id(id) => write!(f, "id:{id}"),
            RoleRef::Name(name) => write!(f, "name:{name}"),
        }
    }
}

impl From<RoleId> for RoleRef {
    fn from(value: RoleId) -> Self {
        RoleRef::Id(value)
    }
}

impl From<RoleName> for RoleRef {
    fn from(value: RoleName) -> Self {
        RoleRef::Name(value)
    }
}

/// A user, as far as authorization is concerned: the roles it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub role_refs: Vec<RoleRef>,
}

impl Principal {
    pub fn new(role_refs: impl IntoIterator<Item = RoleRef>) -> Self {
        Self {
            role_refs: role_refs.into_iter().collect(),
        }
    }

    /// Build from raw strings, each either a role id or a role name.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(raw.into_iter().filter_map(|r| RoleRef::parse(r.as_ref())))
    }

    pub fn ids(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.role_refs.iter().filter_map(|r| match r {
            RoleRef::Id(id) => Some(*id),
            RoleRef::Name(_) => None,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &RoleName> + '_ {
        self.role_refs.iter().filter_map(|r| match r {
            RoleRef::Name(name) => Some(name),
            RoleRef::Id(_) => None,
        })
    }
}

/// Outcome of normalising role references against a role catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRoles {
    /// Canonical role records, each at most once, in reference order.
    pub roles: Vec<Role>,
    /// References that matched no role; they grant nothing.
    pub unresolved: Vec<RoleRef>,
}

/// Resolve id- and name-form references to canonical roles.
///
/// A reference may match more than one role (an id reference also matches a
/// role named with that UUID); every match is kept.
pub fn normalize_role_refs(refs: &[RoleRef], catalog: &[Role]) -> ResolvedRoles {
    let mut seen: BTreeSet<RoleId> = BTreeSet::new();
    let mut resolved = ResolvedRoles::default();

    for role_ref in refs {
        let mut matched = false;
        for role in catalog.iter().filter(|role| role_ref.matches(role)) {
            matched = true;
            if seen.insert(role.id) {
                resolved.roles.push(role.clone());
            }
        }
        if !matched {
            warn!(role_ref = %role_ref, "role reference does not match any role; ignoring");
            resolved.unresolved.push(role_ref.clone());
        }
    }

    resolved
}
