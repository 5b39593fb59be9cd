//! Role grants over the node tree.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use menuauth_core::NodeId;

/// Token administrators use for "everything".
pub const WILDCARD_TOKEN: &str = "*";

/// What a role is granted.
///
/// On the wire a grant is a list of string tokens: node ids, or the single
/// wildcard token `"*"` for [`Grant::Unrestricted`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum Grant {
    /// Everything, present and future.
    Unrestricted,
    /// Exactly these nodes.
    Specific(BTreeSet<NodeId>),
}

impl Default for Grant {
    fn default() -> Self {
        Self::none()
    }
}

impl Grant {
    pub fn none() -> Self {
        Self::Specific(BTreeSet::new())
    }

    pub fn specific(ids: impl IntoIterator<Item = NodeId>) -> Self {
        Self::Specific(ids.into_iter().collect())
    }

    /// Parse administrator-supplied tokens.
    ///
    /// Any wildcard token makes the grant unrestricted. Tokens that are not
    /// node ids are dropped.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids = BTreeSet::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token == WILDCARD_TOKEN {
                return Self::Unrestricted;
            }
            match token.parse::<NodeId>() {
                Ok(id) => {
                    ids.insert(id);
                }
                Err(err) => warn!(token = %token, error = %err, "dropping unparseable grant token"),
            }
        }
        Self::Specific(ids)
    }

    pub fn to_tokens(&self) -> Vec<String> {
        match self {
            Grant::Unrestricted => vec![WILDCARD_TOKEN.to_string()],
            Grant::Specific(ids) => ids.iter().map(NodeId::to_string).collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Grant::Unrestricted)
    }

    /// True for a specific grant with no nodes.
    pub fn is_empty(&self) -> bool {
        matches!(self, Grant::Specific(ids) if ids.is_empty())
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        match self {
            Grant::Unrestricted => true,
            Grant::Specific(ids) => ids.contains(id),
        }
    }

    /// Node ids of a specific grant; `None` when unrestricted.
    pub fn node_ids(&self) -> Option<&BTreeSet<NodeId>> {
        match self {
            Grant::Unrestricted => None,
            Grant::Specific(ids) => Some(ids),
        }
    }

    /// Union of two grants; unrestricted absorbs everything.
    pub fn union(self, other: &Grant) -> Grant {
        match (self, other) {
            (Grant::Unrestricted, _) | (_, Grant::Unrestricted) => Grant::Unrestricted,
            (Grant::Specific(mut ids), Grant::Specific(more)) => {
                ids.extend(more.iter().copied());
                Grant::Specific(ids)
            }
        }
    }
}

impl From<Vec<String>> for Grant {
    fn from(tokens: Vec<String>) -> Self {
        Self::from_tokens(tokens)
    }
}

impl From<Grant> for Vec<String> {
    fn from(grant: Grant) -> Self {
        grant.to_tokens()
    }
}
