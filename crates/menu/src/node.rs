//! Menu node model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use menuauth_core::{Entity, NodeId};

// ─────────────────────────────────────────────────────────────────────────────
// Node kind
// ─────────────────────────────────────────────────────────────────────────────

/// Closed set of node kinds.
///
/// Serialized with the names the navigation front end already understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Directory node; groups children, has no view of its own.
    #[serde(rename = "catalog")]
    Group,
    /// A routed page.
    #[serde(rename = "menu")]
    Page,
    /// Leaf-only permission marker (a button or API operation).
    #[serde(rename = "button")]
    Action,
    /// A page rendered inside an iframe.
    #[serde(rename = "embedded")]
    Embedded,
    /// A link leaving the application.
    #[serde(rename = "link")]
    ExternalLink,
}

impl NodeKind {
    /// Whether nodes of this kind may appear in a route tree.
    pub fn is_navigable(self) -> bool {
        !matches!(self, NodeKind::Action)
    }

    pub fn is_action(self) -> bool {
        matches!(self, NodeKind::Action)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Group => "catalog",
            NodeKind::Page => "menu",
            NodeKind::Action => "button",
            NodeKind::Embedded => "embedded",
            NodeKind::ExternalLink => "link",
        }
    }
}

impl core::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Presentation metadata
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeType {
    Dot,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Default,
    Destructive,
    Primary,
    Success,
    Warning,
}

/// Presentation metadata.
///
/// Carried through to route nodes untouched; nothing in the authorization
/// logic reads these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_icon: Option<String>,
    pub keep_alive: bool,
    pub affix_tab: bool,
    pub hide_in_menu: bool,
    pub hide_children_in_menu: bool,
    pub hide_in_breadcrumb: bool,
    pub hide_in_tab: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_type: Option<BadgeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_variants: Option<BadgeVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iframe_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_path: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────────────────────────────────────

/// A single entry of the menu tree.
///
/// # Invariants (enforced by [`crate::validate_mutation`], not by construction)
/// - `id` and `name` are unique across the whole tree.
/// - `parent_id`, if set, references an existing node.
/// - The parent graph is acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Route path the node resolves to. Groups normally leave this unset.
    #[serde(default)]
    pub destination: Option<String>,
    /// View component; only meaningful for pages.
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default, rename = "authCode")]
    pub permission_code: Option<String>,
    #[serde(default)]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub meta: NodeMeta,
}

fn default_enabled() -> bool {
    true
}

impl Node {
    /// A new enabled root node created now.
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        let name = name.into();
        Self {
            id,
            parent_id: None,
            meta: NodeMeta {
                title: name.clone(),
                ..NodeMeta::default()
            },
            name,
            kind,
            destination: None,
            component: None,
            permission_code: None,
            order: 0,
            created_at: Utc::now(),
            enabled: true,
        }
    }

    pub fn with_parent(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_permission_code(mut self, code: impl Into<String>) -> Self {
        self.permission_code = Some(code.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = title.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The node's own destination; an empty string counts as absent.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref().filter(|d| !d.is_empty())
    }

    /// The node's permission code; an empty string counts as absent.
    pub fn permission_code(&self) -> Option<&str> {
        self.permission_code.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Ordering key among siblings: `order`, then creation time.
    pub fn sort_key(&self) -> (i32, DateTime<Utc>) {
        (self.order, self.created_at)
    }
}

impl Entity for Node {
    type Id = NodeId;

    fn id(&self) -> NodeId {
        self.id
    }
}
