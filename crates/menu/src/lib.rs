//! `menuauth-menu`: the menu tree itself.
//!
//! Pure functions over a caller-supplied snapshot of nodes:
//! - [`build_forest`] assembles the ordered tree,
//! - [`close_ancestors`] adds every ancestor of a granted id set,
//! - [`project_routes`] derives the navigation route tree,
//! - [`validate_mutation`] guards structural edits.

pub mod closure;
pub mod forest;
pub mod mutation;
pub mod node;
pub mod query;
pub mod route;

pub use closure::{ParentIndex, ParentLookup, close_ancestors, close_ancestors_with};
pub use forest::{TreeNode, build_forest, dangling_parents};
pub use mutation::{MutationRejected, NodeMutation, apply_mutation, validate_mutation};
pub use node::{BadgeType, BadgeVariant, Node, NodeKind, NodeMeta};
pub use query::{NodeQuery, destination_in_use, name_in_use};
pub use route::{RouteMeta, RouteNode, project_route_forest, project_routes};
