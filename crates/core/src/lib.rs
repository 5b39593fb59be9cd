//! `menuauth-core`: shared building blocks for the menu authorization engine.
//!
//! This crate holds identifiers and the error model only; it never performs IO.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, index_by_id};
pub use error::{DomainError, DomainResult};
pub use id::{NodeId, RoleId};
