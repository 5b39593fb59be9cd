//! `menuauth-infra`: stores, caching, configuration and the composed service.

pub mod cache;
pub mod config;
pub mod in_memory;
pub mod service;
pub mod store;

pub use cache::RoleNameCache;
pub use config::EngineConfig;
pub use in_memory::InMemoryMenuStore;
pub use service::MenuAccessService;
pub use store::{NodeStore, RoleFilter, RoleStore, StoreError};
