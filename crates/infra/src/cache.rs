//! Role-id -> role-name read-through cache.
//!
//! Best effort only: entries may go stale between TTL expiry and explicit
//! invalidation, so every cached name is re-checked against the role the
//! store returns for it. A mismatch evicts the entry and falls back to an
//! id lookup.

use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use menuauth_auth::RoleName;
use menuauth_core::RoleId;

use crate::config::MAX_ROLE_CACHE_TTL_SECS;

#[derive(Clone)]
pub struct RoleNameCache {
    inner: Cache<RoleId, RoleName>,
}

impl std::fmt::Debug for RoleNameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleNameCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl RoleNameCache {
    /// `ttl` is capped at [`MAX_ROLE_CACHE_TTL_SECS`].
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl.min(Duration::from_secs(MAX_ROLE_CACHE_TTL_SECS)))
            .build();
        Self { inner }
    }

    pub fn get(&self, id: &RoleId) -> Option<RoleName> {
        let hit = self.inner.get(id);
        debug!(role_id = %id, hit = hit.is_some(), "role name cache lookup");
        hit
    }

    pub fn insert(&self, id: RoleId, name: RoleName) {
        self.inner.insert(id, name);
    }

    /// Drop one entry; call after a role is renamed or deleted.
    pub fn invalidate(&self, id: &RoleId) {
        self.inner.invalidate(id);
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}
