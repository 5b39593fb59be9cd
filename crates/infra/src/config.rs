//! Engine configuration from the environment.

use std::time::Duration;

use anyhow::{Context, Result, bail};

use menuauth_auth::{AccessPolicy, DEFAULT_SUPER_ADMIN_ROLE};

use crate::cache::RoleNameCache;

pub const ENV_SUPER_ADMIN_ROLE: &str = "MENUAUTH_SUPER_ADMIN_ROLE";
pub const ENV_ROLE_CACHE_TTL_SECS: &str = "MENUAUTH_ROLE_CACHE_TTL_SECS";
pub const ENV_ROLE_CACHE_CAPACITY: &str = "MENUAUTH_ROLE_CACHE_CAPACITY";

const DEFAULT_ROLE_CACHE_TTL_SECS: u64 = 30;
const DEFAULT_ROLE_CACHE_CAPACITY: u64 = 1024;
/// Upper bound for `MENUAUTH_ROLE_CACHE_TTL_SECS` (one day).
pub const MAX_ROLE_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reserved role name that bypasses grant checks.
    pub super_admin_role: String,
    /// Zero disables the role-name cache.
    pub role_cache_ttl: Duration,
    pub role_cache_capacity: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            super_admin_role: DEFAULT_SUPER_ADMIN_ROLE.to_string(),
            role_cache_ttl: Duration::from_secs(DEFAULT_ROLE_CACHE_TTL_SECS),
            role_cache_capacity: DEFAULT_ROLE_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(name) = get(ENV_SUPER_ADMIN_ROLE) {
            config.super_admin_role = name;
        }
        if let Some(raw) = get(ENV_ROLE_CACHE_TTL_SECS) {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("{ENV_ROLE_CACHE_TTL_SECS} must be a whole number of seconds, got '{raw}'"))?;
            if secs > MAX_ROLE_CACHE_TTL_SECS {
                bail!("{ENV_ROLE_CACHE_TTL_SECS} must be at most {MAX_ROLE_CACHE_TTL_SECS} seconds, got {secs}");
            }
            config.role_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(raw) = get(ENV_ROLE_CACHE_CAPACITY) {
            config.role_cache_capacity = raw
                .parse()
                .with_context(|| format!("{ENV_ROLE_CACHE_CAPACITY} must be a positive integer, got '{raw}'"))?;
        }

        Ok(config)
    }

    pub fn policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.super_admin_role.clone())
    }

    pub fn role_cache(&self) -> Option<RoleNameCache> {
        if self.role_cache_ttl.is_zero() || self.role_cache_capacity == 0 {
            return None;
        }
        Some(RoleNameCache::new(self.role_cache_ttl, self.role_cache_capacity))
    }
}
