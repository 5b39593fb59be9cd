//! Composition root: store + policy + optional role-name cache.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{error, warn};

use menuauth_auth::{
    AccessPolicy, AuthorizationExplanation, Principal, Resolution, Role, RoleMutation, RoleName,
    access_codes, explain_authorization, is_authorized, normalize_role_refs, resolve_for_roles,
};
use menuauth_core::{NodeId, RoleId};
use menuauth_menu::{
    NodeMutation, NodeQuery, RouteNode, TreeNode, build_forest, destination_in_use, name_in_use,
    project_routes,
};

use crate::cache::RoleNameCache;
use crate::config::EngineConfig;
use crate::store::{NodeStore, RoleFilter, RoleStore, StoreError};

/// Per-request entry points for the surrounding web layer.
#[derive(Debug)]
pub struct MenuAccessService<S> {
    store: Arc<S>,
    policy: AccessPolicy,
    cache: Option<RoleNameCache>,
}

impl<S> Clone for MenuAccessService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<S> MenuAccessService<S>
where
    S: NodeStore + RoleStore,
{
    pub fn new(store: Arc<S>, config: &EngineConfig) -> Self {
        Self::with_parts(store, config.policy(), config.role_cache())
    }

    pub fn with_parts(store: Arc<S>, policy: AccessPolicy, cache: Option<RoleNameCache>) -> Self {
        Self { store, policy, cache }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Canonical roles held by `principal`.
    ///
    /// Id references go through the cache when one is configured. A cached
    /// name is only trusted if the store returns a role with both that name
    /// and the referenced id; otherwise the entry is evicted and the role is
    /// looked up by id. Id references are also looked up as names, for roles
    /// named like a UUID.
    pub fn roles_for(&self, principal: &Principal) -> Result<Vec<Role>, StoreError> {
        let mut uncached: Vec<RoleId> = Vec::new();
        let mut cached: Vec<(RoleId, RoleName)> = Vec::new();
        for id in principal.ids() {
            match self.cache.as_ref().and_then(|c| c.get(&id)) {
                Some(name) => cached.push((id, name)),
                None => uncached.push(id),
            }
        }

        let mut names: Vec<RoleName> = principal.names().cloned().collect();
        names.extend(principal.ids().map(|id| RoleName::new(id.to_string())));
        names.extend(cached.iter().map(|(_, name)| name.clone()));

        let mut catalog: Vec<Role> = Vec::new();
        if !names.is_empty() {
            catalog.extend(self.store.list_roles(&RoleFilter::ByNames(names))?);
        }

        for (id, name) in &cached {
            if !catalog.iter().any(|r| r.id == *id && r.name == *name) {
                warn!(role_id = %id, cached_name = %name, "stale role name cache entry; looking up by id");
                if let Some(cache) = &self.cache {
                    cache.invalidate(id);
                }
                uncached.push(*id);
            }
        }

        if !uncached.is_empty() {
            let fetched = self.store.list_roles(&RoleFilter::ByIds(uncached))?;
            if let Some(cache) = &self.cache {
                for role in &fetched {
                    cache.insert(role.id, role.name.clone());
                }
            }
            catalog.extend(fetched);
        }

        Ok(normalize_role_refs(&principal.role_refs, &catalog).roles)
    }

    /// Visible route tree and permission codes for `principal`.
    ///
    /// Projection and ancestor closure both run on one node snapshot.
    pub fn routes_for(&self, principal: &Principal) -> Result<Resolution, StoreError> {
        let roles = self.roles_for(principal)?;
        let nodes = self.store.list_nodes()?;
        Ok(resolve_for_roles(&roles, &nodes, &self.policy))
    }

    pub fn access_codes_for(&self, principal: &Principal) -> Result<BTreeSet<String>, StoreError> {
        let roles = self.roles_for(principal)?;
        let nodes = self.store.list_nodes()?;
        Ok(access_codes(&roles, &nodes, &self.policy))
    }

    /// Authorization Guard for one request. Store failures deny.
    pub fn check<C>(&self, principal: &Principal, required: &[C]) -> bool
    where
        C: AsRef<str>,
    {
        if required.is_empty() {
            return true;
        }
        let snapshot = self
            .roles_for(principal)
            .and_then(|roles| Ok((roles, self.store.list_nodes()?)));
        match snapshot {
            Ok((roles, nodes)) => is_authorized(required, &roles, &nodes, &self.policy),
            Err(err) => {
                error!(error = %err, "authorization check failed; denying");
                false
            }
        }
    }

    pub fn explain<C>(
        &self,
        principal: &Principal,
        required: &[C],
    ) -> Result<AuthorizationExplanation, StoreError>
    where
        C: AsRef<str>,
    {
        let roles = self.roles_for(principal)?;
        let nodes = self.store.list_nodes()?;
        Ok(explain_authorization(required, &roles, &nodes, &self.policy))
    }

    /// Unrestricted route projection of the whole tree.
    pub fn all_routes(&self) -> Result<Vec<RouteNode>, StoreError> {
        Ok(project_routes(&self.store.list_nodes()?))
    }

    /// Management listing: the nodes matching `query`, as a forest.
    pub fn menu_tree(&self, query: &NodeQuery) -> Result<Vec<TreeNode>, StoreError> {
        let nodes = self.store.list_nodes()?;
        Ok(build_forest(&query.filter(&nodes)))
    }

    /// Enabled nodes, as a forest; what role editors choose grants from.
    pub fn selectable_tree(&self) -> Result<Vec<TreeNode>, StoreError> {
        self.menu_tree(&NodeQuery::enabled_only())
    }

    pub fn name_in_use(&self, name: &str, exclude: Option<NodeId>) -> Result<bool, StoreError> {
        Ok(name_in_use(&self.store.list_nodes()?, name, exclude))
    }

    pub fn destination_in_use(
        &self,
        destination: &str,
        exclude: Option<NodeId>,
    ) -> Result<bool, StoreError> {
        Ok(destination_in_use(&self.store.list_nodes()?, destination, exclude))
    }

    pub fn apply_mutation(&self, mutation: NodeMutation) -> Result<(), StoreError> {
        self.store.apply_node_mutation(mutation)
    }

    /// Apply a role edit and evict its cached name.
    pub fn apply_role_mutation(&self, mutation: RoleMutation) -> Result<(), StoreError> {
        let target = mutation.target();
        self.store.apply_role_mutation(mutation, &self.policy)?;
        if let Some(cache) = &self.cache {
            cache.invalidate(&target);
        }
        Ok(())
    }
}
