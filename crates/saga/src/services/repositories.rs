//! Code-hosting integrations: Gerrit instances and GitHub repositories.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ClaGroupId;

use super::{read, write};
use crate::context::RequestContext;
use crate::error::{Result, SagaError};

/// Gerrit instances linked to CLA Groups.
#[async_trait]
pub trait GerritService: Send + Sync {
    /// Deletes every Gerrit instance of a group, returning how many existed.
    async fn delete_all_for_group(&self, ctx: &RequestContext, cla_group_id: ClaGroupId)
    -> Result<u64>;
}

/// GitHub repositories and organization linkages of CLA Groups.
#[async_trait]
pub trait GitHubService: Send + Sync {
    /// Disables every enabled repository of a group.
    async fn disable_repositories_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<u64>;

    /// Removes every GitHub organization linkage of a group.
    async fn delete_organizations_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<u64>;
}

#[derive(Debug, Default)]
struct InMemoryGerritState {
    instances: BTreeMap<ClaGroupId, u64>,
    fail_on_delete: bool,
}

/// In-memory Gerrit service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGerritService {
    state: Arc<RwLock<InMemoryGerritState>>,
}

impl InMemoryGerritService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instances(&self, cla_group_id: ClaGroupId, count: u64) {
        *write(&self.state).instances.entry(cla_group_id).or_default() += count;
    }

    pub fn instance_count(&self, cla_group_id: ClaGroupId) -> u64 {
        read(&self.state)
            .instances
            .get(&cla_group_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_fail_on_delete(&self, fail: bool) {
        write(&self.state).fail_on_delete = fail;
    }
}

#[async_trait]
impl GerritService for InMemoryGerritService {
    async fn delete_all_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<u64> {
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_delete {
            return Err(SagaError::RepositoryService(format!(
                "unable to delete gerrit instances for CLA Group {cla_group_id}"
            )));
        }
        Ok(state.instances.remove(&cla_group_id).unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct InMemoryGitHubState {
    enabled_repositories: BTreeMap<ClaGroupId, u64>,
    organizations: BTreeMap<ClaGroupId, u64>,
    fail_on_disable: bool,
    fail_on_delete_orgs: bool,
}

/// In-memory GitHub service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGitHubService {
    state: Arc<RwLock<InMemoryGitHubState>>,
}

impl InMemoryGitHubService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_repositories(&self, cla_group_id: ClaGroupId, count: u64) {
        *write(&self.state)
            .enabled_repositories
            .entry(cla_group_id)
            .or_default() += count;
    }

    pub fn add_organizations(&self, cla_group_id: ClaGroupId, count: u64) {
        *write(&self.state).organizations.entry(cla_group_id).or_default() += count;
    }

    pub fn enabled_repository_count(&self, cla_group_id: ClaGroupId) -> u64 {
        read(&self.state)
            .enabled_repositories
            .get(&cla_group_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn organization_count(&self, cla_group_id: ClaGroupId) -> u64 {
        read(&self.state)
            .organizations
            .get(&cla_group_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_fail_on_disable(&self, fail: bool) {
        write(&self.state).fail_on_disable = fail;
    }

    pub fn set_fail_on_delete_orgs(&self, fail: bool) {
        write(&self.state).fail_on_delete_orgs = fail;
    }
}

#[async_trait]
impl GitHubService for InMemoryGitHubService {
    async fn disable_repositories_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<u64> {
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_disable {
            return Err(SagaError::RepositoryService(format!(
                "unable to disable github repositories for CLA Group {cla_group_id}"
            )));
        }
        Ok(state
            .enabled_repositories
            .remove(&cla_group_id)
            .unwrap_or_default())
    }

    async fn delete_organizations_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<u64> {
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_delete_orgs {
            return Err(SagaError::RepositoryService(format!(
                "unable to delete github organizations for CLA Group {cla_group_id}"
            )));
        }
        Ok(state.organizations.remove(&cla_group_id).unwrap_or_default())
    }
}
