//! External project metadata service.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::ProjectDetails;

use super::{latency, read, write};
use crate::context::RequestContext;
use crate::error::{Result, SagaError};

/// Trait for the external project-metadata service.
#[async_trait]
pub trait ProjectMetadataService: Send + Sync {
    /// Fails with `ProjectNotFound` for unknown identifiers.
    async fn get_project(&self, ctx: &RequestContext, project_sfid: &str)
    -> Result<ProjectDetails>;

    /// Turns the CLA service flag on for a project. Enabling an enabled
    /// project succeeds.
    async fn enable_cla_service(&self, ctx: &RequestContext, project_sfid: &str) -> Result<()>;

    /// Turns the CLA service flag off. Disabling a disabled project succeeds.
    async fn disable_cla_service(&self, ctx: &RequestContext, project_sfid: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryMetadataState {
    projects: BTreeMap<String, ProjectDetails>,
    cla_enabled: BTreeSet<String>,
    fail_on_enable: bool,
    fail_on_disable: bool,
    fail_lookups: HashSet<String>,
    delay: Option<Duration>,
}

/// In-memory project metadata service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectMetadataService {
    state: Arc<RwLock<InMemoryMetadataState>>,
}

impl InMemoryProjectMetadataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a project record.
    pub fn add_project(&self, project: ProjectDetails) {
        write(&self.state)
            .projects
            .insert(project.id.clone(), project);
    }

    pub fn is_cla_enabled(&self, project_sfid: &str) -> bool {
        read(&self.state).cla_enabled.contains(project_sfid)
    }

    pub fn enabled_count(&self) -> usize {
        read(&self.state).cla_enabled.len()
    }

    pub fn set_fail_on_enable(&self, fail: bool) {
        write(&self.state).fail_on_enable = fail;
    }

    pub fn set_fail_on_disable(&self, fail: bool) {
        write(&self.state).fail_on_disable = fail;
    }

    /// Makes lookups of one project fail with a service error.
    pub fn fail_lookup_of(&self, project_sfid: &str) {
        write(&self.state)
            .fail_lookups
            .insert(project_sfid.to_string());
    }

    /// Delays every toggle call, to widen race windows in tests.
    pub fn set_delay(&self, delay: Option<Duration>) {
        write(&self.state).delay = delay;
    }

    fn delay(&self) -> Option<Duration> {
        read(&self.state).delay
    }
}

#[async_trait]
impl ProjectMetadataService for InMemoryProjectMetadataService {
    async fn get_project(
        &self,
        ctx: &RequestContext,
        project_sfid: &str,
    ) -> Result<ProjectDetails> {
        ctx.check()?;
        let state = read(&self.state);
        if state.fail_lookups.contains(project_sfid) {
            return Err(SagaError::ProjectMetadata(format!(
                "lookup of project {project_sfid} failed"
            )));
        }
        state
            .projects
            .get(project_sfid)
            .cloned()
            .ok_or_else(|| SagaError::ProjectNotFound(project_sfid.to_string()))
    }

    async fn enable_cla_service(&self, ctx: &RequestContext, project_sfid: &str) -> Result<()> {
        latency(self.delay()).await;
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_enable {
            return Err(SagaError::ProjectMetadata(format!(
                "unable to enable CLA service for {project_sfid}"
            )));
        }
        state.cla_enabled.insert(project_sfid.to_string());
        Ok(())
    }

    async fn disable_cla_service(&self, ctx: &RequestContext, project_sfid: &str) -> Result<()> {
        latency(self.delay()).await;
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_disable {
            return Err(SagaError::ProjectMetadata(format!(
                "unable to disable CLA service for {project_sfid}"
            )));
        }
        state.cla_enabled.remove(project_sfid);
        Ok(())
    }
}
