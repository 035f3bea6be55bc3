//! Project-to-CLA-Group mapping store.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ClaGroupId;
use domain::ProjectClaGroup;

use super::{read, write};
use crate::context::RequestContext;
use crate::error::{Result, SagaError};

/// Trait for the mapping table linking projects to CLA Groups.
///
/// A project maps to at most one CLA Group at a time.
#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn get_mappings_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<Vec<ProjectClaGroup>>;

    async fn get_mappings_for_foundation(
        &self,
        ctx: &RequestContext,
        foundation_sfid: &str,
    ) -> Result<Vec<ProjectClaGroup>>;

    async fn get_all_mappings(&self, ctx: &RequestContext) -> Result<Vec<ProjectClaGroup>>;

    /// Fails with `ProjectMappingNotFound` when the project is not enrolled.
    async fn get_mapping_for_project(
        &self,
        ctx: &RequestContext,
        project_sfid: &str,
    ) -> Result<ProjectClaGroup>;

    /// Inserts a mapping. Re-inserting the same (project, group) pair is a
    /// no-op; mapping the project to a different group is a conflict.
    async fn create_mapping(&self, ctx: &RequestContext, mapping: ProjectClaGroup) -> Result<()>;

    /// Removes a mapping, returning whether one existed.
    async fn delete_mapping(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        project_sfid: &str,
    ) -> Result<bool>;
}

#[derive(Debug, Default)]
struct InMemoryMappingState {
    by_project: BTreeMap<String, ProjectClaGroup>,
    fail_on_create: bool,
    fail_on_delete: bool,
    fail_on_read: bool,
    create_calls: usize,
}

impl InMemoryMappingState {
    fn check_read(&self) -> Result<()> {
        if self.fail_on_read {
            return Err(SagaError::MappingStore(
                "unable to query project CLA Group mappings".to_string(),
            ));
        }
        Ok(())
    }

    fn select(&self, keep: impl Fn(&ProjectClaGroup) -> bool) -> Vec<ProjectClaGroup> {
        self.by_project.values().filter(|m| keep(m)).cloned().collect()
    }
}

/// In-memory mapping store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMappingStore {
    state: Arc<RwLock<InMemoryMappingState>>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a mapping directly, replacing any mapping for the project.
    pub fn insert(&self, mapping: ProjectClaGroup) {
        write(&self.state)
            .by_project
            .insert(mapping.project_sfid.clone(), mapping);
    }

    /// Number of mappings pointing at a group.
    pub fn count_for_group(&self, cla_group_id: ClaGroupId) -> usize {
        read(&self.state)
            .by_project
            .values()
            .filter(|m| m.cla_group_id == cla_group_id)
            .count()
    }

    pub fn mapping_count(&self) -> usize {
        read(&self.state).by_project.len()
    }

    /// Number of create calls received, successful or not.
    pub fn create_calls(&self) -> usize {
        read(&self.state).create_calls
    }

    pub fn set_fail_on_create(&self, fail: bool) {
        write(&self.state).fail_on_create = fail;
    }

    pub fn set_fail_on_delete(&self, fail: bool) {
        write(&self.state).fail_on_delete = fail;
    }

    /// Configures every query method to fail.
    pub fn set_fail_on_read(&self, fail: bool) {
        write(&self.state).fail_on_read = fail;
    }
}

#[async_trait]
impl MappingStore for InMemoryMappingStore {
    async fn get_mappings_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<Vec<ProjectClaGroup>> {
        ctx.check()?;
        let state = read(&self.state);
        state.check_read()?;
        Ok(state.select(|m| m.cla_group_id == cla_group_id))
    }

    async fn get_mappings_for_foundation(
        &self,
        ctx: &RequestContext,
        foundation_sfid: &str,
    ) -> Result<Vec<ProjectClaGroup>> {
        ctx.check()?;
        let state = read(&self.state);
        state.check_read()?;
        Ok(state.select(|m| m.foundation_sfid == foundation_sfid))
    }

    async fn get_all_mappings(&self, ctx: &RequestContext) -> Result<Vec<ProjectClaGroup>> {
        ctx.check()?;
        let state = read(&self.state);
        state.check_read()?;
        Ok(state.by_project.values().cloned().collect())
    }

    async fn get_mapping_for_project(
        &self,
        ctx: &RequestContext,
        project_sfid: &str,
    ) -> Result<ProjectClaGroup> {
        ctx.check()?;
        let state = read(&self.state);
        state.check_read()?;
        state
            .by_project
            .get(project_sfid)
            .cloned()
            .ok_or_else(|| SagaError::ProjectMappingNotFound(project_sfid.to_string()))
    }

    async fn create_mapping(&self, ctx: &RequestContext, mapping: ProjectClaGroup) -> Result<()> {
        ctx.check()?;
        let mut state = write(&self.state);
        state.create_calls += 1;
        if state.fail_on_create {
            return Err(SagaError::MappingStore(format!(
                "unable to map project {} to CLA Group {}",
                mapping.project_sfid, mapping.cla_group_id
            )));
        }

        if let Some(existing) = state.by_project.get(&mapping.project_sfid) {
            if existing.cla_group_id != mapping.cla_group_id {
                return Err(SagaError::MappingConflict {
                    project_sfid: mapping.project_sfid,
                    existing: existing.cla_group_id,
                });
            }
        }

        state.by_project.insert(mapping.project_sfid.clone(), mapping);
        Ok(())
    }

    async fn delete_mapping(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        project_sfid: &str,
    ) -> Result<bool> {
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_delete {
            return Err(SagaError::MappingStore(format!(
                "unable to remove mapping for project {project_sfid}"
            )));
        }

        let matches = state
            .by_project
            .get(project_sfid)
            .is_some_and(|m| m.cla_group_id == cla_group_id);
        if matches {
            state.by_project.remove(project_sfid);
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(project: &str, group: ClaGroupId, foundation: &str) -> ProjectClaGroup {
        ProjectClaGroup {
            project_sfid: project.to_string(),
            project_name: format!("Project {project}"),
            cla_group_id: group,
            foundation_sfid: foundation.to_string(),
            foundation_name: format!("Foundation {foundation}"),
            repositories_count: 0,
        }
    }

    #[tokio::test]
    async fn test_create_and_query() {
        let ctx = RequestContext::new();
        let store = InMemoryMappingStore::new();
        let g1 = ClaGroupId::new();
        let g2 = ClaGroupId::new();

        store.create_mapping(&ctx, mapping("P1", g1, "F1")).await.unwrap();
        store.create_mapping(&ctx, mapping("P2", g1, "F1")).await.unwrap();
        store.create_mapping(&ctx, mapping("P3", g2, "F2")).await.unwrap();

        assert_eq!(store.get_mappings_for_group(&ctx, g1).await.unwrap().len(), 2);
        assert_eq!(
            store.get_mappings_for_foundation(&ctx, "F2").await.unwrap().len(),
            1
        );
        assert_eq!(store.get_all_mappings(&ctx).await.unwrap().len(), 3);
        assert_eq!(
            store.get_mapping_for_project(&ctx, "P3").await.unwrap().cla_group_id,
            g2
        );
    }

    #[tokio::test]
    async fn test_reenroll_same_group_is_noop() {
        let ctx = RequestContext::new();
        let store = InMemoryMappingStore::new();
        let group = ClaGroupId::new();

        store.create_mapping(&ctx, mapping("P1", group, "F1")).await.unwrap();
        store.create_mapping(&ctx, mapping("P1", group, "F1")).await.unwrap();

        assert_eq!(store.mapping_count(), 1);
        assert_eq!(store.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_project_maps_to_one_group() {
        let ctx = RequestContext::new();
        let store = InMemoryMappingStore::new();
        let first = ClaGroupId::new();

        store.create_mapping(&ctx, mapping("P1", first, "F1")).await.unwrap();
        let result = store
            .create_mapping(&ctx, mapping("P1", ClaGroupId::new(), "F1"))
            .await;

        assert!(matches!(
            result,
            Err(SagaError::MappingConflict { existing, .. }) if existing == first
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_mapping_is_not_an_error() {
        let ctx = RequestContext::new();
        let store = InMemoryMappingStore::new();
        let group = ClaGroupId::new();
        store.create_mapping(&ctx, mapping("P1", group, "F1")).await.unwrap();

        assert!(store.delete_mapping(&ctx, group, "P1").await.unwrap());
        assert!(!store.delete_mapping(&ctx, group, "P1").await.unwrap());
        assert!(matches!(
            store.get_mapping_for_project(&ctx, "P1").await,
            Err(SagaError::ProjectMappingNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_ignores_mapping_of_other_group() {
        let ctx = RequestContext::new();
        let store = InMemoryMappingStore::new();
        let owner = ClaGroupId::new();
        store.create_mapping(&ctx, mapping("P1", owner, "F1")).await.unwrap();

        assert!(!store.delete_mapping(&ctx, ClaGroupId::new(), "P1").await.unwrap());
        assert_eq!(store.count_for_group(owner), 1);
    }

    #[tokio::test]
    async fn test_fail_on_read() {
        let ctx = RequestContext::new();
        let store = InMemoryMappingStore::new();
        store.set_fail_on_read(true);
        assert!(matches!(
            store.get_all_mappings(&ctx).await,
            Err(SagaError::MappingStore(_))
        ));
    }
}
