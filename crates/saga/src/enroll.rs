//! Enroll/unenroll sub-saga.
//!
//! Each direction runs two independent branches concurrently, mapping
//! bookkeeping and the external CLA-service flag, and waits for both. The
//! first failure observed in completion order is returned.

use std::time::Instant;

use common::ClaGroupId;
use domain::ProjectClaGroup;
use domain::validation::validate_project_list;

use crate::context::RequestContext;
use crate::error::Result;
use crate::fanout::{JoinPolicy, TaskGroup};
use crate::service::{ClaGroupService, record_duration};

impl ClaGroupService {
    /// Maps projects to a group and enables the CLA service on them.
    #[tracing::instrument(
        skip(self, ctx, project_sfids),
        fields(request_id = %ctx.request_id(), projects = project_sfids.len())
    )]
    pub async fn enroll_projects(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        foundation_sfid: &str,
        project_sfids: &[String],
    ) -> Result<()> {
        validate_project_list(foundation_sfid, project_sfids)
            .inspect_err(|e| tracing::warn!(error = %e, "enroll input rejected"))?;
        metrics::counter!("cla_group_enroll_total").increment(1);
        let started = Instant::now();

        let mut branches = TaskGroup::new("enroll");
        {
            let (service, ctx) = (self.clone(), ctx.clone());
            let foundation = foundation_sfid.to_string();
            let projects = project_sfids.to_vec();
            branches.spawn("associate", async move {
                service
                    .associate_projects(&ctx, cla_group_id, &foundation, &projects)
                    .await
            });
        }
        {
            let (service, ctx) = (self.clone(), ctx.clone());
            let projects = project_sfids.to_vec();
            branches.spawn("enable_cla_service", async move {
                service.enable_cla_service(&ctx, &projects).await
            });
        }

        let result = branches.join(JoinPolicy::FirstError).await.into_result();
        record_duration("enroll", started);
        result.map(|_| ())
    }

    /// Removes project mappings from a group and disables the CLA service on
    /// the projects. Projects that are not enrolled are skipped.
    #[tracing::instrument(
        skip(self, ctx, project_sfids),
        fields(request_id = %ctx.request_id(), projects = project_sfids.len())
    )]
    pub async fn unenroll_projects(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        foundation_sfid: &str,
        project_sfids: &[String],
    ) -> Result<()> {
        validate_project_list(foundation_sfid, project_sfids)
            .inspect_err(|e| tracing::warn!(error = %e, "unenroll input rejected"))?;
        metrics::counter!("cla_group_unenroll_total").increment(1);
        let started = Instant::now();

        let mut branches = TaskGroup::new("unenroll");
        {
            let (service, ctx) = (self.clone(), ctx.clone());
            let projects = project_sfids.to_vec();
            branches.spawn("unassociate", async move {
                service
                    .unassociate_projects(&ctx, cla_group_id, &projects)
                    .await
            });
        }
        {
            let (service, ctx) = (self.clone(), ctx.clone());
            let projects = project_sfids.to_vec();
            branches.spawn("disable_cla_service", async move {
                service.disable_cla_service(&ctx, &projects).await
            });
        }

        let result = branches.join(JoinPolicy::FirstError).await.into_result();
        record_duration("unenroll", started);
        result.map(|_| ())
    }

    /// Creates one mapping row per project, stopping at the first failure.
    ///
    /// Project and foundation display names come from the metadata service.
    pub async fn associate_projects(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        foundation_sfid: &str,
        project_sfids: &[String],
    ) -> Result<()> {
        let collaborators = self.collaborators();
        let foundation = collaborators
            .metadata
            .get_project(ctx, foundation_sfid)
            .await?;

        for project_sfid in project_sfids {
            let project_name = if *project_sfid == foundation.id {
                foundation.name.clone()
            } else {
                collaborators
                    .metadata
                    .get_project(ctx, project_sfid)
                    .await?
                    .name
            };
            collaborators
                .mappings
                .create_mapping(
                    ctx,
                    ProjectClaGroup {
                        project_sfid: project_sfid.clone(),
                        project_name,
                        cla_group_id,
                        foundation_sfid: foundation.id.clone(),
                        foundation_name: foundation.name.clone(),
                        repositories_count: 0,
                    },
                )
                .await?;
            tracing::debug!(%cla_group_id, %project_sfid, "project associated");
        }
        Ok(())
    }

    /// Deletes the mapping rows of the listed projects.
    pub async fn unassociate_projects(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        project_sfids: &[String],
    ) -> Result<()> {
        let mut removed = 0usize;
        for project_sfid in project_sfids {
            if self
                .collaborators()
                .mappings
                .delete_mapping(ctx, cla_group_id, project_sfid)
                .await?
            {
                removed += 1;
            }
        }
        tracing::debug!(%cla_group_id, removed, skipped = project_sfids.len() - removed, "projects unassociated");
        Ok(())
    }

    pub async fn enable_cla_service(&self, ctx: &RequestContext, project_sfids: &[String]) -> Result<()> {
        for project_sfid in project_sfids {
            self.collaborators()
                .metadata
                .enable_cla_service(ctx, project_sfid)
                .await?;
        }
        Ok(())
    }

    pub async fn disable_cla_service(&self, ctx: &RequestContext, project_sfids: &[String]) -> Result<()> {
        for project_sfid in project_sfids {
            self.collaborators()
                .metadata
                .disable_cla_service(ctx, project_sfid)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::SagaConfig;
    use crate::error::SagaError;
    use crate::services::{InMemoryCollaborators, MappingStore};
    use domain::{ParentProject, ProjectDetails, ValidationError};

    fn setup() -> (ClaGroupService, InMemoryCollaborators) {
        let in_memory = InMemoryCollaborators::new();
        in_memory
            .metadata
            .add_project(ProjectDetails::foundation("F1", "Foundation One"));
        for (id, name) in [("P1", "Project One"), ("P2", "Project Two")] {
            in_memory.metadata.add_project(ProjectDetails::project(
                id,
                name,
                Some(ParentProject {
                    id: "F1".to_string(),
                    name: "Foundation One".to_string(),
                }),
            ));
        }
        let service = ClaGroupService::new(in_memory.collaborators(), SagaConfig::default());
        (service, in_memory)
    }

    fn projects(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_enroll_maps_and_enables() {
        let (service, in_memory) = setup();
        let group = ClaGroupId::new();
        let ctx = RequestContext::new();

        service
            .enroll_projects(&ctx, group, "F1", &projects(&["P1", "P2"]))
            .await
            .unwrap();

        assert_eq!(in_memory.mappings.count_for_group(group), 2);
        assert!(in_memory.metadata.is_cla_enabled("P1"));
        assert!(in_memory.metadata.is_cla_enabled("P2"));
        let mapping = in_memory
            .mappings
            .get_mapping_for_project(&ctx, "P2")
            .await
            .unwrap();
        assert_eq!(mapping.project_name, "Project Two");
        assert_eq!(mapping.foundation_name, "Foundation One");
    }

    #[tokio::test]
    async fn test_enroll_then_unenroll_leaves_no_mappings() {
        let (service, in_memory) = setup();
        let group = ClaGroupId::new();
        let ctx = RequestContext::new();
        let list = projects(&["P1", "P2"]);

        service.enroll_projects(&ctx, group, "F1", &list).await.unwrap();
        service.unenroll_projects(&ctx, group, "F1", &list).await.unwrap();

        assert_eq!(in_memory.mappings.count_for_group(group), 0);
        assert_eq!(in_memory.metadata.enabled_count(), 0);
    }

    #[tokio::test]
    async fn test_unenroll_twice_is_not_an_error() {
        let (service, _) = setup();
        let group = ClaGroupId::new();
        let ctx = RequestContext::new();
        let list = projects(&["P1"]);

        service.unenroll_projects(&ctx, group, "F1", &list).await.unwrap();
        service.unenroll_projects(&ctx, group, "F1", &list).await.unwrap();
    }

    #[tokio::test]
    async fn test_enroll_rejects_empty_list_without_side_effects() {
        let (service, in_memory) = setup();
        let result = service
            .enroll_projects(&RequestContext::new(), ClaGroupId::new(), "F1", &[])
            .await;

        assert!(matches!(
            result,
            Err(SagaError::Validation(ValidationError::EmptyProjectList))
        ));
        assert_eq!(in_memory.mappings.create_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_enroll_waits_for_both_branches_on_failure() {
        let (service, in_memory) = setup();
        in_memory.mappings.set_fail_on_create(true);
        in_memory
            .metadata
            .set_delay(Some(Duration::from_millis(20)));
        let group = ClaGroupId::new();

        let result = service
            .enroll_projects(&RequestContext::new(), group, "F1", &projects(&["P1"]))
            .await;

        assert!(matches!(result, Err(SagaError::MappingStore(_))));
        // The slow enable branch still ran to completion.
        assert!(in_memory.metadata.is_cla_enabled("P1"));
    }

    #[tokio::test]
    async fn test_enroll_unknown_project_fails() {
        let (service, _) = setup();
        let result = service
            .enroll_projects(
                &RequestContext::new(),
                ClaGroupId::new(),
                "F1",
                &projects(&["missing"]),
            )
            .await;
        assert!(matches!(result, Err(SagaError::ProjectNotFound(id)) if id == "missing"));
    }
}
