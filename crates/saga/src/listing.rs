//! Aggregate list builder.

use std::collections::HashSet;
use std::time::Instant;

use domain::{AgreementKind, ClaGroup, ClaGroupListSummary, ClaGroupSummary, ProjectType};

use crate::context::RequestContext;
use crate::error::{Result, SagaError};
use crate::fanout::{JoinPolicy, TaskGroup};
use crate::service::{ClaGroupService, record_duration};

impl ClaGroupService {
    /// Lists the CLA Groups of a foundation, or the group of a single
    /// project, with project lists, active document URLs and signature
    /// totals. Ordered by foundation name, then group name.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn list_cla_groups_for_foundation_or_project(
        &self,
        ctx: &RequestContext,
        project_or_foundation_sfid: &str,
    ) -> Result<ClaGroupListSummary> {
        let started = Instant::now();
        let collaborators = self.collaborators();

        let details = collaborators
            .metadata
            .get_project(ctx, project_or_foundation_sfid)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "unable to look up foundation or project"))?;
        let (foundation_id, foundation_name) = {
            let (id, name) = details.foundation_ref();
            (id.to_string(), name.to_string())
        };

        let groups = match &details.project_type {
            ProjectType::Project => {
                tracing::debug!(%foundation_id, "found project, locating its CLA Group");
                self.groups_for_project(ctx, project_or_foundation_sfid).await?
            }
            ProjectType::ProjectGroup => {
                tracing::debug!("found project group, locating CLA Groups of the foundation");
                self.groups_for_foundation(ctx, project_or_foundation_sfid).await?
            }
            ProjectType::Other(kind) => {
                tracing::warn!(%kind, "unsupported foundation/project type");
                return Err(SagaError::UnsupportedProjectType(kind.clone()));
            }
        };
        tracing::debug!(groups = groups.len(), "building response model");

        let mut summaries = ClaGroupListSummary::default();
        for group in &groups {
            let mappings = collaborators
                .mappings
                .get_mappings_for_group(ctx, group.id)
                .await?;
            let mut summary = ClaGroupSummary::from_group(group, &foundation_id, &mappings);
            summary.foundation_name = foundation_name.clone();
            summary.icla_pdf_url = group
                .current_document(AgreementKind::Individual)
                .map(|d| d.url.clone());
            summary.ccla_pdf_url = group
                .current_document(AgreementKind::Corporate)
                .map(|d| d.url.clone());
            summaries.list.push(summary);
        }

        for summary in &mut summaries.list {
            let mut total = 0;
            for kind in AgreementKind::ALL {
                match collaborators
                    .signatures
                    .signature_count(ctx, summary.cla_group_id, kind)
                    .await
                {
                    Ok(count) => total += count,
                    Err(e) => tracing::warn!(
                        cla_group_id = %summary.cla_group_id,
                        %kind,
                        error = %e,
                        "unable to count signatures"
                    ),
                }
            }
            summary.total_signatures = total;
        }

        summaries.sort();
        record_duration("list", started);
        Ok(summaries)
    }

    /// The group a leaf project maps to, plus the group registered under the
    /// project's own ID if that is a different one.
    async fn groups_for_project(&self, ctx: &RequestContext, project_sfid: &str) -> Result<Vec<ClaGroup>> {
        let collaborators = self.collaborators();
        let mapping = collaborators
            .mappings
            .get_mapping_for_project(ctx, project_sfid)
            .await?;
        let mut groups = vec![
            collaborators
                .projects
                .get_group_by_id(ctx, mapping.cla_group_id)
                .await?,
        ];

        if let Some(secondary) = collaborators
            .projects
            .get_group_by_external_id(ctx, project_sfid)
            .await?
        {
            if groups.iter().all(|g| g.id != secondary.id) {
                groups.push(secondary);
            }
        }
        Ok(groups)
    }

    /// Loads every distinct group mapped under a foundation concurrently,
    /// then returns the foundation's authoritative group list.
    async fn groups_for_foundation(
        &self,
        ctx: &RequestContext,
        foundation_sfid: &str,
    ) -> Result<Vec<ClaGroup>> {
        let collaborators = self.collaborators();
        let mappings = collaborators
            .mappings
            .get_mappings_for_foundation(ctx, foundation_sfid)
            .await?;
        tracing::debug!(mappings = mappings.len(), "discovered projects of foundation");

        let mut seen = HashSet::new();
        let mut loads: TaskGroup<ClaGroup> = TaskGroup::new("list_cla_groups");
        for mapping in &mappings {
            if !seen.insert(mapping.cla_group_id) {
                continue;
            }
            let (projects, ctx, id) = (collaborators.projects.clone(), ctx.clone(), mapping.cla_group_id);
            loads.spawn(id.to_string(), async move {
                projects.get_group_by_id(&ctx, id).await
            });
        }
        let loaded = loads.join(JoinPolicy::FirstError).await.into_result()?;
        tracing::debug!(loaded = loaded.len(), "CLA Groups loaded");

        collaborators
            .projects
            .get_groups_by_foundation(ctx, foundation_sfid)
            .await
    }
}
