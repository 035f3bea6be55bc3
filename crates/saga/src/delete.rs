//! CLA Group deletion saga.
//!
//! Deletion resolves the group's projects and the companies holding signed
//! corporate signatures, then runs every cleanup branch concurrently:
//!
//! - four service-level branches (Gerrit, GitHub repositories, GitHub
//!   organizations, signature invalidation)
//! - one CLA manager request branch per company
//! - three role revocations per (company, project) pair
//!
//! All `4 + C * (1 + 3 * P)` results are drained before the first failure
//! is returned. Cleanup already done is not undone. Only a clean sweep
//! goes on to unenroll the projects and delete the record.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use common::ClaGroupId;
use domain::{Actor, ClaGroup, CompanyRef, RoleKind};
use serde::{Deserialize, Serialize};

use crate::config::ManagerRequestCleanup;
use crate::context::RequestContext;
use crate::error::Result;
use crate::events::{
    ClaGroupDeletedData, DeletedCountData, EventData, InvalidatedCountData, LogEvent,
};
use crate::fanout::{JoinPolicy, TaskGroup};
use crate::service::{ClaGroupService, record_duration};
use crate::services::Collaborators;

/// Number of cleanup branches for `companies` companies and `projects`
/// associated projects.
pub fn cleanup_branch_count(companies: usize, projects: usize) -> usize {
    4 + companies * (1 + RoleKind::ALL.len() * projects)
}

/// What a completed deletion did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub cla_group_id: ClaGroupId,
    pub foundation_sfid: String,
    pub project_sfids: Vec<String>,
    pub companies: usize,
    /// Cleanup branch results drained; always `cleanup_branch_count`.
    pub branches_drained: usize,
    /// False when no projects were mapped or the unenroll step failed.
    pub unenrolled: bool,
}

/// Everything a cleanup branch needs, shared across branches.
#[derive(Clone)]
struct Sweep {
    collaborators: Collaborators,
    ctx: RequestContext,
    group: Arc<ClaGroup>,
    actor: Arc<Actor>,
}

impl Sweep {
    fn record(&self, data: EventData) {
        self.collaborators
            .events
            .record(LogEvent::new(&self.ctx, &self.group, &self.actor, data));
    }

    async fn delete_gerrits(self) -> Result<()> {
        let deleted = self
            .collaborators
            .gerrits
            .delete_all_for_group(&self.ctx, self.group.id)
            .await?;
        if deleted == 0 {
            tracing::debug!("no gerrit repositories found to delete");
            return Ok(());
        }
        tracing::debug!(deleted, "deleted gerrit repositories");
        self.record(EventData::GerritRepositoryDeleted(DeletedCountData {
            deleted_count: deleted,
        }));
        Ok(())
    }

    async fn disable_github_repositories(self) -> Result<()> {
        let disabled = self
            .collaborators
            .github
            .disable_repositories_for_group(&self.ctx, self.group.id)
            .await?;
        if disabled == 0 {
            tracing::debug!("no github repositories found to disable");
            return Ok(());
        }
        tracing::debug!(disabled, "disabled github repositories");
        self.record(EventData::RepositoryDisabled(DeletedCountData {
            deleted_count: disabled,
        }));
        Ok(())
    }

    async fn delete_github_organizations(self) -> Result<()> {
        let deleted = self
            .collaborators
            .github
            .delete_organizations_for_group(&self.ctx, self.group.id)
            .await?;
        if deleted == 0 {
            tracing::debug!("no github organizations found to delete");
            return Ok(());
        }
        tracing::debug!(deleted, "deleted github organizations");
        self.record(EventData::GithubOrganizationDeleted(DeletedCountData {
            deleted_count: deleted,
        }));
        Ok(())
    }

    async fn invalidate_signatures(self) -> Result<()> {
        let invalidated = self
            .collaborators
            .signatures
            .invalidate_all_for_group(&self.ctx, self.group.id, &self.group.name)
            .await?;
        if invalidated == 0 {
            tracing::debug!("no signatures found to invalidate");
            return Ok(());
        }
        tracing::debug!(invalidated, "invalidated signatures");
        self.record(EventData::SignaturesInvalidated(InvalidatedCountData {
            invalidated_count: invalidated,
        }));
        Ok(())
    }

    async fn delete_manager_requests(
        self,
        company: CompanyRef,
        mode: ManagerRequestCleanup,
    ) -> Result<()> {
        let requests = self
            .collaborators
            .manager_requests
            .get_requests(&self.ctx, company.company_id, self.group.id)
            .await?;
        let Some((first, rest)) = requests.split_first() else {
            tracing::debug!(company = %company.company_name, "no CLA manager requests found");
            return Ok(());
        };

        match mode {
            ManagerRequestCleanup::FirstOnly => {
                let result = self
                    .collaborators
                    .manager_requests
                    .delete_request(&self.ctx, first.request_id)
                    .await;
                if !rest.is_empty() {
                    tracing::warn!(
                        company = %company.company_name,
                        left_pending = rest.len(),
                        "only the first CLA manager request was deleted"
                    );
                }
                result
            }
            ManagerRequestCleanup::All => {
                let mut first_error = None;
                for request in &requests {
                    if let Err(e) = self
                        .collaborators
                        .manager_requests
                        .delete_request(&self.ctx, request.request_id)
                        .await
                    {
                        tracing::warn!(request_id = %request.request_id, error = %e, "CLA manager request delete failed");
                        first_error.get_or_insert(e);
                    }
                }
                first_error.map_or(Ok(()), Err)
            }
        }
    }

    async fn revoke_role(self, company_sfid: String, project_sfid: String, role: RoleKind) -> Result<()> {
        tracing::debug!(%company_sfid, %project_sfid, %role, "removing role permissions");
        self.collaborators
            .roles
            .delete_role_permissions(&self.ctx, &company_sfid, &project_sfid, role, &self.actor)
            .await
    }
}

impl ClaGroupService {
    /// Deletes a CLA Group and everything hanging off it.
    ///
    /// Fails without side effects if the projects or companies cannot be
    /// resolved. A failed cleanup branch stops the saga after every branch
    /// has finished; the record is then left in place.
    #[tracing::instrument(
        skip(self, ctx, group, actor),
        fields(request_id = %ctx.request_id(), cla_group_id = %group.id, name = %group.name)
    )]
    pub async fn delete_cla_group(
        &self,
        ctx: &RequestContext,
        group: &ClaGroup,
        actor: &Actor,
    ) -> Result<DeletionReport> {
        metrics::counter!("cla_group_delete_total").increment(1);
        let started = Instant::now();
        let collaborators = self.collaborators();

        let mappings = collaborators
            .mappings
            .get_mappings_for_group(ctx, group.id)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "unable to load project mappings"))?;
        let foundation_sfid = mappings
            .first()
            .map_or_else(|| group.foundation_sfid.clone(), |m| m.foundation_sfid.clone());
        let project_sfids: Vec<String> = mappings
            .iter()
            .map(|m| m.project_sfid.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let companies = collaborators
            .signatures
            .companies_with_signed_corporate_signatures(ctx, group.id)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "unable to load companies with corporate signatures"))?;
        tracing::debug!(
            projects = project_sfids.len(),
            companies = companies.len(),
            "resolved deletion scope"
        );

        let sweep = Sweep {
            collaborators: collaborators.clone(),
            ctx: ctx.clone(),
            group: Arc::new(group.clone()),
            actor: Arc::new(actor.clone()),
        };
        let mut branches: TaskGroup<()> = TaskGroup::new("delete_cla_group");
        branches.spawn("gerrit", sweep.clone().delete_gerrits());
        branches.spawn("github_repositories", sweep.clone().disable_github_repositories());
        branches.spawn("github_organizations", sweep.clone().delete_github_organizations());
        branches.spawn("signatures", sweep.clone().invalidate_signatures());

        let mode = self.config().manager_request_cleanup;
        for company in &companies {
            branches.spawn(
                format!("manager_requests:{}", company.company_sfid),
                sweep.clone().delete_manager_requests(company.clone(), mode),
            );
            for project_sfid in &project_sfids {
                for role in RoleKind::ALL {
                    branches.spawn(
                        format!("{role}:{}:{project_sfid}", company.company_sfid),
                        sweep
                            .clone()
                            .revoke_role(company.company_sfid.clone(), project_sfid.clone(), role),
                    );
                }
            }
        }
        debug_assert_eq!(
            branches.spawned(),
            cleanup_branch_count(companies.len(), project_sfids.len())
        );

        let fan_out = branches.join(JoinPolicy::FirstError).await;
        let branches_drained = fan_out.drained();
        metrics::counter!("cla_group_delete_branches_total").increment(branches_drained as u64);
        if let Err(e) = fan_out.into_result() {
            tracing::warn!(error = %e, branches_drained, "cleanup failed, CLA Group not deleted");
            record_duration("delete", started);
            return Err(e);
        }

        let unenrolled = if project_sfids.is_empty() {
            tracing::debug!("no projects to unenroll");
            false
        } else {
            match self
                .unenroll_projects(ctx, group.id, &foundation_sfid, &project_sfids)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "unenrolling projects failed, manual cleanup required");
                    false
                }
            }
        };

        collaborators
            .projects
            .delete_group(ctx, group.id)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "problem deleting CLA Group record"))?;

        collaborators.events.record(LogEvent::new(
            ctx,
            group,
            actor,
            EventData::ClaGroupDeleted(ClaGroupDeletedData {
                foundation_sfid: foundation_sfid.clone(),
                project_sfids: project_sfids.clone(),
            }),
        ));
        record_duration("delete", started);
        tracing::info!(branches_drained, unenrolled, "CLA Group deleted");

        Ok(DeletionReport {
            cla_group_id: group.id,
            foundation_sfid,
            project_sfids,
            companies: companies.len(),
            branches_drained,
            unenrolled,
        })
    }
}
