//! The CLA Group service: entry points callers use.
//!
//! The sagas live in their own modules ([`crate::create`], [`crate::enroll`],
//! [`crate::delete`], [`crate::listing`]) as further `impl` blocks on
//! [`ClaGroupService`]. This module holds the service itself and the
//! single-step operations.

use std::time::Instant;

use domain::validation::{validate_description, validate_name};
use domain::{
    Actor, AgreementKind, ClaGroup, ClaGroupSummary, ClaGroupValidationRequest,
    FoundationMappingList, UpdateClaGroupInput,
};
use serde::{Deserialize, Serialize};

use crate::config::SagaConfig;
use crate::context::RequestContext;
use crate::error::{Result, SagaError};
use crate::events::{ClaGroupUpdatedData, EventData, LogEvent};
use crate::services::Collaborators;

/// Outcome of [`ClaGroupService::validate_cla_group`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Orchestrates CLA Group operations across the backing services.
///
/// Cloning is cheap: collaborators are shared handles. Concurrent branches
/// run on clones of the service.
#[derive(Clone)]
pub struct ClaGroupService {
    collaborators: Collaborators,
    config: SagaConfig,
}

impl ClaGroupService {
    pub fn new(collaborators: Collaborators, config: SagaConfig) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Renames a group or changes its description.
    ///
    /// Empty input fields keep the current value. A new name already used by
    /// another group is a [`SagaError::NameConflict`].
    #[tracing::instrument(
        skip(self, ctx, existing, input, actor),
        fields(request_id = %ctx.request_id(), cla_group_id = %existing.id)
    )]
    pub async fn update_cla_group(
        &self,
        ctx: &RequestContext,
        existing: &ClaGroup,
        input: &UpdateClaGroupInput,
        actor: &Actor,
    ) -> Result<ClaGroupSummary> {
        let name = if input.cla_group_name.is_empty() {
            existing.name.clone()
        } else {
            validate_name(&input.cla_group_name)?.to_string()
        };
        let description = if input.cla_group_description.is_empty() {
            existing.description.clone()
        } else {
            validate_description(&input.cla_group_description)?;
            input.cla_group_description.clone()
        };

        if name != existing.name {
            let found = self
                .collaborators
                .projects
                .get_group_by_name(ctx, &name)
                .await
                .inspect_err(|e| tracing::warn!(error = %e, "CLA Group name lookup failed"))?;
            if let Some(other) = found.filter(|g| g.id != existing.id) {
                tracing::warn!(conflicting_id = %other.id, %name, "CLA Group name already in use");
                return Err(SagaError::NameConflict {
                    cla_group_id: existing.id,
                    name,
                });
            }
        }

        let updated = self
            .collaborators
            .projects
            .update_group(
                ctx,
                ClaGroup {
                    name,
                    description,
                    ..existing.clone()
                },
            )
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "CLA Group update failed"))?;

        let mappings = self
            .collaborators
            .mappings
            .get_mappings_for_group(ctx, existing.id)
            .await?;
        let mut summary = ClaGroupSummary::from_group(&updated, &existing.foundation_sfid, &mappings);
        for kind in AgreementKind::ALL {
            if !updated.is_enabled(kind) {
                continue;
            }
            let url = self
                .collaborators
                .projects
                .get_active_document_url(ctx, updated.id, kind)
                .await?;
            match kind {
                AgreementKind::Individual => summary.icla_pdf_url = url,
                AgreementKind::Corporate => summary.ccla_pdf_url = url,
            }
        }

        self.collaborators.events.record(LogEvent::new(
            ctx,
            &updated,
            actor,
            EventData::ClaGroupUpdated(ClaGroupUpdatedData {
                old_name: existing.name.clone(),
                new_name: updated.name.clone(),
                old_description: existing.description.clone(),
                new_description: updated.description.clone(),
            }),
        ));
        tracing::info!("CLA Group updated");

        Ok(summary)
    }

    /// Checks the supplied fields of a prospective group. Never fails; every
    /// problem found is reported in the returned [`ValidationReport`].
    #[tracing::instrument(skip(self, ctx, request), fields(request_id = %ctx.request_id()))]
    pub async fn validate_cla_group(
        &self,
        ctx: &RequestContext,
        request: &ClaGroupValidationRequest,
    ) -> ValidationReport {
        let mut errors = Vec::new();

        if let Some(name) = &request.cla_group_name {
            if let Err(e) = validate_name(name) {
                errors.push(e.to_string());
            }
            match self.collaborators.projects.get_group_by_name(ctx, name).await {
                Ok(Some(_)) => errors.push(format!("CLA Group with name {name} already exist")),
                Ok(None) => {}
                Err(e) => errors.push(format!("unable to query project service - error: {e}")),
            }
        }

        if let Some(description) = &request.cla_group_description {
            if let Err(e) = validate_description(description) {
                errors.push(e.to_string());
            }
        }

        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Lists project-to-group mappings grouped by foundation, for one
    /// foundation or for all of them.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn list_all_foundation_cla_groups(
        &self,
        ctx: &RequestContext,
        foundation_sfid: Option<&str>,
    ) -> Result<FoundationMappingList> {
        let mappings = match foundation_sfid {
            Some(foundation) => {
                self.collaborators
                    .mappings
                    .get_mappings_for_foundation(ctx, foundation)
                    .await?
            }
            None => self.collaborators.mappings.get_all_mappings(ctx).await?,
        };
        tracing::debug!(mappings = mappings.len(), "loaded foundation mappings");
        Ok(FoundationMappingList::from_mappings(&mappings))
    }
}

/// Records a saga's wall-clock duration.
pub(crate) fn record_duration(saga: &'static str, started: Instant) {
    metrics::histogram!("cla_group_saga_duration_seconds", "saga" => saga)
        .record(started.elapsed().as_secs_f64());
}
