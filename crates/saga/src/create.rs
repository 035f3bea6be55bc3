//! CLA Group creation saga.
//!
//! Steps run in order: validate, create the record, attach the document
//! template, enroll the projects. A failure after the record exists deletes
//! the record again before the error is returned.

use std::time::Instant;

use domain::cla_group::CLA_GROUP_VERSION;
use domain::validation::validate_create_input;
use domain::{Actor, ClaGroup, ClaGroupSummary, CreateClaGroupInput, NewClaGroup};

use crate::context::RequestContext;
use crate::error::{Result, SagaError};
use crate::events::{ClaGroupCreatedData, EventData, LogEvent};
use crate::service::{ClaGroupService, record_duration};
use crate::state::CreationState;

/// Tracks the saga's position in the creation state machine.
#[derive(Debug, Default)]
struct Progress {
    state: CreationState,
}

impl Progress {
    fn advance(&mut self, next: CreationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid creation transition {} -> {next}",
            self.state
        );
        tracing::debug!(from = %self.state, to = %next, "creation state changed");
        self.state = next;
    }
}

impl ClaGroupService {
    /// Creates a CLA Group, attaches its documents and enrolls its projects.
    ///
    /// When only the foundation (or nothing) is listed, the group is
    /// standalone: foundation-level, with the foundation enrolled.
    #[tracing::instrument(
        skip(self, ctx, input, actor),
        fields(request_id = %ctx.request_id(), actor = %actor.username, cla_group_id = tracing::field::Empty)
    )]
    pub async fn create_cla_group(
        &self,
        ctx: &RequestContext,
        input: &CreateClaGroupInput,
        actor: &Actor,
    ) -> Result<ClaGroupSummary> {
        metrics::counter!("cla_group_create_total").increment(1);
        let started = Instant::now();
        let mut progress = Progress::default();

        let validated = match validate_create_input(input) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!(error = %e, "create input rejected");
                progress.advance(CreationState::Failed);
                return Err(e.into());
            }
        };
        if let Err(e) = self.ensure_name_available(ctx, &validated.name).await {
            progress.advance(CreationState::Failed);
            return Err(e);
        }
        tracing::debug!(
            standalone = validated.scope.standalone,
            foundation_level = validated.scope.foundation_level,
            projects = ?validated.scope.project_sfids,
            "classified project list"
        );

        progress.advance(CreationState::CreatingRecord);
        let collaborators = self.collaborators();
        let group = match collaborators
            .projects
            .create_group(
                ctx,
                NewClaGroup {
                    name: validated.name.clone(),
                    description: validated.description.clone(),
                    external_id: validated.foundation_sfid.clone(),
                    foundation_sfid: validated.foundation_sfid.clone(),
                    foundation_level_cla: validated.scope.foundation_level,
                    icla_enabled: validated.icla_enabled,
                    ccla_enabled: validated.ccla_enabled,
                    ccla_requires_icla: validated.ccla_requires_icla,
                    acl: vec![actor.username.clone()],
                    version: CLA_GROUP_VERSION.to_string(),
                },
            )
            .await
        {
            Ok(group) => group,
            Err(e) => {
                tracing::warn!(error = %e, "CLA Group record creation failed");
                progress.advance(CreationState::Failed);
                return Err(e);
            }
        };
        tracing::Span::current().record("cla_group_id", tracing::field::display(group.id));

        progress.advance(CreationState::AttachingTemplate);
        let template_id = validated
            .template
            .template_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(self.config().default_template_id.as_str());
        let urls = match collaborators
            .templates
            .attach_template(ctx, group.id, template_id, &validated.template)
            .await
        {
            Ok(urls) => urls,
            Err(e) => return Err(self.roll_back(ctx, &mut progress, &group, "attach_template", e).await),
        };
        tracing::debug!(template_id, "template attached");

        progress.advance(CreationState::Enrolling);
        if let Err(e) = self
            .enroll_projects(
                ctx,
                group.id,
                &validated.foundation_sfid,
                &validated.scope.project_sfids,
            )
            .await
        {
            return Err(self.roll_back(ctx, &mut progress, &group, "enroll_projects", e).await);
        }
        progress.advance(CreationState::Done);

        let mappings = collaborators
            .mappings
            .get_mappings_for_group(ctx, group.id)
            .await?;
        let mut summary = ClaGroupSummary::from_group(&group, &validated.foundation_sfid, &mappings);
        summary.icla_pdf_url = urls.individual_url;
        summary.ccla_pdf_url = urls.corporate_url;

        collaborators.events.record(LogEvent::new(
            ctx,
            &group,
            actor,
            EventData::ClaGroupCreated(ClaGroupCreatedData {
                foundation_sfid: validated.foundation_sfid.clone(),
                project_sfids: validated.scope.project_sfids.clone(),
            }),
        ));
        record_duration("create", started);
        tracing::info!(name = %group.name, projects = summary.project_list.len(), "CLA Group created");

        Ok(summary)
    }

    async fn ensure_name_available(&self, ctx: &RequestContext, name: &str) -> Result<()> {
        let existing = self
            .collaborators()
            .projects
            .get_group_by_name(ctx, name)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "CLA Group name lookup failed"))?;
        match existing {
            Some(group) => {
                tracing::warn!(existing_id = %group.id, %name, "CLA Group name already in use");
                Err(SagaError::NameConflict {
                    cla_group_id: group.id,
                    name: name.to_string(),
                })
            }
            None => Ok(()),
        }
    }

    /// Deletes the just-created record and hands back the error that
    /// triggered the rollback. A failed delete is logged, never returned.
    async fn roll_back(
        &self,
        ctx: &RequestContext,
        progress: &mut Progress,
        group: &ClaGroup,
        step: &'static str,
        cause: SagaError,
    ) -> SagaError {
        tracing::warn!(step, error = %cause, "creation step failed, deleting CLA Group record");
        progress.advance(CreationState::RollingBack);
        metrics::counter!("cla_group_create_rollbacks_total", "step" => step).increment(1);

        if let Err(delete_err) = self.collaborators().projects.delete_group(ctx, group.id).await {
            let failure = SagaError::CompensationFailed {
                step: step.to_string(),
                reason: delete_err.to_string(),
            };
            metrics::counter!("cla_group_compensation_failures_total").increment(1);
            tracing::error!(
                cla_group_id = %group.id,
                name = %group.name,
                error = %failure,
                "rollback failed, manual cleanup required"
            );
        }

        progress.advance(CreationState::Failed);
        cause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SagaConfig;
    use crate::services::InMemoryCollaborators;
    use domain::{ProjectDetails, TemplateFields, ValidationError};

    fn setup() -> (ClaGroupService, InMemoryCollaborators) {
        let in_memory = InMemoryCollaborators::new();
        in_memory
            .metadata
            .add_project(ProjectDetails::foundation("F1", "Foundation One"));
        let service = ClaGroupService::new(in_memory.collaborators(), SagaConfig::default());
        (service, in_memory)
    }

    fn input() -> CreateClaGroupInput {
        CreateClaGroupInput {
            icla_enabled: Some(true),
            ccla_enabled: Some(true),
            ccla_requires_icla: Some(false),
            cla_group_name: Some("Test".to_string()),
            cla_group_description: None,
            foundation_sfid: Some("F1".to_string()),
            project_sfid_list: vec!["F1".to_string()],
            template_fields: TemplateFields::default(),
        }
    }

    #[test]
    fn test_progress_follows_diagram() {
        let mut progress = Progress::default();
        progress.advance(CreationState::CreatingRecord);
        progress.advance(CreationState::AttachingTemplate);
        progress.advance(CreationState::RollingBack);
        progress.advance(CreationState::Failed);
        assert!(progress.state.is_terminal());
    }

    #[tokio::test]
    async fn test_create_uses_default_template_and_actor_acl() {
        let (service, in_memory) = setup();

        let summary = service
            .create_cla_group(&RequestContext::new(), &input(), &Actor::new("pm"))
            .await
            .unwrap();

        let stored = in_memory.projects.get(summary.cla_group_id).unwrap();
        assert_eq!(stored.acl, ["pm"]);
        assert_eq!(stored.version, "v2");
        assert_eq!(stored.external_id, "F1");
        assert_eq!(
            in_memory.templates.attached_template(summary.cla_group_id).as_deref(),
            Some(crate::config::APACHE_STYLE_TEMPLATE_ID)
        );
        assert!(summary.icla_pdf_url.is_some());
        assert!(summary.ccla_pdf_url.is_some());
        assert_eq!(in_memory.events.event_types(), ["cla_group.created"]);
    }

    #[tokio::test]
    async fn test_missing_field_makes_no_remote_calls() {
        let (service, in_memory) = setup();
        let mut bad = input();
        bad.ccla_requires_icla = None;

        let result = service
            .create_cla_group(&RequestContext::new(), &bad, &Actor::new("pm"))
            .await;

        assert!(matches!(
            result,
            Err(SagaError::Validation(ValidationError::MissingField("ccla_requires_icla")))
        ));
        assert_eq!(in_memory.projects.group_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected_before_create() {
        let (service, in_memory) = setup();
        let ctx = RequestContext::new();
        service
            .create_cla_group(&ctx, &input(), &Actor::new("pm"))
            .await
            .unwrap();

        let result = service.create_cla_group(&ctx, &input(), &Actor::new("pm")).await;

        assert!(matches!(result, Err(SagaError::NameConflict { .. })));
        assert_eq!(in_memory.projects.group_count(), 1);
    }

    #[tokio::test]
    async fn test_template_failure_rolls_back() {
        let (service, in_memory) = setup();
        in_memory.templates.set_fail_on_attach(true);

        let result = service
            .create_cla_group(&RequestContext::new(), &input(), &Actor::new("pm"))
            .await;

        assert!(matches!(result, Err(SagaError::TemplateService(_))));
        assert_eq!(in_memory.projects.group_count(), 0);
        assert_eq!(in_memory.projects.delete_calls(), 1);
        assert!(in_memory.events.event_types().is_empty());
    }

    #[tokio::test]
    async fn test_failed_rollback_returns_original_error() {
        let (service, in_memory) = setup();
        in_memory.templates.set_fail_on_attach(true);
        in_memory.projects.set_fail_on_delete(true);

        let result = service
            .create_cla_group(&RequestContext::new(), &input(), &Actor::new("pm"))
            .await;

        assert!(matches!(result, Err(SagaError::TemplateService(_))));
        // Record left behind for manual cleanup.
        assert_eq!(in_memory.projects.group_count(), 1);
    }
}
