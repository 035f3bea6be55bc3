//! Role/permission service trait and in-memory implementation.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{Actor, RoleKind};

use super::{latency, read, write};
use crate::context::RequestContext;
use crate::error::{Result, SagaError};

/// Trait for the external role/permission service.
#[async_trait]
pub trait RoleService: Send + Sync {
    /// Revokes one role kind for a (company, project) scope. Revoking a role
    /// nobody holds succeeds.
    async fn delete_role_permissions(
        &self,
        ctx: &RequestContext,
        company_sfid: &str,
        project_sfid: &str,
        role: RoleKind,
        actor: &Actor,
    ) -> Result<()>;
}

/// A role held in one (company, project) scope.
pub type RoleGrant = (String, String, RoleKind);

#[derive(Debug, Default)]
struct InMemoryRoleState {
    grants: HashSet<RoleGrant>,
    calls: usize,
    fail_on_role: Option<RoleKind>,
    delay: Option<Duration>,
}

/// In-memory role service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleService {
    state: Arc<RwLock<InMemoryRoleState>>,
}

impl InMemoryRoleService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a role in a (company, project) scope.
    pub fn grant(&self, company_sfid: &str, project_sfid: &str, role: RoleKind) {
        write(&self.state)
            .grants
            .insert((company_sfid.to_string(), project_sfid.to_string(), role));
    }

    pub fn has_role(&self, company_sfid: &str, project_sfid: &str, role: RoleKind) -> bool {
        read(&self.state)
            .grants
            .contains(&(company_sfid.to_string(), project_sfid.to_string(), role))
    }

    pub fn grant_count(&self) -> usize {
        read(&self.state).grants.len()
    }

    /// Number of revoke calls received, successful or not.
    pub fn call_count(&self) -> usize {
        read(&self.state).calls
    }

    /// Makes every revoke of `role` fail.
    pub fn set_fail_on_role(&self, role: Option<RoleKind>) {
        write(&self.state).fail_on_role = role;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        write(&self.state).delay = delay;
    }
}

#[async_trait]
impl RoleService for InMemoryRoleService {
    async fn delete_role_permissions(
        &self,
        ctx: &RequestContext,
        company_sfid: &str,
        project_sfid: &str,
        role: RoleKind,
        _actor: &Actor,
    ) -> Result<()> {
        let delay = read(&self.state).delay;
        latency(delay).await;
        ctx.check()?;

        let mut state = write(&self.state);
        state.calls += 1;
        if state.fail_on_role == Some(role) {
            return Err(SagaError::RoleService(format!(
                "unable to remove {role} role for company {company_sfid} on project {project_sfid}"
            )));
        }
        state
            .grants
            .remove(&(company_sfid.to_string(), project_sfid.to_string(), role));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_revoke_removes_only_that_role() {
        let ctx = RequestContext::new();
        let service = InMemoryRoleService::new();
        let actor = Actor::new("admin");
        service.grant("C1", "P1", RoleKind::ClaManager);
        service.grant("C1", "P1", RoleKind::ClaSignatory);

        service
            .delete_role_permissions(&ctx, "C1", "P1", RoleKind::ClaManager, &actor)
            .await
            .unwrap();

        assert!(!service.has_role("C1", "P1", RoleKind::ClaManager));
        assert!(service.has_role("C1", "P1", RoleKind::ClaSignatory));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_revoking_absent_role_succeeds() {
        let ctx = RequestContext::new();
        let service = InMemoryRoleService::new();
        service
            .delete_role_permissions(&ctx, "C1", "P1", RoleKind::ClaManagerDesignee, &Actor::new("a"))
            .await
            .unwrap();
        assert_eq!(service.grant_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_on_role() {
        let ctx = RequestContext::new();
        let service = InMemoryRoleService::new();
        service.set_fail_on_role(Some(RoleKind::ClaSignatory));
        let actor = Actor::new("a");

        assert!(
            service
                .delete_role_permissions(&ctx, "C1", "P1", RoleKind::ClaSignatory, &actor)
                .await
                .is_err()
        );
        assert!(
            service
                .delete_role_permissions(&ctx, "C1", "P1", RoleKind::ClaManager, &actor)
                .await
                .is_ok()
        );
        assert_eq!(service.call_count(), 2);
    }
}
