//! CLA manager access-request service.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{ClaGroupId, CompanyId};
use uuid::Uuid;

use super::{read, write};
use crate::context::RequestContext;
use crate::error::{Result, SagaError};

/// A pending request by a user to become CLA manager for a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerRequest {
    pub request_id: Uuid,
    pub company_id: CompanyId,
    pub cla_group_id: ClaGroupId,
    pub username: String,
}

#[async_trait]
pub trait ManagerRequestService: Send + Sync {
    /// Pending requests for a (company, group) pair, oldest first.
    async fn get_requests(
        &self,
        ctx: &RequestContext,
        company_id: CompanyId,
        cla_group_id: ClaGroupId,
    ) -> Result<Vec<ManagerRequest>>;

    async fn delete_request(&self, ctx: &RequestContext, request_id: Uuid) -> Result<()>;
}

#[derive(Debug, Default)]
struct InMemoryManagerRequestState {
    requests: Vec<ManagerRequest>,
    fail_on_get: bool,
    fail_on_delete: bool,
    delete_calls: usize,
}

/// In-memory manager-request service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryManagerRequestService {
    state: Arc<RwLock<InMemoryManagerRequestState>>,
}

impl InMemoryManagerRequestService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files a pending request and returns its ID.
    pub fn add_request(
        &self,
        company_id: CompanyId,
        cla_group_id: ClaGroupId,
        username: &str,
    ) -> Uuid {
        let request_id = Uuid::new_v4();
        write(&self.state).requests.push(ManagerRequest {
            request_id,
            company_id,
            cla_group_id,
            username: username.to_string(),
        });
        request_id
    }

    /// Number of requests still pending for a group.
    pub fn pending_count(&self, cla_group_id: ClaGroupId) -> usize {
        read(&self.state)
            .requests
            .iter()
            .filter(|r| r.cla_group_id == cla_group_id)
            .count()
    }

    pub fn delete_calls(&self) -> usize {
        read(&self.state).delete_calls
    }

    pub fn set_fail_on_get(&self, fail: bool) {
        write(&self.state).fail_on_get = fail;
    }

    pub fn set_fail_on_delete(&self, fail: bool) {
        write(&self.state).fail_on_delete = fail;
    }
}

#[async_trait]
impl ManagerRequestService for InMemoryManagerRequestService {
    async fn get_requests(
        &self,
        ctx: &RequestContext,
        company_id: CompanyId,
        cla_group_id: ClaGroupId,
    ) -> Result<Vec<ManagerRequest>> {
        ctx.check()?;
        let state = read(&self.state);
        if state.fail_on_get {
            return Err(SagaError::ManagerRequestService(format!(
                "unable to list CLA manager requests for company {company_id}"
            )));
        }
        Ok(state
            .requests
            .iter()
            .filter(|r| r.company_id == company_id && r.cla_group_id == cla_group_id)
            .cloned()
            .collect())
    }

    async fn delete_request(&self, ctx: &RequestContext, request_id: Uuid) -> Result<()> {
        ctx.check()?;
        let mut state = write(&self.state);
        state.delete_calls += 1;
        if state.fail_on_delete {
            return Err(SagaError::ManagerRequestService(format!(
                "unable to delete CLA manager request {request_id}"
            )));
        }
        state.requests.retain(|r| r.request_id != request_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_and_delete_requests() {
        let ctx = RequestContext::new();
        let service = InMemoryManagerRequestService::new();
        let company = CompanyId::new();
        let group = ClaGroupId::new();
        let first = service.add_request(company, group, "alice");
        service.add_request(company, group, "bob");
        service.add_request(CompanyId::new(), group, "carol");

        let pending = service.get_requests(&ctx, company, group).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].request_id, first);

        service.delete_request(&ctx, first).await.unwrap();
        assert_eq!(service.pending_count(group), 2);
        assert_eq!(service.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_delete() {
        let ctx = RequestContext::new();
        let service = InMemoryManagerRequestService::new();
        let group = ClaGroupId::new();
        let id = service.add_request(CompanyId::new(), group, "alice");
        service.set_fail_on_delete(true);

        assert!(matches!(
            service.delete_request(&ctx, id).await,
            Err(SagaError::ManagerRequestService(_))
        ));
        assert_eq!(service.pending_count(group), 1);
    }
}
