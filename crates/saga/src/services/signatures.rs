//! Signature store trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ClaGroupId;
use domain::{AgreementKind, CompanyRef};

use super::{read, write};
use crate::context::RequestContext;
use crate::error::{Result, SagaError};

/// Trait for the signature store.
#[async_trait]
pub trait SignatureStore: Send + Sync {
    /// Number of signed, valid signatures of one kind for a group.
    async fn signature_count(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        kind: AgreementKind,
    ) -> Result<i64>;

    /// Companies holding at least one signed corporate signature for a
    /// group, each listed once.
    async fn companies_with_signed_corporate_signatures(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<Vec<CompanyRef>>;

    /// Marks every signature of a group invalid and returns how many
    /// changed.
    async fn invalidate_all_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        cla_group_name: &str,
    ) -> Result<u64>;
}

/// One stored signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub cla_group_id: ClaGroupId,
    pub kind: AgreementKind,
    pub company: Option<CompanyRef>,
    pub signed: bool,
    pub valid: bool,
}

#[derive(Debug, Default)]
struct InMemorySignatureState {
    records: Vec<SignatureRecord>,
    fail_on_count: bool,
    fail_on_companies: bool,
    fail_on_invalidate: bool,
}

/// In-memory signature store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemorySignatureStore {
    state: Arc<RwLock<InMemorySignatureState>>,
}

impl InMemorySignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a signed individual signature.
    pub fn add_individual_signature(&self, cla_group_id: ClaGroupId) {
        self.add(SignatureRecord {
            cla_group_id,
            kind: AgreementKind::Individual,
            company: None,
            signed: true,
            valid: true,
        });
    }

    /// Adds a signed corporate signature for a company.
    pub fn add_corporate_signature(&self, cla_group_id: ClaGroupId, company: CompanyRef) {
        self.add(SignatureRecord {
            cla_group_id,
            kind: AgreementKind::Corporate,
            company: Some(company),
            signed: true,
            valid: true,
        });
    }

    pub fn add(&self, record: SignatureRecord) {
        write(&self.state).records.push(record);
    }

    /// Number of still-valid signatures for a group.
    pub fn valid_count(&self, cla_group_id: ClaGroupId) -> usize {
        read(&self.state)
            .records
            .iter()
            .filter(|r| r.cla_group_id == cla_group_id && r.valid)
            .count()
    }

    pub fn set_fail_on_count(&self, fail: bool) {
        write(&self.state).fail_on_count = fail;
    }

    pub fn set_fail_on_companies(&self, fail: bool) {
        write(&self.state).fail_on_companies = fail;
    }

    pub fn set_fail_on_invalidate(&self, fail: bool) {
        write(&self.state).fail_on_invalidate = fail;
    }
}

#[async_trait]
impl SignatureStore for InMemorySignatureStore {
    async fn signature_count(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        kind: AgreementKind,
    ) -> Result<i64> {
        ctx.check()?;
        let state = read(&self.state);
        if state.fail_on_count {
            return Err(SagaError::SignatureService(
                "unable to count signatures".to_string(),
            ));
        }
        let count = state
            .records
            .iter()
            .filter(|r| r.cla_group_id == cla_group_id && r.kind == kind && r.signed && r.valid)
            .count();
        Ok(count as i64)
    }

    async fn companies_with_signed_corporate_signatures(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
    ) -> Result<Vec<CompanyRef>> {
        ctx.check()?;
        let state = read(&self.state);
        if state.fail_on_companies {
            return Err(SagaError::SignatureService(
                "unable to query corporate signatures".to_string(),
            ));
        }

        let mut companies: Vec<CompanyRef> = Vec::new();
        for record in &state.records {
            if record.cla_group_id != cla_group_id
                || record.kind != AgreementKind::Corporate
                || !record.signed
                || !record.valid
            {
                continue;
            }
            if let Some(company) = &record.company {
                if !companies.iter().any(|c| c.company_id == company.company_id) {
                    companies.push(company.clone());
                }
            }
        }
        Ok(companies)
    }

    async fn invalidate_all_for_group(
        &self,
        ctx: &RequestContext,
        cla_group_id: ClaGroupId,
        _cla_group_name: &str,
    ) -> Result<u64> {
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_invalidate {
            return Err(SagaError::SignatureService(format!(
                "unable to invalidate signatures for CLA Group {cla_group_id}"
            )));
        }

        let mut invalidated = 0;
        for record in state
            .records
            .iter_mut()
            .filter(|r| r.cla_group_id == cla_group_id && r.valid)
        {
            record.valid = false;
            invalidated += 1;
        }
        Ok(invalidated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::CompanyId;

    fn company(name: &str) -> CompanyRef {
        CompanyRef {
            company_id: CompanyId::new(),
            company_sfid: format!("sfid-{name}"),
            company_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_counts_by_kind() {
        let ctx = RequestContext::new();
        let store = InMemorySignatureStore::new();
        let group = ClaGroupId::new();
        store.add_individual_signature(group);
        store.add_individual_signature(group);
        store.add_corporate_signature(group, company("acme"));
        store.add_individual_signature(ClaGroupId::new());

        assert_eq!(
            store
                .signature_count(&ctx, group, AgreementKind::Individual)
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .signature_count(&ctx, group, AgreementKind::Corporate)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_companies_are_distinct_and_signed_only() {
        let ctx = RequestContext::new();
        let store = InMemorySignatureStore::new();
        let group = ClaGroupId::new();
        let acme = company("acme");
        store.add_corporate_signature(group, acme.clone());
        store.add_corporate_signature(group, acme.clone());
        store.add(SignatureRecord {
            cla_group_id: group,
            kind: AgreementKind::Corporate,
            company: Some(company("pending")),
            signed: false,
            valid: true,
        });

        let companies = store
            .companies_with_signed_corporate_signatures(&ctx, group)
            .await
            .unwrap();
        assert_eq!(companies, vec![acme]);
    }

    #[tokio::test]
    async fn test_invalidate_all_for_group() {
        let ctx = RequestContext::new();
        let store = InMemorySignatureStore::new();
        let group = ClaGroupId::new();
        let other = ClaGroupId::new();
        store.add_individual_signature(group);
        store.add_corporate_signature(group, company("acme"));
        store.add_individual_signature(other);

        assert_eq!(store.invalidate_all_for_group(&ctx, group, "g").await.unwrap(), 2);
        assert_eq!(store.invalidate_all_for_group(&ctx, group, "g").await.unwrap(), 0);
        assert_eq!(store.valid_count(group), 0);
        assert_eq!(store.valid_count(other), 1);
    }
}
