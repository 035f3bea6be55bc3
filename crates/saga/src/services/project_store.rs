//! Project store trait and in-memory implementation.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::ClaGroupId;
use domain::{AgreementKind, ClaGroup, Document, NewClaGroup};

use super::{read, write};
use crate::context::RequestContext;
use crate::error::{Result, SagaError};

/// Trait for the store that owns CLA Group records.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Creates a group record; the store assigns its ID.
    async fn create_group(&self, ctx: &RequestContext, new: NewClaGroup) -> Result<ClaGroup>;

    /// Replaces an existing group record.
    async fn update_group(&self, ctx: &RequestContext, group: ClaGroup) -> Result<ClaGroup>;

    async fn delete_group(&self, ctx: &RequestContext, id: ClaGroupId) -> Result<()>;

    /// Loads a group, failing with `ClaGroupNotFound` if absent.
    async fn get_group_by_id(&self, ctx: &RequestContext, id: ClaGroupId) -> Result<ClaGroup>;

    async fn get_group_by_name(&self, ctx: &RequestContext, name: &str)
    -> Result<Option<ClaGroup>>;

    async fn get_groups_by_foundation(
        &self,
        ctx: &RequestContext,
        foundation_sfid: &str,
    ) -> Result<Vec<ClaGroup>>;

    /// Looks a group up by the external ID it was created under.
    async fn get_group_by_external_id(
        &self,
        ctx: &RequestContext,
        external_id: &str,
    ) -> Result<Option<ClaGroup>>;

    /// URL of the active document for an agreement kind, if one exists.
    async fn get_active_document_url(
        &self,
        ctx: &RequestContext,
        id: ClaGroupId,
        kind: AgreementKind,
    ) -> Result<Option<String>>;
}

#[derive(Debug, Default)]
struct InMemoryProjectState {
    groups: BTreeMap<ClaGroupId, ClaGroup>,
    fail_on_create: bool,
    fail_on_update: bool,
    fail_on_delete: bool,
    fail_lookups: HashSet<ClaGroupId>,
    delete_calls: usize,
}

/// In-memory project store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectStore {
    state: Arc<RwLock<InMemoryProjectState>>,
}

impl InMemoryProjectStore {
    /// Creates a new in-memory project store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a group record directly, bypassing create.
    pub fn insert(&self, group: ClaGroup) {
        write(&self.state).groups.insert(group.id, group);
    }

    /// Returns a stored group, if present.
    pub fn get(&self, id: ClaGroupId) -> Option<ClaGroup> {
        read(&self.state).groups.get(&id).cloned()
    }

    pub fn contains(&self, id: ClaGroupId) -> bool {
        read(&self.state).groups.contains_key(&id)
    }

    pub fn group_count(&self) -> usize {
        read(&self.state).groups.len()
    }

    /// Number of delete calls received, successful or not.
    pub fn delete_calls(&self) -> usize {
        read(&self.state).delete_calls
    }

    /// Appends a document to a stored group.
    pub fn add_document(&self, id: ClaGroupId, kind: AgreementKind, document: Document) -> Result<()> {
        let mut state = write(&self.state);
        let group = state
            .groups
            .get_mut(&id)
            .ok_or_else(|| SagaError::ClaGroupNotFound(id.to_string()))?;
        group.documents_mut(kind).push(document);
        Ok(())
    }

    /// Configures the store to fail create calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        write(&self.state).fail_on_create = fail;
    }

    /// Configures the store to fail update calls.
    pub fn set_fail_on_update(&self, fail: bool) {
        write(&self.state).fail_on_update = fail;
    }

    /// Configures the store to fail delete calls.
    pub fn set_fail_on_delete(&self, fail: bool) {
        write(&self.state).fail_on_delete = fail;
    }

    /// Makes ID lookups of one group fail with a service error.
    pub fn fail_lookup_of(&self, id: ClaGroupId) {
        write(&self.state).fail_lookups.insert(id);
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn create_group(&self, ctx: &RequestContext, new: NewClaGroup) -> Result<ClaGroup> {
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_create {
            return Err(SagaError::ProjectService(
                "unable to create CLA Group record".to_string(),
            ));
        }

        let group = ClaGroup::from_new(ClaGroupId::new(), new);
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, ctx: &RequestContext, group: ClaGroup) -> Result<ClaGroup> {
        ctx.check()?;
        let mut state = write(&self.state);
        if state.fail_on_update {
            return Err(SagaError::ProjectService(
                "unable to update CLA Group record".to_string(),
            ));
        }

        let existing = state
            .groups
            .get_mut(&group.id)
            .ok_or_else(|| SagaError::ClaGroupNotFound(group.id.to_string()))?;
        *existing = group.clone();
        Ok(group)
    }

    async fn delete_group(&self, ctx: &RequestContext, id: ClaGroupId) -> Result<()> {
        ctx.check()?;
        let mut state = write(&self.state);
        state.delete_calls += 1;
        if state.fail_on_delete {
            return Err(SagaError::ProjectService(format!(
                "unable to delete CLA Group {id}"
            )));
        }

        state
            .groups
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| SagaError::ClaGroupNotFound(id.to_string()))
    }

    async fn get_group_by_id(&self, ctx: &RequestContext, id: ClaGroupId) -> Result<ClaGroup> {
        ctx.check()?;
        let state = read(&self.state);
        if state.fail_lookups.contains(&id) {
            return Err(SagaError::ProjectService(format!(
                "lookup of CLA Group {id} failed"
            )));
        }

        state
            .groups
            .get(&id)
            .cloned()
            .ok_or_else(|| SagaError::ClaGroupNotFound(id.to_string()))
    }

    async fn get_group_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Option<ClaGroup>> {
        ctx.check()?;
        Ok(read(&self.state)
            .groups
            .values()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn get_groups_by_foundation(
        &self,
        ctx: &RequestContext,
        foundation_sfid: &str,
    ) -> Result<Vec<ClaGroup>> {
        ctx.check()?;
        Ok(read(&self.state)
            .groups
            .values()
            .filter(|g| g.foundation_sfid == foundation_sfid)
            .cloned()
            .collect())
    }

    async fn get_group_by_external_id(
        &self,
        ctx: &RequestContext,
        external_id: &str,
    ) -> Result<Option<ClaGroup>> {
        ctx.check()?;
        Ok(read(&self.state)
            .groups
            .values()
            .find(|g| g.external_id == external_id)
            .cloned())
    }

    async fn get_active_document_url(
        &self,
        ctx: &RequestContext,
        id: ClaGroupId,
        kind: AgreementKind,
    ) -> Result<Option<String>> {
        ctx.check()?;
        let state = read(&self.state);
        let group = state
            .groups
            .get(&id)
            .ok_or_else(|| SagaError::ClaGroupNotFound(id.to_string()))?;
        Ok(group.current_document(kind).map(|d| d.url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_group(name: &str, foundation: &str) -> NewClaGroup {
        NewClaGroup {
            name: name.to_string(),
            description: String::new(),
            external_id: foundation.to_string(),
            foundation_sfid: foundation.to_string(),
            foundation_level_cla: false,
            icla_enabled: true,
            ccla_enabled: true,
            ccla_requires_icla: false,
            acl: vec![],
            version: "v2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let ctx = RequestContext::new();
        let store = InMemoryProjectStore::new();

        let group = store.create_group(&ctx, new_group("Alpha", "F1")).await.unwrap();
        assert_eq!(store.group_count(), 1);
        assert_eq!(store.get_group_by_id(&ctx, group.id).await.unwrap(), group);

        store.delete_group(&ctx, group.id).await.unwrap();
        assert!(matches!(
            store.get_group_by_id(&ctx, group.id).await,
            Err(SagaError::ClaGroupNotFound(_))
        ));
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_lookups_by_name_foundation_external_id() {
        let ctx = RequestContext::new();
        let store = InMemoryProjectStore::new();
        store.create_group(&ctx, new_group("Alpha", "F1")).await.unwrap();
        store.create_group(&ctx, new_group("Beta", "F1")).await.unwrap();
        store.create_group(&ctx, new_group("Gamma", "F2")).await.unwrap();

        assert!(store.get_group_by_name(&ctx, "alpha").await.unwrap().is_some());
        assert!(store.get_group_by_name(&ctx, "Delta").await.unwrap().is_none());
        assert_eq!(store.get_groups_by_foundation(&ctx, "F1").await.unwrap().len(), 2);
        assert_eq!(
            store
                .get_group_by_external_id(&ctx, "F2")
                .await
                .unwrap()
                .unwrap()
                .name,
            "Gamma"
        );
    }

    #[tokio::test]
    async fn test_active_document_url() {
        let ctx = RequestContext::new();
        let store = InMemoryProjectStore::new();
        let group = store.create_group(&ctx, new_group("Alpha", "F1")).await.unwrap();

        assert_eq!(
            store
                .get_active_document_url(&ctx, group.id, AgreementKind::Individual)
                .await
                .unwrap(),
            None
        );

        store
            .add_document(
                group.id,
                AgreementKind::Individual,
                Document::new("icla", 2, 0, "https://docs/icla.pdf"),
            )
            .unwrap();
        assert_eq!(
            store
                .get_active_document_url(&ctx, group.id, AgreementKind::Individual)
                .await
                .unwrap()
                .as_deref(),
            Some("https://docs/icla.pdf")
        );
    }

    #[tokio::test]
    async fn test_fail_on_create_and_cancellation() {
        let ctx = RequestContext::new();
        let store = InMemoryProjectStore::new();
        store.set_fail_on_create(true);
        assert!(store.create_group(&ctx, new_group("Alpha", "F1")).await.is_err());
        assert_eq!(store.group_count(), 0);

        store.set_fail_on_create(false);
        ctx.cancellation().cancel();
        assert!(matches!(
            store.create_group(&ctx, new_group("Alpha", "F1")).await,
            Err(SagaError::Cancelled)
        ));
    }
}
