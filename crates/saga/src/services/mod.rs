//! Collaborator traits and in-memory implementations.
//!
//! Each trait is the narrow verb-based contract of one independently owned
//! backing service. The in-memory implementations back the test suites and
//! local runs; they honour request cancellation and support fault injection.

pub mod event_log;
pub mod in_memory;
pub mod manager_requests;
pub mod mappings;
pub mod project_metadata;
pub mod project_store;
pub mod repositories;
pub mod roles;
pub mod signatures;
pub mod template;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

pub use event_log::{EventLog, InMemoryEventLog, TracingEventLog};
pub use in_memory::InMemoryCollaborators;
pub use manager_requests::{InMemoryManagerRequestService, ManagerRequest, ManagerRequestService};
pub use mappings::{InMemoryMappingStore, MappingStore};
pub use project_metadata::{InMemoryProjectMetadataService, ProjectMetadataService};
pub use project_store::{InMemoryProjectStore, ProjectStore};
pub use repositories::{GerritService, GitHubService, InMemoryGerritService, InMemoryGitHubService};
pub use roles::{InMemoryRoleService, RoleService};
pub use signatures::{InMemorySignatureStore, SignatureRecord, SignatureStore};
pub use template::{InMemoryTemplateService, TemplateService};

/// Handles to every collaborator the sagas call.
#[derive(Clone)]
pub struct Collaborators {
    pub projects: Arc<dyn ProjectStore>,
    pub templates: Arc<dyn TemplateService>,
    pub mappings: Arc<dyn MappingStore>,
    pub metadata: Arc<dyn ProjectMetadataService>,
    pub signatures: Arc<dyn SignatureStore>,
    pub roles: Arc<dyn RoleService>,
    pub manager_requests: Arc<dyn ManagerRequestService>,
    pub gerrits: Arc<dyn GerritService>,
    pub github: Arc<dyn GitHubService>,
    pub events: Arc<dyn EventLog>,
}

// In-memory state is only touched between awaits, so a poisoned lock still
// holds consistent data.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated network latency for in-memory services.
pub(crate) async fn latency(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}
