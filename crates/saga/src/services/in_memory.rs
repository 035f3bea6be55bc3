//! A full set of in-memory collaborators sharing one project store.

use std::sync::Arc;

use super::{
    Collaborators, InMemoryEventLog, InMemoryGerritService, InMemoryGitHubService,
    InMemoryManagerRequestService, InMemoryMappingStore, InMemoryProjectMetadataService,
    InMemoryProjectStore, InMemoryRoleService, InMemorySignatureStore, InMemoryTemplateService,
};

/// Concrete in-memory services, kept so tests can seed state and inject
/// faults after handing [`Collaborators`] to a service.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollaborators {
    pub projects: InMemoryProjectStore,
    pub templates: InMemoryTemplateService,
    pub mappings: InMemoryMappingStore,
    pub metadata: InMemoryProjectMetadataService,
    pub signatures: InMemorySignatureStore,
    pub roles: InMemoryRoleService,
    pub manager_requests: InMemoryManagerRequestService,
    pub gerrits: InMemoryGerritService,
    pub github: InMemoryGitHubService,
    pub events: InMemoryEventLog,
}

impl InMemoryCollaborators {
    pub fn new() -> Self {
        let projects = InMemoryProjectStore::new();
        Self {
            templates: InMemoryTemplateService::new(projects.clone()),
            projects,
            ..Self::default()
        }
    }

    /// Type-erased handles sharing this set's state.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            projects: Arc::new(self.projects.clone()),
            templates: Arc::new(self.templates.clone()),
            mappings: Arc::new(self.mappings.clone()),
            metadata: Arc::new(self.metadata.clone()),
            signatures: Arc::new(self.signatures.clone()),
            roles: Arc::new(self.roles.clone()),
            manager_requests: Arc::new(self.manager_requests.clone()),
            gerrits: Arc::new(self.gerrits.clone()),
            github: Arc::new(self.github.clone()),
            events: Arc::new(self.events.clone()),
        }
    }
}
