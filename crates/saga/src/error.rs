//! Saga error types.

use common::ClaGroupId;
use domain::ValidationError;
use thiserror::Error;

/// Errors that can occur during CLA Group operations.
///
/// Callers receive exactly one of these per operation. When several
/// concurrent branches fail, the first one observed is returned and the
/// rest are only logged.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Input failed validation; nothing was changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// CLA Group not found.
    #[error("CLA Group not found: {0}")]
    ClaGroupNotFound(String),

    /// External project not found in the metadata service.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// No project-to-group mapping exists for the identifier.
    #[error("project CLA Group mapping not found: {0}")]
    ProjectMappingNotFound(String),

    /// Another CLA Group already uses the requested name.
    #[error("CLA Group name conflict: '{name}' is already in use (CLA Group {cla_group_id})")]
    NameConflict {
        cla_group_id: ClaGroupId,
        name: String,
    },

    /// The project is already mapped to a different CLA Group.
    #[error("project {project_sfid} is already enrolled in CLA Group {existing}")]
    MappingConflict {
        project_sfid: String,
        existing: ClaGroupId,
    },

    /// The metadata service classified the project as something other than
    /// a project or project group.
    #[error("unsupported foundation/project SFID type: {0}")]
    UnsupportedProjectType(String),

    /// Project store error.
    #[error("project service error: {0}")]
    ProjectService(String),

    /// Template service error.
    #[error("template service error: {0}")]
    TemplateService(String),

    /// Mapping store error.
    #[error("mapping store error: {0}")]
    MappingStore(String),

    /// Signature store error.
    #[error("signature service error: {0}")]
    SignatureService(String),

    /// Role/permission service error.
    #[error("role service error: {0}")]
    RoleService(String),

    /// CLA manager request service error.
    #[error("CLA manager request service error: {0}")]
    ManagerRequestService(String),

    /// Repository integration error.
    #[error("repository service error: {0}")]
    RepositoryService(String),

    /// Project metadata service error.
    #[error("project metadata service error: {0}")]
    ProjectMetadata(String),

    /// A concurrent branch panicked before reporting.
    #[error("branch '{0}' panicked")]
    BranchPanicked(String),

    /// A rollback step failed. Logged, never returned: the error that
    /// triggered the rollback is what the caller sees, and the group needs
    /// manual cleanup.
    #[error("compensation step '{step}' failed, manual cleanup required: {reason}")]
    CompensationFailed { step: String, reason: String },

    /// The request was cancelled or its deadline passed.
    #[error("request cancelled")]
    Cancelled,
}

impl SagaError {
    /// Returns true for errors caused by the caller's input.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            SagaError::Validation(_) | SagaError::UnsupportedProjectType(_)
        )
    }

    /// Returns true for lookups that found nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SagaError::ClaGroupNotFound(_)
                | SagaError::ProjectNotFound(_)
                | SagaError::ProjectMappingNotFound(_)
        )
    }

    /// Returns true for uniqueness violations.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SagaError::NameConflict { .. } | SagaError::MappingConflict { .. }
        )
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
