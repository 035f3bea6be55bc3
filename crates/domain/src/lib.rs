//! Domain layer for CLA Group orchestration.
//!
//! This crate holds the pure parts of the system:
//! - the CLA Group record and its agreement documents
//! - project-to-group mappings and the foundation mapping view
//! - operation inputs and response shapes
//! - validators that run before any remote call is issued

pub mod access;
pub mod cla_group;
pub mod error;
pub mod input;
pub mod mapping;
pub mod project;
pub mod summary;
pub mod validation;

pub use access::{Actor, CompanyRef, RoleKind};
pub use cla_group::{AgreementKind, ClaGroup, Document, DocumentUrls, NewClaGroup};
pub use error::ValidationError;
pub use input::{
    ClaGroupValidationRequest, CreateClaGroupInput, TemplateFields, TemplateMetaField,
    UpdateClaGroupInput,
};
pub use mapping::{FoundationClaGroup, FoundationMapping, FoundationMappingList, ProjectClaGroup};
pub use project::{ParentProject, ProjectDetails, ProjectType};
pub use summary::{ClaGroupListSummary, ClaGroupProject, ClaGroupSummary};
pub use validation::{ProjectScope, ValidatedCreate};
