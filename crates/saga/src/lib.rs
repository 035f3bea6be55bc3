//! Saga orchestration for CLA Groups.
//!
//! No backing service offers a transaction spanning the others, so every
//! multi-step operation here is a hand-rolled saga:
//!
//! - **create**: validate, create the record, attach the template, enroll
//!   projects; the record is deleted again if a later step fails
//! - **enroll / unenroll**: mapping bookkeeping and the CLA-service flag,
//!   run as two concurrent branches
//! - **delete**: a fan-out cleanup across repositories, signatures, manager
//!   requests and per-(company, project) roles, then unenroll and record
//!   removal
//! - **list**: parallel loading and merging of a foundation's groups
//!
//! Concurrent branches run in a [`fanout::TaskGroup`], which always drains
//! every branch before reporting.

pub mod config;
pub mod context;
pub mod create;
pub mod delete;
pub mod enroll;
pub mod error;
pub mod events;
pub mod fanout;
pub mod listing;
pub mod service;
pub mod services;
pub mod state;

pub use config::{ManagerRequestCleanup, SagaConfig};
pub use context::RequestContext;
pub use delete::{DeletionReport, cleanup_branch_count};
pub use error::{Result, SagaError};
pub use events::{EventData, LogEvent};
pub use fanout::{FanOut, JoinPolicy, TaskGroup};
pub use service::{ClaGroupService, ValidationReport};
pub use services::{Collaborators, InMemoryCollaborators};
pub use state::CreationState;
