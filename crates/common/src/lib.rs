//! Shared identifier types used across the CLA Group workspace.

pub mod types;

pub use types::{ClaGroupId, CompanyId};
