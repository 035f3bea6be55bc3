//! Validation error types.

use thiserror::Error;

/// Errors raised by input validation. None of these have side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was not supplied.
    #[error("bad request: required parameter '{0}' is not passed")]
    MissingField(&'static str),

    /// A field was supplied but is malformed.
    #[error("bad request: invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The project list for an enroll/unenroll was empty.
    #[error("bad request: project list is empty")]
    EmptyProjectList,

    /// The same project appears more than once in a project list.
    #[error("bad request: duplicate project '{0}' in project list")]
    DuplicateProject(String),
}
