//! External project metadata as reported by the project-metadata service.

use serde::{Deserialize, Serialize};

/// Classification of an external project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    /// A leaf project.
    Project,
    /// A project group (foundation).
    ProjectGroup,
    /// Any other classification reported by the metadata service.
    Other(String),
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Project => write!(f, "Project"),
            ProjectType::ProjectGroup => write!(f, "Project Group"),
            ProjectType::Other(other) => write!(f, "{other}"),
        }
    }
}

/// Reference to a project's parent foundation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentProject {
    pub id: String,
    pub name: String,
}

/// A project record from the external metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub id: String,
    pub name: String,
    pub project_type: ProjectType,
    pub parent: Option<ParentProject>,
}

impl ProjectDetails {
    /// A foundation (project group) with no parent.
    pub fn foundation(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_type: ProjectType::ProjectGroup,
            parent: None,
        }
    }

    /// A leaf project, optionally under a parent foundation.
    pub fn project(
        id: impl Into<String>,
        name: impl Into<String>,
        parent: Option<ParentProject>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_type: ProjectType::Project,
            parent,
        }
    }

    /// Returns the (id, name) of the foundation this project belongs to.
    /// A project without a parent is its own foundation.
    pub fn foundation_ref(&self) -> (&str, &str) {
        match (&self.project_type, &self.parent) {
            (ProjectType::Project, Some(parent)) => (&parent.id, &parent.name),
            _ => (&self.id, &self.name),
        }
    }
}
