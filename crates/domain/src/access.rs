//! Companies, permission roles, and the acting user.

use common::CompanyId;
use serde::{Deserialize, Serialize};

/// The user an action is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub email: Option<String>,
}

impl Actor {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
        }
    }
}

/// A company discovered through a signed corporate signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRef {
    /// Internal company record ID (used by the manager-request service).
    pub company_id: CompanyId,
    /// External company ID (used by the role/permission service).
    pub company_sfid: String,
    pub company_name: String,
}

/// Permission roles scoped to a (company, project) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleKind {
    ClaManager,
    ClaManagerDesignee,
    ClaSignatory,
}

impl RoleKind {
    /// The roles revoked for every (company, project) pair on group deletion.
    pub const ALL: [RoleKind; 3] = [
        RoleKind::ClaManager,
        RoleKind::ClaManagerDesignee,
        RoleKind::ClaSignatory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::ClaManager => "cla-manager",
            RoleKind::ClaManagerDesignee => "cla-manager-designee",
            RoleKind::ClaSignatory => "cla-signatory",
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names() {
        let names: Vec<_> = RoleKind::ALL.iter().map(RoleKind::as_str).collect();
        assert_eq!(
            names,
            ["cla-manager", "cla-manager-designee", "cla-signatory"]
        );
    }

    #[test]
    fn test_role_serializes_kebab_case() {
        let json = serde_json::to_string(&RoleKind::ClaManagerDesignee).unwrap();
        assert_eq!(json, "\"cla-manager-designee\"");
    }
}
