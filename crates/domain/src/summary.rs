//! Response shapes returned to callers of the CLA Group operations.

use common::ClaGroupId;
use serde::{Deserialize, Serialize};

use crate::cla_group::ClaGroup;
use crate::mapping::ProjectClaGroup;

/// A project mapped to a CLA Group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaGroupProject {
    pub project_sfid: String,
    pub project_name: String,
    pub repositories_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaGroupSummary {
    pub cla_group_id: ClaGroupId,
    pub cla_group_name: String,
    pub cla_group_description: String,
    pub foundation_sfid: String,
    pub foundation_name: String,
    pub foundation_level_cla: bool,
    pub icla_enabled: bool,
    pub ccla_enabled: bool,
    pub ccla_requires_icla: bool,
    pub icla_pdf_url: Option<String>,
    pub ccla_pdf_url: Option<String>,
    pub project_list: Vec<ClaGroupProject>,
    pub repositories_count: i64,
    pub root_project_repositories_count: i64,
    pub total_signatures: i64,
}

impl ClaGroupSummary {
    /// Builds a summary from a group record and its mapping rows.
    ///
    /// The foundation name is taken from the mapping rows (the group record
    /// does not carry it). Document URLs and signature totals are left for
    /// the caller to fill in.
    pub fn from_group(group: &ClaGroup, foundation_sfid: &str, mappings: &[ProjectClaGroup]) -> Self {
        let foundation_name = mappings
            .last()
            .map(|m| m.foundation_name.clone())
            .unwrap_or_default();

        Self {
            cla_group_id: group.id,
            cla_group_name: group.name.clone(),
            cla_group_description: group.description.clone(),
            foundation_sfid: group.foundation_sfid.clone(),
            foundation_name,
            foundation_level_cla: is_foundation_level(foundation_sfid, mappings),
            icla_enabled: group.icla_enabled,
            ccla_enabled: group.ccla_enabled,
            ccla_requires_icla: group.ccla_requires_icla,
            icla_pdf_url: None,
            ccla_pdf_url: None,
            project_list: project_list(mappings),
            repositories_count: group.root_project_repositories_count,
            root_project_repositories_count: group.root_project_repositories_count,
            total_signatures: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaGroupListSummary {
    pub list: Vec<ClaGroupSummary>,
}

impl ClaGroupListSummary {
    /// Orders entries by foundation name, then CLA Group name.
    pub fn sort(&mut self) {
        self.list.sort_by(|a, b| {
            a.foundation_name
                .cmp(&b.foundation_name)
                .then_with(|| a.cla_group_name.cmp(&b.cla_group_name))
        });
    }
}

/// Converts mapping rows into a project list sorted by project name.
pub fn project_list(mappings: &[ProjectClaGroup]) -> Vec<ClaGroupProject> {
    let mut projects: Vec<ClaGroupProject> = mappings
        .iter()
        .map(|m| ClaGroupProject {
            project_sfid: m.project_sfid.clone(),
            project_name: m.project_name.clone(),
            repositories_count: m.repositories_count,
        })
        .collect();
    projects.sort_by(|a, b| a.project_name.cmp(&b.project_name));
    projects
}

/// A group is foundation-level when the foundation itself is one of its
/// mapped projects.
pub fn is_foundation_level(foundation_sfid: &str, mappings: &[ProjectClaGroup]) -> bool {
    mappings.iter().any(|m| m.project_sfid == foundation_sfid)
}
