//! Project-to-group mappings and the per-foundation mapping view.

use std::collections::BTreeMap;

use common::ClaGroupId;
use serde::{Deserialize, Serialize};

/// Associates one external project with exactly one CLA Group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectClaGroup {
    pub project_sfid: String,
    pub project_name: String,
    pub cla_group_id: ClaGroupId,
    pub foundation_sfid: String,
    pub foundation_name: String,
    pub repositories_count: i64,
}

/// A CLA Group and the projects mapped to it, as seen from its foundation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundationClaGroup {
    pub cla_group_id: ClaGroupId,
    pub project_sfids: Vec<String>,
}

/// All CLA Groups mapped under one foundation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundationMapping {
    pub foundation_sfid: String,
    pub cla_groups: Vec<FoundationClaGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundationMappingList {
    pub list: Vec<FoundationMapping>,
}

impl FoundationMappingList {
    /// Groups mapping rows by foundation, then by CLA Group.
    ///
    /// Foundations and groups come out in ascending ID order; project SFIDs
    /// within a group are sorted.
    pub fn from_mappings(mappings: &[ProjectClaGroup]) -> Self {
        let mut by_foundation: BTreeMap<&str, BTreeMap<ClaGroupId, Vec<String>>> = BTreeMap::new();
        for m in mappings {
            by_foundation
                .entry(m.foundation_sfid.as_str())
                .or_default()
                .entry(m.cla_group_id)
                .or_default()
                .push(m.project_sfid.clone());
        }

        let list = by_foundation
            .into_iter()
            .map(|(foundation_sfid, groups)| FoundationMapping {
                foundation_sfid: foundation_sfid.to_string(),
                cla_groups: groups
                    .into_iter()
                    .map(|(cla_group_id, mut project_sfids)| {
                        project_sfids.sort();
                        FoundationClaGroup {
                            cla_group_id,
                            project_sfids,
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { list }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(project: &str, group: ClaGroupId, foundation: &str) -> ProjectClaGroup {
        ProjectClaGroup {
            project_sfid: project.to_string(),
            project_name: project.to_lowercase(),
            cla_group_id: group,
            foundation_sfid: foundation.to_string(),
            foundation_name: foundation.to_lowercase(),
            repositories_count: 0,
        }
    }

    #[test]
    fn test_groups_by_foundation_and_group() {
        let g1 = ClaGroupId::new();
        let g2 = ClaGroupId::new();
        let rows = vec![
            mapping("P2", g1, "F2"),
            mapping("P3", g2, "F1"),
            mapping("P1", g1, "F2"),
        ];

        let out = FoundationMappingList::from_mappings(&rows);

        assert_eq!(out.list.len(), 2);
        assert_eq!(out.list[0].foundation_sfid, "F1");
        assert_eq!(out.list[1].foundation_sfid, "F2");
        assert_eq!(out.list[1].cla_groups.len(), 1);
        assert_eq!(out.list[1].cla_groups[0].project_sfids, ["P1", "P2"]);
    }

    #[test]
    fn test_empty_mappings() {
        assert!(FoundationMappingList::from_mappings(&[]).list.is_empty());
    }
}
