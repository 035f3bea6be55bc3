//! Structural and cross-field checks run before any remote call.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::input::{CreateClaGroupInput, TemplateFields};

pub const CLA_GROUP_NAME_MIN_LEN: usize = 2;
pub const CLA_GROUP_NAME_MAX_LEN: usize = 256;
pub const CLA_GROUP_DESCRIPTION_MAX_LEN: usize = 255;

/// The associated-project set for a new group, after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    /// No sub-projects were supplied besides the foundation itself.
    pub standalone: bool,
    pub foundation_level: bool,
    /// Projects to enroll. Always contains the foundation when standalone.
    pub project_sfids: Vec<String>,
}

/// Classifies the project list of a creation request.
///
/// Standalone groups are foundation-level by definition and always carry
/// the foundation in their project list. A non-standalone group is still
/// foundation-level if the caller listed the foundation explicitly.
pub fn classify_projects(foundation_sfid: &str, project_sfids: &[String]) -> ProjectScope {
    let standalone = project_sfids.iter().all(|p| p == foundation_sfid);
    let mut project_sfids = project_sfids.to_vec();
    if standalone && !project_sfids.iter().any(|p| p == foundation_sfid) {
        project_sfids.push(foundation_sfid.to_string());
    }
    let foundation_level = standalone || project_sfids.iter().any(|p| p == foundation_sfid);

    ProjectScope {
        standalone,
        foundation_level,
        project_sfids,
    }
}

/// A creation request with every required field present and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreate {
    pub name: String,
    pub description: String,
    pub foundation_sfid: String,
    pub icla_enabled: bool,
    pub ccla_enabled: bool,
    pub ccla_requires_icla: bool,
    pub scope: ProjectScope,
    pub template: TemplateFields,
}

pub fn validate_create_input(
    input: &CreateClaGroupInput,
) -> Result<ValidatedCreate, ValidationError> {
    let icla_enabled = input
        .icla_enabled
        .ok_or(ValidationError::MissingField("icla_enabled"))?;
    let ccla_enabled = input
        .ccla_enabled
        .ok_or(ValidationError::MissingField("ccla_enabled"))?;
    let ccla_requires_icla = input
        .ccla_requires_icla
        .ok_or(ValidationError::MissingField("ccla_requires_icla"))?;
    let name = input
        .cla_group_name
        .as_deref()
        .ok_or(ValidationError::MissingField("cla_group_name"))?;
    let foundation_sfid = input
        .foundation_sfid
        .as_deref()
        .ok_or(ValidationError::MissingField("foundation_sfid"))?;

    let name = validate_name(name)?;
    let description = input.cla_group_description.as_deref().unwrap_or_default();
    validate_description(description)?;
    let foundation_sfid = validate_sfid("foundation_sfid", foundation_sfid)?;

    if !icla_enabled && !ccla_enabled {
        return Err(ValidationError::InvalidField {
            field: "icla_enabled",
            reason: "at least one of the individual or corporate agreements must be enabled"
                .to_string(),
        });
    }
    if ccla_requires_icla && !(icla_enabled && ccla_enabled) {
        return Err(ValidationError::InvalidField {
            field: "ccla_requires_icla",
            reason: "requires both the individual and corporate agreements to be enabled"
                .to_string(),
        });
    }

    check_project_entries(&input.project_sfid_list)?;
    let scope = classify_projects(foundation_sfid, &input.project_sfid_list);

    Ok(ValidatedCreate {
        name: name.to_string(),
        description: description.to_string(),
        foundation_sfid: foundation_sfid.to_string(),
        icla_enabled,
        ccla_enabled,
        ccla_requires_icla,
        scope,
        template: input.template_fields.clone(),
    })
}

/// Validates the arguments of an enroll or unenroll request.
pub fn validate_project_list(
    foundation_sfid: &str,
    project_sfids: &[String],
) -> Result<(), ValidationError> {
    validate_sfid("foundation_sfid", foundation_sfid)?;
    if project_sfids.is_empty() {
        return Err(ValidationError::EmptyProjectList);
    }
    check_project_entries(project_sfids)
}

/// Trims and length-checks a CLA Group name.
pub fn validate_name(name: &str) -> Result<&str, ValidationError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if !(CLA_GROUP_NAME_MIN_LEN..=CLA_GROUP_NAME_MAX_LEN).contains(&len) {
        return Err(ValidationError::InvalidField {
            field: "cla_group_name",
            reason: format!(
                "length must be between {CLA_GROUP_NAME_MIN_LEN} and {CLA_GROUP_NAME_MAX_LEN} characters"
            ),
        });
    }
    Ok(trimmed)
}

pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > CLA_GROUP_DESCRIPTION_MAX_LEN {
        return Err(ValidationError::InvalidField {
            field: "cla_group_description",
            reason: format!("must be at most {CLA_GROUP_DESCRIPTION_MAX_LEN} characters"),
        });
    }
    Ok(())
}

fn validate_sfid<'a>(field: &'static str, sfid: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = sfid.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if trimmed.len() != sfid.len() || sfid.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("'{sfid}' contains whitespace"),
        });
    }
    Ok(trimmed)
}

fn check_project_entries(project_sfids: &[String]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(project_sfids.len());
    for sfid in project_sfids {
        validate_sfid("project_sfid_list", sfid)?;
        if !seen.insert(sfid.as_str()) {
            return Err(ValidationError::DuplicateProject(sfid.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> CreateClaGroupInput {
        CreateClaGroupInput {
            icla_enabled: Some(true),
            ccla_enabled: Some(true),
            ccla_requires_icla: Some(false),
            cla_group_name: Some("Test".to_string()),
            cla_group_description: None,
            foundation_sfid: Some("F1".to_string()),
            project_sfid_list: vec!["F1".to_string()],
            template_fields: TemplateFields::default(),
        }
    }

    fn sfids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_input() {
        let v = validate_create_input(&valid_input()).unwrap();
        assert_eq!(v.name, "Test");
        assert!(v.scope.standalone);
        assert!(v.scope.foundation_level);
        assert_eq!(v.scope.project_sfids, ["F1"]);
    }

    #[test]
    fn test_each_required_field() {
        let cases: [(fn(&mut CreateClaGroupInput), &str); 5] = [
            (|i| i.icla_enabled = None, "icla_enabled"),
            (|i| i.ccla_enabled = None, "ccla_enabled"),
            (|i| i.ccla_requires_icla = None, "ccla_requires_icla"),
            (|i| i.cla_group_name = None, "cla_group_name"),
            (|i| i.foundation_sfid = None, "foundation_sfid"),
        ];
        for (clear, field) in cases {
            let mut input = valid_input();
            clear(&mut input);
            assert_eq!(
                validate_create_input(&input),
                Err(ValidationError::MissingField(field))
            );
        }
    }

    #[test]
    fn test_both_agreements_disabled() {
        let mut input = valid_input();
        input.icla_enabled = Some(false);
        input.ccla_enabled = Some(false);
        assert!(matches!(
            validate_create_input(&input),
            Err(ValidationError::InvalidField { field: "icla_enabled", .. })
        ));
    }

    #[test]
    fn test_ccla_requires_icla_needs_both() {
        let mut input = valid_input();
        input.icla_enabled = Some(false);
        input.ccla_requires_icla = Some(true);
        assert!(matches!(
            validate_create_input(&input),
            Err(ValidationError::InvalidField { field: "ccla_requires_icla", .. })
        ));
    }

    #[test]
    fn test_name_length() {
        let mut input = valid_input();
        input.cla_group_name = Some(" x ".to_string());
        assert!(validate_create_input(&input).is_err());

        input.cla_group_name = Some("a".repeat(CLA_GROUP_NAME_MAX_LEN + 1));
        assert!(validate_create_input(&input).is_err());

        input.cla_group_name = Some("  Padded Name  ".to_string());
        assert_eq!(validate_create_input(&input).unwrap().name, "Padded Name");
    }

    #[test]
    fn test_description_too_long() {
        let mut input = valid_input();
        input.cla_group_description = Some("d".repeat(CLA_GROUP_DESCRIPTION_MAX_LEN + 1));
        assert!(matches!(
            validate_create_input(&input),
            Err(ValidationError::InvalidField { field: "cla_group_description", .. })
        ));
    }

    #[test]
    fn test_duplicate_projects_rejected() {
        let mut input = valid_input();
        input.project_sfid_list = sfids(&["P1", "P1"]);
        assert_eq!(
            validate_create_input(&input),
            Err(ValidationError::DuplicateProject("P1".to_string()))
        );
    }

    #[test]
    fn test_classify_empty_list_is_standalone() {
        let scope = classify_projects("F1", &[]);
        assert!(scope.standalone);
        assert!(scope.foundation_level);
        assert_eq!(scope.project_sfids, ["F1"]);
    }

    #[test]
    fn test_classify_sub_projects_only() {
        let scope = classify_projects("F1", &sfids(&["P1", "P2"]));
        assert!(!scope.standalone);
        assert!(!scope.foundation_level);
        assert_eq!(scope.project_sfids, ["P1", "P2"]);
    }

    #[test]
    fn test_classify_foundation_plus_sub_projects() {
        let scope = classify_projects("F1", &sfids(&["P1", "F1"]));
        assert!(!scope.standalone);
        assert!(scope.foundation_level);
        assert_eq!(scope.project_sfids, ["P1", "F1"]);
    }

    #[test]
    fn test_project_list_validation() {
        assert!(validate_project_list("F1", &sfids(&["P1"])).is_ok());
        assert_eq!(
            validate_project_list("F1", &[]),
            Err(ValidationError::EmptyProjectList)
        );
        assert_eq!(
            validate_project_list("", &sfids(&["P1"])),
            Err(ValidationError::MissingField("foundation_sfid"))
        );
        assert!(validate_project_list("F1", &sfids(&["P 1"])).is_err());
        assert!(validate_project_list("F1", &sfids(&[""])).is_err());
    }
}
