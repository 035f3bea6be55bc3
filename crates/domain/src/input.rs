//! Operation inputs.
//!
//! Creation fields are optional at the type level because presence is part
//! of what the validator checks.

use serde::{Deserialize, Serialize};

/// One caller-supplied value for a template variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMetaField {
    pub name: String,
    pub template_variable: String,
    pub value: String,
}

/// Template selection and variable values for a new group's documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFields {
    /// Template to use; the configured baseline template when absent.
    pub template_id: Option<String>,
    #[serde(default)]
    pub meta_fields: Vec<TemplateMetaField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateClaGroupInput {
    pub icla_enabled: Option<bool>,
    pub ccla_enabled: Option<bool>,
    pub ccla_requires_icla: Option<bool>,
    pub cla_group_name: Option<String>,
    pub cla_group_description: Option<String>,
    pub foundation_sfid: Option<String>,
    #[serde(default)]
    pub project_sfid_list: Vec<String>,
    #[serde(default)]
    pub template_fields: TemplateFields,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateClaGroupInput {
    /// New name; empty means "keep the current name".
    #[serde(default)]
    pub cla_group_name: String,
    #[serde(default)]
    pub cla_group_description: String,
}

/// Fields a caller wants checked before attempting a create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaGroupValidationRequest {
    pub cla_group_name: Option<String>,
    pub cla_group_description: Option<String>,
}
