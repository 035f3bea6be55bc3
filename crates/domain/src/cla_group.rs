//! The CLA Group record and its agreement documents.

use chrono::{DateTime, Utc};
use common::ClaGroupId;
use serde::{Deserialize, Serialize};

/// Record version tag written by this service.
pub const CLA_GROUP_VERSION: &str = "v2";

/// The two agreement kinds a CLA Group can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementKind {
    /// Individual contributor license agreement.
    Individual,
    /// Corporate contributor license agreement.
    Corporate,
}

impl AgreementKind {
    /// Both kinds, individual first.
    pub const ALL: [AgreementKind; 2] = [AgreementKind::Individual, AgreementKind::Corporate];

    /// Returns the short name used by the signature store.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementKind::Individual => "icla",
            AgreementKind::Corporate => "ccla",
        }
    }
}

impl std::fmt::Display for AgreementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A versioned agreement document generated from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub major_version: u32,
    pub minor_version: u32,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Creates a document stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        major_version: u32,
        minor_version: u32,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            major_version,
            minor_version,
            url: url.into(),
            created_at: Utc::now(),
        }
    }
}

/// Returns the currently active document: highest major version, then
/// highest minor version, then most recently created.
pub fn current_document(documents: &[Document]) -> Option<&Document> {
    documents
        .iter()
        .max_by_key(|d| (d.major_version, d.minor_version, d.created_at))
}

/// Document URLs produced when a template is attached to a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUrls {
    pub individual_url: Option<String>,
    pub corporate_url: Option<String>,
}

/// A CLA Group as stored in the project store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaGroup {
    pub id: ClaGroupId,
    pub name: String,
    pub description: String,
    /// External identifier the record was created under (the foundation).
    pub external_id: String,
    pub foundation_sfid: String,
    pub foundation_level_cla: bool,
    pub icla_enabled: bool,
    pub ccla_enabled: bool,
    pub ccla_requires_icla: bool,
    /// Usernames allowed to manage this group.
    pub acl: Vec<String>,
    pub individual_documents: Vec<Document>,
    pub corporate_documents: Vec<Document>,
    pub root_project_repositories_count: i64,
    pub version: String,
}

impl ClaGroup {
    /// Materializes a new record from a creation request.
    pub fn from_new(id: ClaGroupId, new: NewClaGroup) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            external_id: new.external_id,
            foundation_sfid: new.foundation_sfid,
            foundation_level_cla: new.foundation_level_cla,
            icla_enabled: new.icla_enabled,
            ccla_enabled: new.ccla_enabled,
            ccla_requires_icla: new.ccla_requires_icla,
            acl: new.acl,
            individual_documents: Vec::new(),
            corporate_documents: Vec::new(),
            root_project_repositories_count: 0,
            version: new.version,
        }
    }

    /// Returns the documents stored for an agreement kind.
    pub fn documents(&self, kind: AgreementKind) -> &[Document] {
        match kind {
            AgreementKind::Individual => &self.individual_documents,
            AgreementKind::Corporate => &self.corporate_documents,
        }
    }

    /// Returns the documents stored for an agreement kind, mutably.
    pub fn documents_mut(&mut self, kind: AgreementKind) -> &mut Vec<Document> {
        match kind {
            AgreementKind::Individual => &mut self.individual_documents,
            AgreementKind::Corporate => &mut self.corporate_documents,
        }
    }

    /// Returns the active document for an agreement kind, if any.
    pub fn current_document(&self, kind: AgreementKind) -> Option<&Document> {
        current_document(self.documents(kind))
    }

    /// Returns whether the agreement kind is enabled on this group.
    pub fn is_enabled(&self, kind: AgreementKind) -> bool {
        match kind {
            AgreementKind::Individual => self.icla_enabled,
            AgreementKind::Corporate => self.ccla_enabled,
        }
    }
}

/// Everything needed to create a CLA Group record. The store assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClaGroup {
    pub name: String,
    pub description: String,
    pub external_id: String,
    pub foundation_sfid: String,
    pub foundation_level_cla: bool,
    pub icla_enabled: bool,
    pub ccla_enabled: bool,
    pub ccla_requires_icla: bool,
    pub acl: Vec<String>,
    pub version: String,
}
