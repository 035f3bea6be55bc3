//! Events emitted to the event log.

use chrono::{DateTime, Utc};
use common::ClaGroupId;
use domain::{Actor, ClaGroup};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::RequestContext;

/// Event payloads recorded by the sagas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventData {
    /// A CLA Group was created with its template and projects.
    ClaGroupCreated(ClaGroupCreatedData),

    /// A CLA Group's name or description changed.
    ClaGroupUpdated(ClaGroupUpdatedData),

    /// A CLA Group record was removed.
    ClaGroupDeleted(ClaGroupDeletedData),

    /// Gerrit repositories of a deleted group were removed.
    GerritRepositoryDeleted(DeletedCountData),

    /// GitHub repositories of a deleted group were disabled.
    RepositoryDisabled(DeletedCountData),

    /// GitHub organization linkages of a deleted group were removed.
    GithubOrganizationDeleted(DeletedCountData),

    /// Signatures of a deleted group were invalidated.
    SignaturesInvalidated(InvalidatedCountData),
}

impl EventData {
    /// Returns the event type name stored by the event log.
    pub fn event_type(&self) -> &'static str {
        match self {
            EventData::ClaGroupCreated(_) => "cla_group.created",
            EventData::ClaGroupUpdated(_) => "cla_group.updated",
            EventData::ClaGroupDeleted(_) => "cla_group.deleted",
            EventData::GerritRepositoryDeleted(_) => "gerrit_repository.deleted",
            EventData::RepositoryDisabled(_) => "repository.disabled",
            EventData::GithubOrganizationDeleted(_) => "github_organization.deleted",
            EventData::SignaturesInvalidated(_) => "signature.invalidated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaGroupCreatedData {
    pub foundation_sfid: String,
    pub project_sfids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaGroupUpdatedData {
    pub old_name: String,
    pub new_name: String,
    pub old_description: String,
    pub new_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaGroupDeletedData {
    pub foundation_sfid: String,
    pub project_sfids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCountData {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidatedCountData {
    pub invalidated_count: u64,
}

/// One event-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub event_type: String,
    pub request_id: Uuid,
    pub cla_group_id: ClaGroupId,
    pub cla_group_name: String,
    pub username: String,
    pub data: EventData,
    pub recorded_at: DateTime<Utc>,
}

impl LogEvent {
    /// Builds an entry attributed to `actor` for `group`.
    pub fn new(ctx: &RequestContext, group: &ClaGroup, actor: &Actor, data: EventData) -> Self {
        Self {
            event_type: data.event_type().to_string(),
            request_id: ctx.request_id(),
            cla_group_id: group.id,
            cla_group_name: group.name.clone(),
            username: actor.username.clone(),
            data,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names() {
        let deleted = EventData::GerritRepositoryDeleted(DeletedCountData { deleted_count: 2 });
        assert_eq!(deleted.event_type(), "gerrit_repository.deleted");

        let invalidated =
            EventData::SignaturesInvalidated(InvalidatedCountData { invalidated_count: 1 });
        assert_eq!(invalidated.event_type(), "signature.invalidated");
    }

    #[test]
    fn test_event_data_serialization_is_tagged() {
        let data = EventData::RepositoryDisabled(DeletedCountData { deleted_count: 3 });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "RepositoryDisabled");
        assert_eq!(json["data"]["deleted_count"], 3);

        let back: EventData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }
}
