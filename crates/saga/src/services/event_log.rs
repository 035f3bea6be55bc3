//! Fire-and-forget event log.

use std::sync::{Arc, RwLock};

use super::{read, write};
use crate::events::LogEvent;

/// Sink for audit events. Recording never fails from the caller's side.
pub trait EventLog: Send + Sync {
    fn record(&self, event: LogEvent);
}

/// Event log that keeps every event in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    events: Arc<RwLock<Vec<LogEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        read(&self.events).clone()
    }

    /// Recorded event type names, in recording order.
    pub fn event_types(&self) -> Vec<String> {
        read(&self.events)
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }
}

impl EventLog for InMemoryEventLog {
    fn record(&self, event: LogEvent) {
        write(&self.events).push(event);
    }
}

/// Event log that writes each event as a structured `info` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventLog;

impl EventLog for TracingEventLog {
    fn record(&self, event: LogEvent) {
        let data = serde_json::to_string(&event.data).unwrap_or_default();
        tracing::info!(
            event_type = %event.event_type,
            request_id = %event.request_id,
            cla_group_id = %event.cla_group_id,
            cla_group_name = %event.cla_group_name,
            username = %event.username,
            data = %data,
            "event recorded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::events::{DeletedCountData, EventData};
    use common::ClaGroupId;
    use domain::{Actor, ClaGroup, NewClaGroup};

    fn group() -> ClaGroup {
        ClaGroup::from_new(
            ClaGroupId::new(),
            NewClaGroup {
                name: "Alpha".to_string(),
                description: String::new(),
                external_id: "F1".to_string(),
                foundation_sfid: "F1".to_string(),
                foundation_level_cla: true,
                icla_enabled: true,
                ccla_enabled: false,
                ccla_requires_icla: false,
                acl: vec![],
                version: "v2".to_string(),
            },
        )
    }

    #[test]
    fn test_in_memory_log_keeps_order() {
        let log = InMemoryEventLog::new();
        let ctx = RequestContext::new();
        let group = group();
        let actor = Actor::new("admin");

        log.record(LogEvent::new(
            &ctx,
            &group,
            &actor,
            EventData::GerritRepositoryDeleted(DeletedCountData { deleted_count: 1 }),
        ));
        log.record(LogEvent::new(
            &ctx,
            &group,
            &actor,
            EventData::RepositoryDisabled(DeletedCountData { deleted_count: 2 }),
        ));

        assert_eq!(
            log.event_types(),
            ["gerrit_repository.deleted", "repository.disabled"]
        );
        assert_eq!(log.events()[0].username, "admin");
    }

    #[test]
    fn test_tracing_log_accepts_events() {
        TracingEventLog.record(LogEvent::new(
            &RequestContext::new(),
            &group(),
            &Actor::new("admin"),
            EventData::GithubOrganizationDeleted(DeletedCountData { deleted_count: 1 }),
        ));
    }
}
