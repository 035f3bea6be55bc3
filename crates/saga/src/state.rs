//! Creation saga state machine.

use serde::{Deserialize, Serialize};

/// The state of a CLA Group creation in its lifecycle.
///
/// State transitions:
/// ```text
/// Validating ──► CreatingRecord ──► AttachingTemplate ──► Enrolling ──► Done
///      │               │                   │                  │
///      │               │                   └──────┬───────────┘
///      │               │                          ▼
///      │               │                     RollingBack
///      ▼               ▼                          │
///    Failed ◄──────────┴──────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CreationState {
    /// Input is being checked; nothing exists yet.
    #[default]
    Validating,

    /// The group record is being created.
    CreatingRecord,

    /// The record exists and a document template is being attached.
    AttachingTemplate,

    /// Associated projects are being enrolled.
    Enrolling,

    /// A step after record creation failed; the record is being deleted.
    RollingBack,

    /// The group exists with its template and projects (terminal state).
    Done,

    /// Creation failed (terminal state).
    Failed,
}

impl CreationState {
    /// Returns true if a failure in this state requires deleting the record.
    pub fn can_compensate(&self) -> bool {
        matches!(
            self,
            CreationState::AttachingTemplate | CreationState::Enrolling
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CreationState::Done | CreationState::Failed)
    }

    /// Returns true if moving to `next` follows the state diagram.
    pub fn can_transition_to(&self, next: CreationState) -> bool {
        use CreationState::*;
        matches!(
            (self, next),
            (Validating, CreatingRecord)
                | (CreatingRecord, AttachingTemplate)
                | (AttachingTemplate, Enrolling)
                | (Enrolling, Done)
                | (AttachingTemplate | Enrolling, RollingBack)
                | (Validating | CreatingRecord | RollingBack, Failed)
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationState::Validating => "Validating",
            CreationState::CreatingRecord => "CreatingRecord",
            CreationState::AttachingTemplate => "AttachingTemplate",
            CreationState::Enrolling => "Enrolling",
            CreationState::RollingBack => "RollingBack",
            CreationState::Done => "Done",
            CreationState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CreationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
