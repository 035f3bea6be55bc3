//! Request-scoped context threaded through every collaborator call.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Result, SagaError};

/// Identifies one in-flight request and carries its cancellation signal.
///
/// Cloned into every concurrent branch. The sagas never cancel it; the
/// collaborators check it before doing work.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Creates a context bound to an externally owned cancellation token.
    pub fn with_cancellation(request_id: Uuid, cancellation: CancellationToken) -> Self {
        Self {
            request_id,
            cancellation,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns `Err(SagaError::Cancelled)` once the request is cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(SagaError::Cancelled);
        }
        Ok(())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
