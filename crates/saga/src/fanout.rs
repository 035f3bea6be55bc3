//! Fan-out/fan-in coordinator.
//!
//! A [`TaskGroup`] launches independent branches onto the runtime and joins
//! on **all** of them. Every spawned branch reports exactly one result and
//! every result is drained before [`TaskGroup::join`] returns, whatever the
//! policy, so no branch outlives the call that spawned it.

use std::future::Future;

use tokio::task::JoinSet;
use tracing::Instrument;

use crate::error::{Result, SagaError};

/// How branch failures are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPolicy {
    /// The first failure observed (in completion order) fails the group.
    /// Remaining branches still run to completion and are drained.
    FirstError,
    /// Every failure is logged; the group itself never fails.
    BestEffort,
}

/// A failed branch and the label it was spawned under.
#[derive(Debug)]
pub struct BranchFailure {
    pub label: String,
    pub error: SagaError,
}

/// A set of concurrently running branches that each produce a `T`.
pub struct TaskGroup<T> {
    name: &'static str,
    tasks: JoinSet<(String, Result<T>)>,
    spawned: usize,
}

impl<T: Send + 'static> TaskGroup<T> {
    /// Creates an empty group. `name` labels logs and metrics.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: JoinSet::new(),
            spawned: 0,
        }
    }

    /// Launches one branch inside the caller's span.
    pub fn spawn<F>(&mut self, label: impl Into<String>, branch: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let label = label.into();
        self.spawned += 1;
        self.tasks
            .spawn(async move { (label, branch.await) }.in_current_span());
    }

    /// Number of branches launched so far.
    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// Waits for every branch and aggregates the results under `policy`.
    pub async fn join(mut self, policy: JoinPolicy) -> FanOut<T> {
        let mut outputs = Vec::with_capacity(self.spawned);
        let mut failures: Vec<BranchFailure> = Vec::new();
        let mut drained = 0usize;

        while let Some(joined) = self.tasks.join_next().await {
            drained += 1;
            let (label, result) = match joined {
                Ok(reported) => reported,
                Err(join_err) => {
                    let label = format!("{}#panicked", self.name);
                    let err = SagaError::BranchPanicked(format!("{} ({join_err})", self.name));
                    (label, Err(err))
                }
            };

            match result {
                Ok(output) => outputs.push(output),
                Err(error) => {
                    tracing::warn!(
                        group = self.name,
                        branch = %label,
                        first = failures.is_empty(),
                        error = %error,
                        "branch failed"
                    );
                    failures.push(BranchFailure { label, error });
                }
            }
        }

        metrics::counter!("cla_group_fanout_branches_total", "group" => self.name)
            .increment(drained as u64);
        tracing::debug!(
            group = self.name,
            spawned = self.spawned,
            drained,
            failed = failures.len(),
            "fan-out joined"
        );

        FanOut {
            policy,
            spawned: self.spawned,
            drained,
            outputs,
            failures,
        }
    }
}

/// The joined results of a [`TaskGroup`].
#[derive(Debug)]
pub struct FanOut<T> {
    policy: JoinPolicy,
    spawned: usize,
    drained: usize,
    outputs: Vec<T>,
    failures: Vec<BranchFailure>,
}

impl<T> FanOut<T> {
    /// Number of branch results drained. Always equals [`FanOut::spawned`].
    pub fn drained(&self) -> usize {
        self.drained
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }

    /// Successful outputs, in completion order.
    pub fn outputs(&self) -> &[T] {
        &self.outputs
    }

    /// Failures, in completion order.
    pub fn failures(&self) -> &[BranchFailure] {
        &self.failures
    }

    /// The first failure observed, if any.
    pub fn first_error(&self) -> Option<&SagaError> {
        self.failures.first().map(|f| &f.error)
    }

    /// Resolves the group outcome under its policy.
    ///
    /// `FirstError` returns the first observed failure; `BestEffort` always
    /// returns the successful outputs.
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.policy {
            JoinPolicy::FirstError => match self.failures.into_iter().next() {
                Some(first) => Err(first.error),
                None => Ok(self.outputs),
            },
            JoinPolicy::BestEffort => Ok(self.outputs),
        }
    }
}
