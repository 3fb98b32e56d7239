//! Explicit per-task context handed to every checker operation

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::observability;
use crate::types::{TaskChainId, TaskDescription, TaskMethod};

/// Identity, deadline and cancellation of the task being executed
///
/// Everything a checker needs to log or correlate lives here; nothing is
/// read from ambient scope.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub task_id: u64,
    pub method: TaskMethod,
    pub team_id: u64,
    pub task_chain_id: TaskChainId,
    pub current_round_id: u64,
    pub related_round_id: u64,
    pub variant_id: u64,
    pub deadline: Instant,
    cancel: CancellationToken,
}

impl TaskContext {
    /// Build a context whose deadline is `task.timeout()` from now
    pub fn new(task: &TaskDescription, cancel: CancellationToken) -> Self {
        Self {
            task_id: task.task_id(),
            method: task.method(),
            team_id: task.team().id,
            task_chain_id: *task.task_chain_id(),
            current_round_id: task.current_round_id(),
            related_round_id: task.related_round_id(),
            variant_id: task.variant_id(),
            deadline: Instant::now() + task.timeout(),
            cancel,
        }
    }

    /// Token to pass to every blocking call
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Time left until the deadline, zero once it passed
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn span(&self) -> Span {
        observability::task_span(self)
    }
}
