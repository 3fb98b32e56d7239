//! The plugin boundary: one trait, five lifecycle operations
//!
//! A checker reports on the remote service through [`CheckerOutcome`].
//! Anything else, an `Err` that is not a service signal or a panic, is a bug
//! in the checker and is reported as an internal error by the dispatcher.

use async_trait::async_trait;

use crate::context::TaskContext;
use crate::error::EnoResult;
use crate::types::{InfoMessage, TaskDescription, TaskMethod};

/// What a checker operation concluded about the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerOutcome {
    /// The service behaved; `attack_info` is published to attackers
    Success { attack_info: Option<String> },
    /// The service answered but incorrectly
    Mumble(String),
    /// The service could not be reached or stopped answering
    Offline(String),
}

impl CheckerOutcome {
    pub fn ok() -> Self {
        CheckerOutcome::Success { attack_info: None }
    }

    pub fn with_attack_info(info: impl Into<String>) -> Self {
        CheckerOutcome::Success {
            attack_info: Some(info.into()),
        }
    }

    pub fn mumble(message: impl Into<String>) -> Self {
        CheckerOutcome::Mumble(message.into())
    }

    pub fn offline(message: impl Into<String>) -> Self {
        CheckerOutcome::Offline(message.into())
    }
}

/// A service-specific checker
///
/// Operations must observe `ctx.cancellation()` in every blocking call.
/// Returning `Err(EnoError::Mumble)` or `Err(EnoError::Offline)` is
/// equivalent to returning the matching outcome, so `?` on connection calls
/// does the right thing.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Service name and variant counts
    fn info(&self) -> InfoMessage;

    async fn put_flag(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome>;

    async fn get_flag(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome>;

    async fn put_noise(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome>;

    async fn get_noise(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome>;

    async fn havoc(&self, task: &TaskDescription, ctx: &TaskContext) -> EnoResult<CheckerOutcome>;

    /// Route a task to the operation its method selects
    async fn run(&self, task: &TaskDescription, ctx: &TaskContext) -> EnoResult<CheckerOutcome> {
        match task.method() {
            TaskMethod::PutFlag => self.put_flag(task, ctx).await,
            TaskMethod::GetFlag => self.get_flag(task, ctx).await,
            TaskMethod::PutNoise => self.put_noise(task, ctx).await,
            TaskMethod::GetNoise => self.get_noise(task, ctx).await,
            TaskMethod::Havoc => self.havoc(task, ctx).await,
        }
    }
}
