//! Task dispatcher: runs one checker operation under a deadline and turns
//! whatever happened into exactly one [`ResultMessage`].

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

use crate::checker::{Checker, CheckerOutcome};
use crate::context::TaskContext;
use crate::error::{EnoError, EnoResult};
use crate::observability::record_duration;
use crate::result_mapper::map_outcome;
use crate::types::{CheckerResult, InfoMessage, ResultMessage, TaskDescription};

/// Stateless front of a checker; cheap to clone and share between requests
#[derive(Clone)]
pub struct TaskDispatcher {
    checker: Arc<dyn Checker>,
}

impl TaskDispatcher {
    pub fn new(checker: Arc<dyn Checker>) -> Self {
        Self { checker }
    }

    pub fn info(&self) -> InfoMessage {
        self.checker.info()
    }

    /// Execute `task` and report the result
    ///
    /// The operation gets a child of `cancel` which also fires when
    /// `task.timeout()` elapses. Cancellation of either kind yields OFFLINE
    /// without a message. Errors and panics that are not service signals
    /// yield INTERNAL_ERROR; their detail is only logged.
    pub async fn execute(
        &self,
        task: &TaskDescription,
        cancel: CancellationToken,
    ) -> ResultMessage {
        let token = cancel.child_token();
        let ctx = TaskContext::new(task, token.clone());
        let span = ctx.span();
        let start = Instant::now();

        let outcome = self.run_guarded(task, &ctx).instrument(span.clone()).await;
        let cancelled = token.is_cancelled();
        // Stops fill loops of connections the checker leaked
        token.cancel();

        let result = map_outcome(&outcome, cancelled);

        span.record("result", tracing::field::display(result.result));
        record_duration(&span, start);
        span.in_scope(|| match (&result.result, &outcome) {
            (CheckerResult::InternalError, Err(e)) => {
                error!(error = %e, "Checker failed unexpectedly")
            }
            _ if cancelled => info!("Task cancelled or ran past its deadline"),
            _ => info!(result = %result.result, "Task finished"),
        });

        result
    }

    async fn run_guarded(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        let token = ctx.cancellation();
        let op = AssertUnwindSafe(self.checker.run(task, ctx)).catch_unwind();

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(EnoError::internal("task cancelled")),
            _ = tokio::time::sleep_until(ctx.deadline) => {
                token.cancel();
                Err(EnoError::internal("deadline exceeded"))
            }
            result = op => result.unwrap_or_else(|panic| {
                Err(EnoError::internal(format!("checker panicked: {}", panic_message(&*panic))))
            }),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskMethod;
    use async_trait::async_trait;
    use std::time::Duration;
    use tracing_test::traced_test;

    struct PanickingChecker;

    #[async_trait]
    impl Checker for PanickingChecker {
        fn info(&self) -> InfoMessage {
            InfoMessage {
                service_name: "Panicking".to_string(),
                flag_variants: 1,
                noise_variants: 1,
                havoc_variants: 1,
            }
        }

        async fn put_flag(
            &self,
            _: &TaskDescription,
            _: &TaskContext,
        ) -> EnoResult<CheckerOutcome> {
            panic!("index out of bounds");
        }

        async fn get_flag(
            &self,
            _: &TaskDescription,
            _: &TaskContext,
        ) -> EnoResult<CheckerOutcome> {
            Err(EnoError::internal("secret detail"))
        }

        async fn put_noise(
            &self,
            _: &TaskDescription,
            _: &TaskContext,
        ) -> EnoResult<CheckerOutcome> {
            Ok(CheckerOutcome::ok())
        }

        async fn get_noise(
            &self,
            _: &TaskDescription,
            _: &TaskContext,
        ) -> EnoResult<CheckerOutcome> {
            Ok(CheckerOutcome::ok())
        }

        async fn havoc(&self, _: &TaskDescription, _: &TaskContext) -> EnoResult<CheckerOutcome> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(CheckerOutcome::ok())
        }
    }

    fn task(method: TaskMethod) -> TaskDescription {
        let builder =
            TaskDescription::builder(method, "127.0.0.1").timeout(Duration::from_millis(200));
        let builder = if method.requires_flag() { builder.flag("FLAG{t}") } else { builder };
        builder.build().unwrap()
    }

    #[traced_test]
    #[tokio::test]
    async fn test_panic_is_internal_error_and_logged() {
        let dispatcher = TaskDispatcher::new(Arc::new(PanickingChecker));
        let result = dispatcher.execute(&task(TaskMethod::PutFlag), CancellationToken::new()).await;

        assert_eq!(result, ResultMessage::internal_error());
        assert!(logs_contain("checker panicked: index out of bounds"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_internal_detail_not_in_message() {
        let dispatcher = TaskDispatcher::new(Arc::new(PanickingChecker));
        let result = dispatcher.execute(&task(TaskMethod::GetFlag), CancellationToken::new()).await;

        assert_eq!(result.result, CheckerResult::InternalError);
        assert_eq!(result.message, None);
        assert!(logs_contain("secret detail"));
    }

    #[tokio::test]
    async fn test_deadline_yields_offline_without_message() {
        let dispatcher = TaskDispatcher::new(Arc::new(PanickingChecker));
        let started = Instant::now();
        let result = dispatcher.execute(&task(TaskMethod::Havoc), CancellationToken::new()).await;

        assert_eq!(result, ResultMessage::offline(None));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_parent_cancellation_yields_offline() {
        let dispatcher = TaskDispatcher::new(Arc::new(PanickingChecker));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = dispatcher.execute(&task(TaskMethod::PutNoise), cancel).await;

        assert_eq!(result, ResultMessage::offline(None));
    }
}
