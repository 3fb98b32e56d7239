//! A checker that accepts every task

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::checker::{Checker, CheckerOutcome};
use crate::context::TaskContext;
use crate::error::EnoResult;
use crate::registry::CheckerDeps;
use crate::types::{InfoMessage, TaskDescription};

/// Reports OK for every operation without touching the network
///
/// Useful for load-testing the scheduler and for smoke-testing a deployment.
#[derive(Debug, Default)]
pub struct DummyChecker;

impl DummyChecker {
    pub const NAME: &'static str = "dummy";

    pub fn construct(_deps: &CheckerDeps) -> EnoResult<Arc<dyn Checker>> {
        Ok(Arc::new(DummyChecker))
    }
}

#[async_trait]
impl Checker for DummyChecker {
    fn info(&self) -> InfoMessage {
        InfoMessage {
            service_name: "DummyChecker".to_string(),
            flag_variants: 1,
            noise_variants: 1,
            havoc_variants: 1,
        }
    }

    async fn put_flag(
        &self,
        _task: &TaskDescription,
        _ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        debug!("put_flag");
        Ok(CheckerOutcome::ok())
    }

    async fn get_flag(
        &self,
        _task: &TaskDescription,
        _ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        debug!("get_flag");
        Ok(CheckerOutcome::ok())
    }

    async fn put_noise(
        &self,
        _task: &TaskDescription,
        _ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        debug!("put_noise");
        Ok(CheckerOutcome::ok())
    }

    async fn get_noise(
        &self,
        _task: &TaskDescription,
        _ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        debug!("get_noise");
        Ok(CheckerOutcome::ok())
    }

    async fn havoc(
        &self,
        _task: &TaskDescription,
        _ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        debug!("havoc");
        Ok(CheckerOutcome::ok())
    }
}
