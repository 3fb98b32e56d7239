//! Checker for a line-oriented key/value service
//!
//! Wire protocol, one request per connection, every line `\n`-terminated:
//!
//! ```text
//! SET <key> <value>   ->  OK
//! GET <key>           ->  <value>
//! PING                ->  PONG
//! ```
//!
//! Flags and noise are stored under the task chain id, so the get task of a
//! chain finds what its put task stored.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::checker::{Checker, CheckerOutcome};
use crate::connection::{ConnectOptions, PipelinedConnection};
use crate::context::TaskContext;
use crate::error::{EnoError, EnoResult};
use crate::registry::CheckerDeps;
use crate::types::{InfoMessage, TaskDescription};

const LINE_END: &[u8] = b"\n";

pub struct LineStoreChecker {
    port: u16,
    options: ConnectOptions,
}

impl LineStoreChecker {
    pub const NAME: &'static str = "linestore";

    pub fn new(port: u16, options: ConnectOptions) -> Self {
        Self { port, options }
    }

    pub fn construct(deps: &CheckerDeps) -> EnoResult<Arc<dyn Checker>> {
        Ok(Arc::new(Self::new(deps.service_port(), deps.connect_options.clone())))
    }

    /// Send one request line and read one response line
    async fn exchange(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
        request: &str,
    ) -> EnoResult<String> {
        let mut conn = PipelinedConnection::connect(
            task.address(),
            self.port,
            ctx.cancellation(),
            &self.options,
        )
        .await?;

        let response = async {
            conn.send(format!("{}\n", request).as_bytes()).await?;
            conn.receive_until(LINE_END).await
        }
        .await;
        conn.close().await;

        let line = String::from_utf8(response?.to_vec())
            .map_err(|_| EnoError::mumble("Service returned invalid UTF-8"))?;
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    async fn store(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
        value: &str,
    ) -> EnoResult<CheckerOutcome> {
        let key = ctx.task_chain_id.to_string();
        let response = self.exchange(task, ctx, &format!("SET {} {}", key, value)).await?;
        if response != "OK" {
            debug!(response = %response, "Unexpected SET response");
            return Ok(CheckerOutcome::mumble("Unexpected response to SET"));
        }
        Ok(CheckerOutcome::with_attack_info(key))
    }

    async fn retrieve(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
        expected: &str,
        missing: &str,
    ) -> EnoResult<CheckerOutcome> {
        let key = ctx.task_chain_id.to_string();
        let response = self.exchange(task, ctx, &format!("GET {}", key)).await?;
        if response != expected {
            debug!(key = %key, "Stored value mismatch");
            return Ok(CheckerOutcome::mumble(missing));
        }
        Ok(CheckerOutcome::ok())
    }
}

/// Deterministic noise for a chain, so getnoise can recompute what putnoise stored
pub fn noise_for(chain_id: &str) -> String {
    // FNV-1a
    let hash = chain_id
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3));
    format!("noise-{:016x}", hash)
}

fn required_flag(task: &TaskDescription) -> EnoResult<&str> {
    task.flag()
        .ok_or_else(|| EnoError::internal("flag task without a flag"))
}

#[async_trait]
impl Checker for LineStoreChecker {
    fn info(&self) -> InfoMessage {
        InfoMessage {
            service_name: "LineStore".to_string(),
            flag_variants: 1,
            noise_variants: 1,
            havoc_variants: 1,
        }
    }

    async fn put_flag(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        self.store(task, ctx, required_flag(task)?).await
    }

    async fn get_flag(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        self.retrieve(task, ctx, required_flag(task)?, "Flag not found").await
    }

    async fn put_noise(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        let noise = noise_for(&ctx.task_chain_id.to_string());
        self.store(task, ctx, &noise).await
    }

    async fn get_noise(
        &self,
        task: &TaskDescription,
        ctx: &TaskContext,
    ) -> EnoResult<CheckerOutcome> {
        let noise = noise_for(&ctx.task_chain_id.to_string());
        self.retrieve(task, ctx, &noise, "Noise not found").await
    }

    async fn havoc(&self, task: &TaskDescription, ctx: &TaskContext) -> EnoResult<CheckerOutcome> {
        let response = self.exchange(task, ctx, "PING").await?;
        if response != "PONG" {
            return Ok(CheckerOutcome::mumble("Unexpected response to PING"));
        }
        Ok(CheckerOutcome::ok())
    }
}
