//! Scheduler-side client for a running checker service
//!
//! `submit` never fails: like the dispatcher on the other end, it folds every
//! transport problem into a [`ResultMessage`] the scheduler can store.

use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::EnoResult;
use crate::types::{InfoMessage, ResultMessage, TaskDescription, TaskMessage};

#[derive(Debug, Clone)]
pub struct CheckerClient {
    http: reqwest::Client,
    base_url: String,
    grace: Duration,
}

impl CheckerClient {
    pub fn new(base_url: impl Into<String>, config: &ClientConfig) -> EnoResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            grace: config.request_timeout_grace,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the checker's service name and variant counts
    pub async fn service_info(&self) -> EnoResult<InfoMessage> {
        let info = self
            .http
            .get(format!("{}/service", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json::<InfoMessage>()
            .await?;
        info.validate()?;
        Ok(info)
    }

    /// Run one task on the checker
    ///
    /// The request may take the task's timeout plus the configured grace.
    /// Running out of time is OFFLINE; any other transport, status or decode
    /// failure is INTERNAL_ERROR.
    pub async fn submit(&self, task: &TaskDescription) -> ResultMessage {
        let timeout = task.timeout() + self.grace;
        debug!(task_id = task.task_id(), method = %task.method(), ?timeout, "Submitting task");

        let response = match self
            .http
            .post(format!("{}/", self.base_url))
            .json(&TaskMessage::from(task))
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                error!(task_id = task.task_id(), "Task did not finish in time");
                return ResultMessage::offline(None);
            }
            Err(e) => {
                error!(task_id = task.task_id(), error = %e, "Task submission failed");
                return ResultMessage::internal_error();
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!(task_id = task.task_id(), status = %status, "Checker returned non-OK status");
            return ResultMessage::internal_error();
        }

        match response.json::<ResultMessage>().await {
            Ok(result) => strip_nul(task.task_id(), result),
            Err(e) if e.is_timeout() => {
                error!(task_id = task.task_id(), "Task did not finish in time");
                ResultMessage::offline(None)
            }
            Err(e) => {
                error!(task_id = task.task_id(), error = %e, "Undecodable result");
                ResultMessage::internal_error()
            }
        }
    }
}

/// Remove NUL characters, which downstream storage rejects
fn strip_nul(task_id: u64, mut result: ResultMessage) -> ResultMessage {
    for (field, value) in [
        ("message", &mut result.message),
        ("attackInfo", &mut result.attack_info),
    ] {
        if let Some(text) = value {
            if text.contains('\0') {
                warn!(task_id, field, "Result contained NUL characters");
                *text = text.replace('\0', "");
            }
        }
    }
    result
}
