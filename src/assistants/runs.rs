use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, time::Duration};
use tracing::{debug, warn};

use crate::{
    client::{Empty, OpenAiClient},
    ApiResponseOrError, OpenAiError,
};

use super::threads::Thread;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Run {
    pub id: String,
    pub object: String,
    pub created_at: u32,
    /// The ID of the assistant used for this run.
    pub assistant_id: String,
    /// The ID of the thread associated with this run.
    pub thread_id: String,
    /// The status of the run.
    pub status: Status,
    /// The last error that occurred during this run.
    pub last_error: Option<LastError>,

    /// The time at which the run will expire.
    pub expires_at: Option<u32>,
    /// The time at which the run was started.
    pub started_at: Option<u32>,
    /// The time at which the run was completed.
    pub completed_at: Option<u32>,
    /// The time at which the run was cancelled.
    pub cancelled_at: Option<u32>,
    /// The time at which the run was failed.
    pub failed_at: Option<u32>,

    /// The model used for this run.
    pub model: Option<String>,
    /// The usage of the run. Null until the run is terminal.
    pub usage: Option<Usage>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    /// A status this client does not know about.
    #[serde(untagged)]
    Other(String),
}

impl Status {
    /// Anything other than `queued` or `in_progress` ends polling,
    /// including statuses the service may add later.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::InProgress | Status::Queued)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            Status::Queued => "queued",
            Status::InProgress => "in_progress",
            Status::RequiresAction => "requires_action",
            Status::Cancelling => "cancelling",
            Status::Cancelled => "cancelled",
            Status::Failed => "failed",
            Status::Completed => "completed",
            Status::Incomplete => "incomplete",
            Status::Expired => "expired",
            Status::Other(status) => status.as_str(),
        };
        f.write_str(status)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LastError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Serialize, Builder, Debug, Clone, Default)]
#[builder(pattern = "owned")]
#[builder(name = "CreateRunBuilder")]
#[builder(setter(strip_option, into))]
pub struct CreateRunRequest {
    pub assistant_id: String,
    /// Replaces the assistant's own instructions for this run only.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub instructions: Option<String>,
}

impl CreateRunRequest {
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            ..Default::default()
        }
    }
}

/// How [`wait_on_run`] paces and bounds itself.
///
/// The default polls every 500 ms with no deadline and no attempt cap, so a
/// run that never leaves `queued`/`in_progress` is polled forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            timeout: None,
            max_attempts: None,
        }
    }
}

impl PollOptions {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Anything that can re-fetch a run by thread and run id.
#[allow(async_fn_in_trait)]
pub trait RunSource {
    async fn fetch_run(&self, thread_id: &str, run_id: &str) -> ApiResponseOrError<Run>;
}

impl RunSource for OpenAiClient {
    async fn fetch_run(&self, thread_id: &str, run_id: &str) -> ApiResponseOrError<Run> {
        self.get_run(thread_id, run_id).await
    }
}

/// Re-fetches `run` until its status is neither `queued` nor `in_progress`,
/// sleeping `options.interval` between fetches.
///
/// A run that is already terminal is returned without any fetch. No sleep
/// follows the fetch that observes a terminal status, so a finished run is
/// returned as soon as it is seen. Fetch errors are returned as-is. If `options.timeout` elapses or
/// `options.max_attempts` fetches have been made while the run is still
/// pending, an error with [`OpenAiError::is_timeout`] is returned.
pub async fn wait_on_run<S>(
    source: &S,
    run: Run,
    thread_id: &str,
    options: &PollOptions,
) -> ApiResponseOrError<Run>
where
    S: RunSource + ?Sized,
{
    let run_id = run.id.clone();
    let polling = poll_until_terminal(source, run, thread_id, options);

    match options.timeout {
        Some(timeout) => match tokio::time::timeout(timeout, polling).await {
            Ok(result) => result,
            Err(_) => {
                warn!("run {run_id} still pending after {timeout:?}");
                Err(OpenAiError::timeout(format!(
                    "run {run_id} did not finish within {timeout:?}"
                )))
            }
        },
        None => polling.await,
    }
}

async fn poll_until_terminal<S>(
    source: &S,
    mut run: Run,
    thread_id: &str,
    options: &PollOptions,
) -> ApiResponseOrError<Run>
where
    S: RunSource + ?Sized,
{
    let mut attempts = 0u32;

    while !run.status.is_terminal() {
        if options.max_attempts.is_some_and(|max| attempts >= max) {
            warn!("run {} still {} after {attempts} polls", run.id, run.status);
            return Err(OpenAiError::timeout(format!(
                "run {} did not finish after {attempts} polls",
                run.id
            )));
        }

        run = source.fetch_run(thread_id, &run.id).await?;
        attempts += 1;
        debug!("run {} is {} (poll {attempts})", run.id, run.status);

        if !run.status.is_terminal() {
            tokio::time::sleep(options.interval).await;
        }
    }

    Ok(run)
}

impl OpenAiClient {
    pub async fn create_run(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
    ) -> ApiResponseOrError<Run> {
        self.post(format!("threads/{thread_id}/runs"), request)
            .await
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> ApiResponseOrError<Run> {
        self.get(format!("threads/{thread_id}/runs/{run_id}")).await
    }

    /// Asks the service to cancel a pending run. The returned run is
    /// usually `cancelling`; poll it again to observe `cancelled`.
    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> ApiResponseOrError<Run> {
        self.post(format!("threads/{thread_id}/runs/{run_id}/cancel"), Empty {})
            .await
    }

    /// Waits for `run` on `thread` with the default [`PollOptions`].
    pub async fn wait_on_run(&self, run: Run, thread: &Thread) -> ApiResponseOrError<Run> {
        wait_on_run(self, run, &thread.id, &PollOptions::default()).await
    }

    /// Waits for `run` using the thread id recorded on the run itself.
    pub async fn poll_run(&self, run: Run, options: &PollOptions) -> ApiResponseOrError<Run> {
        let thread_id = run.thread_id.clone();
        wait_on_run(self, run, &thread_id, options).await
    }
}
