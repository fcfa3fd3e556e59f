//! Job Submitter/Poller: queue a payload, then wait on its history record.
use std::sync::Arc;

use crate::comfyui::poll::{poll_until, PollPolicy, PollState, Sleeper, TokioSleeper};
use crate::comfyui::types::{ArtifactDescriptor, HistoryRecord, JobPayload};
use crate::comfyui::ComfyBackend;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct JobRunner {
    backend: Arc<dyn ComfyBackend>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
}

impl JobRunner {
    pub fn new(backend: Arc<dyn ComfyBackend>, policy: PollPolicy) -> Self {
        JobRunner {
            backend,
            sleeper: Arc::new(TokioSleeper),
            policy,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn backend(&self) -> &Arc<dyn ComfyBackend> {
        &self.backend
    }

    /// Submit `payload` and block (cooperatively) until ComfyUI reports a
    /// terminal state. Returns the artifacts of the first image-bearing node.
    pub async fn submit_and_wait(&self, payload: &JobPayload) -> AppResult<Vec<ArtifactDescriptor>> {
        let prompt_id = self.backend.queue_prompt(payload).await?;
        tracing::debug!(prompt_id = %prompt_id, "Job submitted, polling history");

        let backend = &self.backend;
        let id = prompt_id.as_str();
        let outcome = poll_until(&self.policy, self.sleeper.as_ref(), |attempt| async move {
            let record = backend.get_history(id).await?;
            tracing::trace!(prompt_id = id, attempt, present = record.is_some(), "Polled history");
            classify(id, record)
        })
        .await;

        match outcome {
            Ok(Some(artifacts)) => {
                tracing::info!(prompt_id = %prompt_id, count = artifacts.len(), "Job finished");
                Ok(artifacts)
            }
            Ok(None) => {
                let err = AppError::PollExhausted {
                    prompt_id: prompt_id.clone(),
                    attempts: self.policy.max_attempts.unwrap_or_default(),
                };
                tracing::error!(error = %err);
                Err(err)
            }
            Err(err) => {
                tracing::error!(prompt_id = %prompt_id, error = %err, "Job did not produce artifacts");
                Err(err)
            }
        }
    }
}

/// Terminal-state decision for one history poll.
pub fn classify(
    prompt_id: &str,
    record: Option<HistoryRecord>,
) -> AppResult<PollState<Vec<ArtifactDescriptor>>> {
    let record = match record {
        Some(record) if record.is_terminal() => record,
        _ => return Ok(PollState::Pending),
    };
    if record.status.status_str != "success" {
        if !record.status.messages.is_empty() {
            tracing::error!(prompt_id, messages = ?record.status.messages, "Backend execution messages");
        }
        return Err(AppError::JobFailed {
            prompt_id: prompt_id.to_string(),
            status: record.status.status_str,
        });
    }
    match record.first_images() {
        Some(Ok(artifacts)) => Ok(PollState::Ready(artifacts)),
        Some(Err(source)) => Err(AppError::MalformedResponse {
            context: "history outputs",
            source,
        }),
        None => Err(AppError::NoOutput(prompt_id.to_string())),
    }
}
