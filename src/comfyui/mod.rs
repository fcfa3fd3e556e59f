//! ComfyUI backend access and the submit-then-poll protocol.
//!
//! `ComfyBackend` is the seam between the protocol and the network: the
//! reqwest-backed `ComfyUIClient` implements it for real use, tests swap in
//! an in-memory backend.
use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;

pub mod client;
pub mod poll;
pub mod runner;
pub mod types;

pub use client::ComfyUIClient;
pub use poll::{PollPolicy, Sleeper, TokioSleeper};
pub use runner::JobRunner;
pub use types::{ArtifactDescriptor, HistoryRecord, JobPayload};

#[async_trait]
pub trait ComfyBackend: Send + Sync {
    /// Submit a job and return the backend's prompt id.
    async fn queue_prompt(&self, payload: &JobPayload) -> AppResult<String>;

    /// History record for `prompt_id`, `None` while the backend has not
    /// recorded it yet.
    async fn get_history(&self, prompt_id: &str) -> AppResult<Option<HistoryRecord>>;

    /// Raw bytes of a generated artifact.
    async fn get_image(&self, artifact: &ArtifactDescriptor) -> AppResult<Vec<u8>>;

    /// Raw bytes behind an arbitrary URL (remote input images).
    async fn fetch_url(&self, url: &str) -> AppResult<Vec<u8>>;

    /// Upload an input image; returns the name the backend stored it under.
    async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> AppResult<String>;

    /// Node description from `/api/object_info/{node_class}`.
    async fn get_object_info(&self, node_class: &str) -> AppResult<Value>;

    /// Public view URL of an artifact.
    fn view_url(&self, artifact: &ArtifactDescriptor) -> String;
}
