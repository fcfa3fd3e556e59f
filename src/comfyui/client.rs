//! Thin HTTP client for ComfyUI endpoints.
//!
//! - `queue_prompt` posts a job payload to `/api/prompt`.
//! - `get_history` fetches `/api/history/{prompt_id}`.
//! - `get_image` downloads `/api/view?filename=...&subfolder=...&type=output`.
//! - `upload_image` posts multipart content to `/upload/image`.
//! - `get_object_info` fetches `/api/object_info/{node_class}`.
use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::comfyui::types::{ArtifactDescriptor, HistoryRecord, JobPayload, QueueResponse, UploadResponse};
use crate::comfyui::ComfyBackend;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
}

impl ComfyUIClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        ComfyUIClient { client: Client::new(), base_url: base }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn ensure_success(response: Response, endpoint: &'static str) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        Err(AppError::Rejected { endpoint, status, body })
    }

    async fn decode<T: DeserializeOwned>(response: Response, context: &'static str) -> AppResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|source| {
            tracing::error!(context, body = %text, "Unexpected response shape");
            AppError::MalformedResponse { context, source }
        })
    }
}

#[async_trait]
impl ComfyBackend for ComfyUIClient {
    async fn queue_prompt(&self, payload: &JobPayload) -> AppResult<String> {
        let url = format!("{}/api/prompt", self.base_url);
        tracing::info!("Sending prompt to ComfyUI at URL: {}", url);
        tracing::debug!(client_id = %payload.client_id, "Prompt payload: {:?}", payload.prompt);

        let response = self.client.post(&url).json(payload).send().await?;
        let response = match Self::ensure_success(response, "prompt").await {
            Ok(response) => response,
            Err(err) => {
                let graph = serde_json::to_string_pretty(&payload.prompt).unwrap_or_default();
                tracing::error!(error = %err, "ComfyUI refused the job");
                tracing::error!(client_id = %payload.client_id, graph = %graph, "Rejected job graph");
                return Err(err);
            }
        };
        let queued: QueueResponse = Self::decode(response, "prompt").await?;
        tracing::info!(prompt_id = %queued.prompt_id, "Successfully queued prompt");
        Ok(queued.prompt_id)
    }

    async fn get_history(&self, prompt_id: &str) -> AppResult<Option<HistoryRecord>> {
        let url = format!("{}/api/history/{}", self.base_url, prompt_id);
        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_success(response, "history").await?;
        let mut entries: HashMap<String, HistoryRecord> = Self::decode(response, "history").await?;
        Ok(entries.remove(prompt_id))
    }

    async fn get_image(&self, artifact: &ArtifactDescriptor) -> AppResult<Vec<u8>> {
        let url = self.view_url(artifact);
        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_success(response, "view").await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_url(&self, url: &str) -> AppResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response, "input image").await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> AppResult<String> {
        let url = format!("{}/upload/image", self.base_url);
        let form = Form::new().part("image", Part::bytes(bytes).file_name(filename.to_string()));
        let response = self.client.post(&url).multipart(form).send().await?;
        let response = Self::ensure_success(response, "upload").await?;
        let uploaded: UploadResponse = Self::decode(response, "upload").await?;
        tracing::debug!(name = %uploaded.name, subfolder = %uploaded.subfolder, "Uploaded input image");
        // LoadImage addresses files below the input folder by relative path.
        Ok(if uploaded.subfolder.is_empty() {
            uploaded.name
        } else {
            format!("{}/{}", uploaded.subfolder, uploaded.name)
        })
    }

    async fn get_object_info(&self, node_class: &str) -> AppResult<Value> {
        if !node_class.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(AppError::InvalidInput(format!("invalid node class '{}'", node_class)));
        }
        let url = format!("{}/api/object_info/{}", self.base_url, node_class);
        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_success(response, "object_info").await?;
        Self::decode(response, "object_info").await
    }

    fn view_url(&self, artifact: &ArtifactDescriptor) -> String {
        let base = format!("{}/api/view", self.base_url);
        let params = [
            ("filename", artifact.filename.as_str()),
            ("subfolder", artifact.subfolder.as_str()),
            ("type", "output"),
        ];
        match reqwest::Url::parse_with_params(&base, &params) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}?filename={}&subfolder={}&type=output",
                base, artifact.filename, artifact.subfolder
            ),
        }
    }
}
