//! In-memory ComfyUI used by unit tests.
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::comfyui::types::{ArtifactDescriptor, HistoryRecord, JobPayload};
use crate::comfyui::ComfyBackend;
use crate::error::{AppError, AppResult};

#[derive(Default)]
pub struct FakeBackend {
    history: Mutex<VecDeque<Option<HistoryRecord>>>,
    history_calls: Mutex<u32>,
    submitted: Mutex<Vec<JobPayload>>,
    rejection: Mutex<Option<String>>,
    images: Mutex<HashMap<String, Vec<u8>>>,
    remote: Mutex<HashMap<String, Vec<u8>>>,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    object_info: Mutex<Option<Value>>,
}

impl FakeBackend {
    pub fn push_history(&self, record: Option<HistoryRecord>) {
        self.history.lock().unwrap().push_back(record);
    }

    /// Queue a successful record whose single output node carries `filenames`.
    pub fn push_success(&self, filenames: &[&str]) {
        let images: Vec<Value> = filenames
            .iter()
            .map(|f| serde_json::json!({"filename": f, "subfolder": "", "type": "output"}))
            .collect();
        let record = serde_json::json!({
            "status": {"completed": true, "status_str": "success"},
            "outputs": {"9": {"images": images}}
        });
        self.push_history(Some(serde_json::from_value(record).unwrap()));
    }

    pub fn reject_submissions(&self, body: &str) {
        *self.rejection.lock().unwrap() = Some(body.to_string());
    }

    pub fn serve_image(&self, filename: &str, bytes: &[u8]) {
        self.images.lock().unwrap().insert(filename.to_string(), bytes.to_vec());
    }

    pub fn serve_url(&self, url: &str, bytes: &[u8]) {
        self.remote.lock().unwrap().insert(url.to_string(), bytes.to_vec());
    }

    pub fn set_object_info(&self, info: Value) {
        *self.object_info.lock().unwrap() = Some(info);
    }

    pub fn history_calls(&self) -> u32 {
        *self.history_calls.lock().unwrap()
    }

    pub fn submitted(&self) -> Vec<JobPayload> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComfyBackend for FakeBackend {
    async fn queue_prompt(&self, payload: &JobPayload) -> AppResult<String> {
        if let Some(body) = self.rejection.lock().unwrap().clone() {
            return Err(AppError::Rejected { endpoint: "prompt", status: 400, body });
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(payload.clone());
        Ok(format!("prompt-{}", submitted.len()))
    }

    async fn get_history(&self, _prompt_id: &str) -> AppResult<Option<HistoryRecord>> {
        *self.history_calls.lock().unwrap() += 1;
        Ok(self.history.lock().unwrap().pop_front().flatten())
    }

    async fn get_image(&self, artifact: &ArtifactDescriptor) -> AppResult<Vec<u8>> {
        self.images
            .lock()
            .unwrap()
            .get(&artifact.filename)
            .cloned()
            .ok_or_else(|| AppError::Rejected {
                endpoint: "view",
                status: 404,
                body: format!("{} not found", artifact.filename),
            })
    }

    async fn fetch_url(&self, url: &str) -> AppResult<Vec<u8>> {
        self.remote.lock().unwrap().get(url).cloned().ok_or_else(|| AppError::Rejected {
            endpoint: "input image",
            status: 404,
            body: url.to_string(),
        })
    }

    async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> AppResult<String> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((filename.to_string(), bytes));
        Ok(format!("uploaded_{}_{}", uploads.len(), filename))
    }

    async fn get_object_info(&self, node_class: &str) -> AppResult<Value> {
        self.object_info.lock().unwrap().clone().ok_or_else(|| AppError::Rejected {
            endpoint: "object_info",
            status: 404,
            body: node_class.to_string(),
        })
    }

    fn view_url(&self, artifact: &ArtifactDescriptor) -> String {
        format!(
            "http://comfy.test/api/view?filename={}&subfolder={}&type=output",
            artifact.filename, artifact.subfolder
        )
    }
}
