//! Wire shapes exchanged with ComfyUI.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body posted to `/api/prompt`.
#[derive(Debug, Clone, Serialize)]
pub struct JobPayload {
    pub client_id: String,
    pub prompt: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<ExtraData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtraData {
    pub api_key_comfy_org: String,
}

impl JobPayload {
    /// Wraps a parameterized graph with a fresh client token.
    pub fn new(graph: Map<String, Value>, api_key: Option<&str>) -> Self {
        JobPayload {
            client_id: uuid::Uuid::new_v4().to_string(),
            prompt: graph,
            extra_data: api_key.map(|key| ExtraData {
                api_key_comfy_org: key.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueueResponse {
    pub prompt_id: String,
}

/// A generated file on the ComfyUI side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_artifact_type")]
    pub kind: String,
}

fn default_artifact_type() -> String {
    "output".to_string()
}

impl ArtifactDescriptor {
    /// File extension of the remote name, `png` when there is none.
    pub fn extension(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => "png",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub status_str: String,
    #[serde(default)]
    pub messages: Vec<Value>,
}

/// One entry of `/api/history/{prompt_id}`. Only meaningful once
/// `status.completed` is true.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub outputs: Map<String, Value>,
}

impl HistoryRecord {
    /// Images of the first output node carrying a non-empty `images` list, in
    /// the order the backend emitted the nodes.
    pub fn first_images(&self) -> Option<Result<Vec<ArtifactDescriptor>, serde_json::Error>> {
        self.outputs
            .values()
            .filter_map(|node| node.get("images"))
            .find(|images| images.as_array().map_or(false, |list| !list.is_empty()))
            .map(|images| serde_json::from_value(images.clone()))
    }

    /// Terminal once completed, or once the backend flagged an execution error.
    pub fn is_terminal(&self) -> bool {
        self.status.completed || self.status.status_str == "error"
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub name: String,
    #[serde(default)]
    pub subfolder: String,
}
