//! Artifact Materializer: where generated images land and how they are
//! reported back, plus the upload step that feeds image edits.
use std::fmt;
use std::path::PathBuf;

use crate::comfyui::types::ArtifactDescriptor;
use crate::comfyui::ComfyBackend;
use crate::error::AppResult;

pub mod output;
pub mod upload;

pub use output::{default_prefix, resolve_output, OutputTarget};
pub use upload::upload_input;

/// Outcome of fetching one artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactRef {
    /// Written to disk at this absolute path.
    Local(PathBuf),
    /// Download failed; the backend's view URL is reported instead.
    Remote(String),
}

impl ArtifactRef {
    pub fn to_markdown(&self) -> String {
        format!("![image]({})", self)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRef::Local(path) => {
                let path = path.to_string_lossy().replace('\\', "/");
                if path.starts_with('/') {
                    write!(f, "file://{}", path)
                } else {
                    write!(f, "file:///{}", path)
                }
            }
            ArtifactRef::Remote(url) => f.write_str(url),
        }
    }
}

/// One Markdown image line per artifact.
pub fn render_markdown(refs: &[ArtifactRef]) -> String {
    refs.iter().map(ArtifactRef::to_markdown).collect::<Vec<_>>().join("\n")
}

/// Reference every artifact by its view URL without downloading anything.
pub fn remote_refs(backend: &dyn ComfyBackend, artifacts: &[ArtifactDescriptor]) -> Vec<ArtifactRef> {
    artifacts
        .iter()
        .map(|artifact| ArtifactRef::Remote(backend.view_url(artifact)))
        .collect()
}

/// Download every artifact into `target`. A failed download degrades to the
/// remote URL for that artifact only; failing to create the output
/// directory aborts.
pub async fn materialize(
    backend: &dyn ComfyBackend,
    artifacts: &[ArtifactDescriptor],
    target: &OutputTarget,
) -> AppResult<Vec<ArtifactRef>> {
    target.ensure_dir().await?;
    let mut refs = Vec::with_capacity(artifacts.len());
    for (index, artifact) in artifacts.iter().enumerate() {
        let path = target.path_for(index, artifacts.len(), artifact.extension());
        let url = backend.view_url(artifact);
        let outcome = match backend.get_image(artifact).await {
            Ok(bytes) => match tokio::fs::write(&path, &bytes).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Image saved");
                    ArtifactRef::Local(path)
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to write image, keeping URL");
                    ArtifactRef::Remote(url)
                }
            },
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to download image, keeping URL");
                ArtifactRef::Remote(url)
            }
        };
        refs.push(outcome);
    }
    Ok(refs)
}
