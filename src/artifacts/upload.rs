use std::path::Path;

use crate::comfyui::ComfyBackend;
use crate::error::{AppError, AppResult};

const FALLBACK_UPLOAD_NAME: &str = "input.png";

/// Read a local path or download a URL, push it to ComfyUI's input folder
/// and return the name the backend stored it under.
pub async fn upload_input(backend: &dyn ComfyBackend, image: &str) -> AppResult<String> {
    let upload_error = |reason: String| {
        tracing::error!(image, reason = %reason, "Input image upload failed");
        AppError::Upload {
            image: image.to_string(),
            reason,
        }
    };

    let (name, bytes) = if is_url(image) {
        let bytes = backend
            .fetch_url(image)
            .await
            .map_err(|e| upload_error(e.to_string()))?;
        (url_file_name(image), bytes)
    } else {
        let path = Path::new(image);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| upload_error(e.to_string()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_UPLOAD_NAME.to_string());
        (name, bytes)
    };

    tracing::debug!(image, name = %name, bytes = bytes.len(), "Uploading input image");
    backend
        .upload_image(&name, bytes)
        .await
        .map_err(|e| upload_error(e.to_string()))
}

fn is_url(image: &str) -> bool {
    image.starts_with("http://") || image.starts_with("https://")
}

fn url_file_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_UPLOAD_NAME.to_string())
}
