use serde::{Deserialize, Serialize};

use crate::artifacts::{default_prefix, materialize, render_markdown, resolve_output, upload_input};
use crate::error::{AppError, AppResult};
use crate::prompt::{AspectRatio, EditInputs, EditParams};
use crate::tools::{log_tool_call, ToolContext};
use crate::utils::lenient::option_number;
use crate::workflow::defaults::{FALLBACK_GUIDANCE, FALLBACK_STEPS};
use crate::workflow::JobKind;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ImgEditRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    /// Absolute local path or http(s) URL.
    #[serde(default)]
    pub image1: Option<String>,
    #[serde(default)]
    pub image2: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default, deserialize_with = "option_number")]
    pub guidance: Option<f64>,
    #[serde(default, deserialize_with = "option_number")]
    pub steps: Option<u32>,
    #[serde(default)]
    pub save_dir: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn imgedit(ctx: &ToolContext, request: ImgEditRequest) -> AppResult<String> {
    log_tool_call("imgedit", &request, edit(ctx, &request)).await
}

async fn edit(ctx: &ToolContext, request: &ImgEditRequest) -> AppResult<String> {
    let image1 = non_blank(&request.image1)
        .ok_or_else(|| AppError::InvalidInput("image1 is required".to_string()))?;
    if let Some(steps) = request.steps.filter(|s| *s == 0) {
        return Err(AppError::InvalidInput(format!("steps must be greater than zero, got {}", steps)));
    }
    let defaults = ctx.defaults.get(JobKind::ImgEdit);
    let target = resolve_output(
        request.save_dir.as_deref(),
        request.filename.as_deref(),
        &default_prefix(JobKind::ImgEdit),
        &ctx.output_dir,
    )?;

    let first = upload_input(ctx.backend(), image1).await?;
    let second = match non_blank(&request.image2) {
        Some(image2) => Some(upload_input(ctx.backend(), image2).await?),
        None => None,
    };

    let params = EditParams {
        prompt: non_blank(&request.prompt)
            .map(str::to_string)
            .unwrap_or(defaults.prompt),
        aspect_ratio: request
            .aspect_ratio
            .as_deref()
            .map(AspectRatio::parse_lenient)
            .or(defaults.aspect_ratio)
            .unwrap_or_default(),
        guidance: request.guidance.or(defaults.guidance).unwrap_or(FALLBACK_GUIDANCE),
        steps: request.steps.or(defaults.steps).unwrap_or(FALLBACK_STEPS),
        inputs: EditInputs::new(first, second),
    };

    let template = ctx.templates.template(JobKind::ImgEdit)?;
    let payload = ctx.constructor.edit(template, &params)?;
    let artifacts = ctx.runner.submit_and_wait(&payload).await?;
    let refs = materialize(ctx.backend(), &artifacts, &target).await?;
    Ok(render_markdown(&refs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use crate::tools::tests::context;
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_first_image_is_rejected_before_any_upload() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let ctx = context(backend.clone(), dir.path().to_path_buf());

        let request = ImgEditRequest {
            prompt: Some("make it night".into()),
            image1: Some("   ".into()),
            ..ImgEditRequest::default()
        };
        let err = imgedit(&ctx, request).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(backend.uploads().is_empty());
        assert!(backend.submitted().is_empty());
    }

    #[tokio::test]
    async fn single_image_edit_drops_second_loader() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("castle.png");
        std::fs::write(&input, b"castle").unwrap();
        let backend = Arc::new(FakeBackend::default());
        backend.push_success(&["edit.png"]);
        backend.serve_image("edit.png", b"edited");
        let ctx = context(backend.clone(), dir.path().join("out"));

        let request = ImgEditRequest {
            prompt: Some("make it night".into()),
            image1: Some(input.to_string_lossy().into_owned()),
            aspect_ratio: Some("3:4".into()),
            filename: Some("night".into()),
            ..ImgEditRequest::default()
        };
        let markdown = imgedit(&ctx, request).await.unwrap();

        let graph = &backend.submitted()[0].prompt;
        assert_eq!(graph["83"]["inputs"]["prompt"], "make it night");
        assert_eq!(graph["83"]["inputs"]["aspect_ratio"], "3:4");
        assert_eq!(graph["84"]["inputs"]["image"], "uploaded_1_castle.png");
        assert!(!graph.contains_key("102"));

        let saved = dir.path().join("out").join("night.png");
        assert_eq!(std::fs::read(&saved).unwrap(), b"edited");
        assert_eq!(markdown, format!("![image](file://{})", saved.display()));
    }

    #[tokio::test]
    async fn two_images_are_both_uploaded_and_stitched() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        backend.serve_url("https://cdn.test/a.png", b"a");
        backend.serve_url("https://cdn.test/b.png", b"b");
        backend.push_success(&["edit.png"]);
        backend.serve_image("edit.png", b"edited");
        let ctx = context(backend.clone(), dir.path().to_path_buf());

        let request = ImgEditRequest {
            prompt: Some("put the hat on the cat".into()),
            image1: Some("https://cdn.test/a.png".into()),
            image2: Some("https://cdn.test/b.png".into()),
            ..ImgEditRequest::default()
        };
        imgedit(&ctx, request).await.unwrap();

        assert_eq!(backend.uploads().len(), 2);
        let graph = &backend.submitted()[0].prompt;
        assert_eq!(graph["102"]["inputs"]["image"], "uploaded_2_b.png");
        assert_eq!(graph["91"]["inputs"]["image2"], serde_json::json!(["102", 0]));
        assert_eq!(graph["83"]["inputs"]["aspect_ratio"], "16:9");
    }

    #[test]
    fn quality_knobs_accept_numeric_strings() {
        let req: ImgEditRequest =
            serde_json::from_str(r#"{"image1": "/a.png", "guidance": "4.5", "steps": "28"}"#).unwrap();
        assert_eq!(req.guidance, Some(4.5));
        assert_eq!(req.steps, Some(28));
    }

    #[tokio::test]
    async fn failed_upload_aborts_the_edit() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let ctx = context(backend.clone(), dir.path().to_path_buf());

        let request = ImgEditRequest {
            image1: Some("https://cdn.test/gone.png".into()),
            ..ImgEditRequest::default()
        };
        let err = imgedit(&ctx, request).await.unwrap_err();

        assert!(matches!(err, AppError::Upload { .. }));
        assert!(backend.submitted().is_empty());
    }
}
