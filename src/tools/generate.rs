//! `txt2img` and `txt2bg`: prompt in, images out.
use serde::{Deserialize, Serialize};

use crate::artifacts::{default_prefix, materialize, remote_refs, render_markdown, resolve_output};
use crate::error::{AppError, AppResult};
use crate::prompt::GenerationParams;
use crate::tools::{log_tool_call, ToolContext};
use crate::utils::lenient::option_number;
use crate::workflow::{JobKind, KindDefaults};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, alias = "pic_width", deserialize_with = "option_number")]
    pub width: Option<u32>,
    #[serde(default, alias = "pic_height", deserialize_with = "option_number")]
    pub height: Option<u32>,
    #[serde(default, deserialize_with = "option_number")]
    pub batch_size: Option<u32>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Existing directory, or a file path to write a single image to.
    #[serde(default)]
    pub save_dir: Option<String>,
    /// File name prefix (without extension).
    #[serde(default)]
    pub filename: Option<String>,
}

impl GenerateRequest {
    fn wants_local_copy(&self) -> bool {
        self.save_dir.is_some() || self.filename.is_some()
    }

    pub fn to_params(&self, defaults: &KindDefaults) -> AppResult<GenerationParams> {
        let mut params = GenerationParams::from_defaults(defaults);
        if let Some(prompt) = self.prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            params.prompt = prompt.to_string();
        }
        params.width = positive("width", self.width.unwrap_or(params.width))?;
        params.height = positive("height", self.height.unwrap_or(params.height))?;
        params.batch_size = positive("batch_size", self.batch_size.unwrap_or(params.batch_size))?;
        params.negative_prompt = self.negative_prompt.clone().filter(|n| !n.trim().is_empty());
        params.model = self.model.clone().filter(|m| !m.trim().is_empty());
        Ok(params)
    }
}

fn positive(field: &str, value: u32) -> AppResult<u32> {
    if value == 0 {
        return Err(AppError::InvalidInput(format!("{} must be greater than zero", field)));
    }
    Ok(value)
}

/// Text-to-image. Returns the backend's view URLs unless a save location
/// was requested.
pub async fn txt2img(ctx: &ToolContext, request: GenerateRequest) -> AppResult<String> {
    log_tool_call("txt2img", &request, generate(ctx, JobKind::Txt2Img, &request)).await
}

/// Background/scene generation, always saved locally.
pub async fn txt2bg(ctx: &ToolContext, request: GenerateRequest) -> AppResult<String> {
    log_tool_call("txt2bg", &request, generate(ctx, JobKind::Txt2Bg, &request)).await
}

async fn generate(ctx: &ToolContext, kind: JobKind, request: &GenerateRequest) -> AppResult<String> {
    let params = request.to_params(&ctx.defaults.get(kind))?;
    let target = if kind == JobKind::Txt2Img && !request.wants_local_copy() {
        None
    } else {
        Some(resolve_output(
            request.save_dir.as_deref(),
            request.filename.as_deref(),
            &default_prefix(kind),
            &ctx.output_dir,
        )?)
    };
    let template = ctx.templates.template(kind)?;
    let payload = ctx.constructor.generation(template, &params)?;

    let artifacts = ctx.runner.submit_and_wait(&payload).await?;
    tracing::debug!(kind = %kind, count = artifacts.len(), "Images generated");

    let refs = match target {
        Some(target) => materialize(ctx.backend(), &artifacts, &target).await?,
        None => remote_refs(ctx.backend(), &artifacts),
    };
    Ok(render_markdown(&refs))
}
