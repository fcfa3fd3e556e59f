//! Agent-facing tools. Each call is independent: it borrows the shared,
//! read-only [`ToolContext`] and owns everything it creates.
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::comfyui::{ComfyBackend, JobRunner, PollPolicy};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::prompt::PromptConstructor;
use crate::workflow::{Defaults, TemplateStore};

pub mod generate;
pub mod imgedit;
pub mod resource_info;

pub use generate::{txt2bg, txt2img, GenerateRequest};
pub use imgedit::{imgedit, ImgEditRequest};
pub use resource_info::checkpoint_list;

/// Everything a tool call needs, built once at startup.
pub struct ToolContext {
    pub runner: JobRunner,
    pub templates: TemplateStore,
    pub defaults: Defaults,
    pub constructor: PromptConstructor,
    pub output_dir: PathBuf,
}

impl ToolContext {
    pub fn new(config: &Config, backend: Arc<dyn ComfyBackend>, templates: TemplateStore) -> Self {
        let policy = PollPolicy {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
        };
        ToolContext {
            runner: JobRunner::new(backend, policy),
            defaults: Defaults::load(&templates),
            templates,
            constructor: PromptConstructor::new(config.comfy_org_key.clone()),
            output_dir: config.absolute_output_dir(),
        }
    }

    pub fn with_runner(mut self, runner: JobRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn backend(&self) -> &dyn ComfyBackend {
        self.runner.backend().as_ref()
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

pub const CATALOGUE: [ToolInfo; 4] = [
    ToolInfo {
        name: "txt2img",
        description: "Text-to-image: generate images from a prompt and return them as Markdown image links.",
    },
    ToolInfo {
        name: "txt2bg",
        description: "Background and scene generation: render full scenes, environments and landscapes, \
                      save them locally (default: the project's output directory) and return file:// Markdown links.",
    },
    ToolInfo {
        name: "imgedit",
        description: "Image edit: apply a prompt to one or two input images (local absolute paths or URLs). \
                      Aspect ratio is one of 16:9, 9:16, 3:4, 4:3 (default 16:9).",
    },
    ToolInfo {
        name: "checkpoints",
        description: "List the checkpoint models available on the ComfyUI server.",
    },
];

/// Decode raw JSON arguments for `tool`; shape errors are caller mistakes.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> AppResult<T> {
    serde_json::from_value(args)
        .map_err(|e| AppError::InvalidInput(format!("bad arguments for {}: {}", tool, e)))
}

/// Log start, arguments, duration and outcome of one tool call.
pub async fn log_tool_call<A, F>(tool: &'static str, args: &A, call: F) -> AppResult<String>
where
    A: Serialize,
    F: Future<Output = AppResult<String>>,
{
    let args = serde_json::to_string(args).unwrap_or_else(|_| "<unserializable>".to_string());
    tracing::info!(tool, args = %args, "Tool call started");
    let started = Instant::now();
    let result = call.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(output) => tracing::info!(tool, elapsed_ms, output_len = output.len(), "Tool call finished"),
        Err(e) => tracing::error!(tool, elapsed_ms, error = %e, "Tool call failed"),
    }
    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::comfyui::poll::tests::RecordingSleeper;
    use crate::testing::FakeBackend;

    /// Context over an in-memory backend writing into `output_dir`.
    pub(crate) fn context(backend: Arc<FakeBackend>, output_dir: PathBuf) -> ToolContext {
        let config = Config {
            output_dir,
            ..Config::default()
        };
        let ctx = ToolContext::new(&config, backend.clone(), TemplateStore::builtin().unwrap());
        let runner = JobRunner::new(backend, PollPolicy::default())
            .with_sleeper(Arc::new(RecordingSleeper::default()));
        ctx.with_runner(runner)
    }

    #[test]
    fn catalogue_names_are_unique() {
        let mut names: Vec<_> = CATALOGUE.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CATALOGUE.len());
    }

    #[test]
    fn malformed_arguments_are_invalid_input() {
        let parsed: GenerateRequest = parse_args("txt2bg", serde_json::json!({"pic_width": "640"})).unwrap();
        assert_eq!(parsed.width, Some(640));

        let err = parse_args::<GenerateRequest>("txt2bg", serde_json::json!({"pic_width": "wide"})).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn logging_passes_results_through() {
        let ok = log_tool_call("t", &serde_json::json!({"a": 1}), async { Ok("x".to_string()) }).await;
        assert_eq!(ok.unwrap(), "x");
        let err = log_tool_call("t", &(), async { Err(AppError::NoOutput("p".into())) }).await;
        assert!(err.is_err());
    }
}
