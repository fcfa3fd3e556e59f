//! ComfyUI tool server library
//!
//! Modules:
//! - `api`: Axum handlers and router exposing the tools over HTTP.
//! - `artifacts`: Output path resolution, downloads and input uploads.
//! - `comfyui`: ComfyUI REST client and the submit-then-poll job runner.
//! - `prompt`: Template parameterization (prompts, geometry, seeds, edit inputs).
//! - `tools`: The agent-facing tools returning Markdown image references.
//! - `workflow`: Job kinds, bundled templates and their cached defaults.
//! - `utils`: Node-graph JSON helpers and lenient argument parsing.
//! - `config`: Env-driven configuration loader.
//! - `logging`: Console and rolling-file tracing setup.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `ComfyUIClient`,
//! `JobRunner`, `PromptConstructor`, `TemplateStore` and `ToolContext`.
pub mod api;
pub mod artifacts;
pub mod comfyui;
pub mod config;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod tools;
pub mod utils;
pub mod workflow;

#[cfg(test)]
pub mod testing;

pub use comfyui::client::ComfyUIClient;
pub use comfyui::runner::JobRunner;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use prompt::constructor::PromptConstructor;
pub use tools::ToolContext;
pub use workflow::TemplateStore;
