//! Template Loader: resolves a job kind to its node graph.
//!
//! `<templates_dir>/<kind>_api.json` wins when it exists; otherwise the graph
//! compiled into the binary is used. Graphs are parsed once and shared
//! read-only; callers get their own copy through [`JobTemplate::to_graph`].
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::fs;

use crate::error::{AppError, AppResult};
use crate::workflow::JobKind;

const BUILTIN_TXT2IMG: &str = include_str!("../../templates/txt2img_api.json");
const BUILTIN_TXT2BG: &str = include_str!("../../templates/txt2bg_api.json");
const BUILTIN_IMGEDIT: &str = include_str!("../../templates/imgedit_api.json");

/// Immutable node graph: node id -> `{inputs, class_type, _meta}`.
#[derive(Clone, Debug)]
pub struct JobTemplate {
    graph: Arc<Map<String, Value>>,
}

impl JobTemplate {
    pub fn parse(kind: JobKind, raw: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AppError::Template(format!("{} template is not valid JSON: {}", kind, e)))?;
        // Accept both a bare graph and the `{"prompt": {...}}` wrapper.
        let value = match value {
            Value::Object(mut map) if map.get("prompt").map_or(false, Value::is_object) => {
                map.remove("prompt").unwrap_or_default()
            }
            other => other,
        };
        match value {
            Value::Object(graph) if is_probably_graph(&graph) => Ok(JobTemplate { graph: Arc::new(graph) }),
            _ => Err(AppError::Template(format!(
                "{} template does not look like a node graph",
                kind
            ))),
        }
    }

    pub fn from_graph(graph: Map<String, Value>) -> Self {
        JobTemplate { graph: Arc::new(graph) }
    }

    pub fn graph(&self) -> &Map<String, Value> {
        &self.graph
    }

    /// Deep copy for a single invocation to mutate.
    pub fn to_graph(&self) -> Map<String, Value> {
        self.graph.as_ref().clone()
    }

    pub fn input(&self, node_id: &str, field: &str) -> Option<&Value> {
        self.graph.get(node_id)?.get("inputs")?.get(field)
    }
}

fn is_probably_graph(graph: &Map<String, Value>) -> bool {
    graph
        .values()
        .any(|node| node.get("class_type").and_then(|ct| ct.as_str()).is_some())
}

#[derive(Clone, Debug)]
pub struct TemplateStore {
    templates: HashMap<JobKind, JobTemplate>,
}

impl TemplateStore {
    /// Templates compiled into the binary.
    pub fn builtin() -> AppResult<Self> {
        let mut templates = HashMap::new();
        for kind in JobKind::ALL {
            templates.insert(kind, JobTemplate::parse(kind, builtin_source(kind))?);
        }
        Ok(TemplateStore { templates })
    }

    /// Load every kind, preferring files under `dir` over the built-in graphs.
    pub async fn load(dir: &Path) -> AppResult<Self> {
        let mut templates = HashMap::new();
        for kind in JobKind::ALL {
            let path = dir.join(format!("{}_api.json", kind.api_name()));
            let template = match fs::read_to_string(&path).await {
                Ok(raw) => {
                    tracing::info!(kind = %kind, path = %path.display(), "Loaded template from disk");
                    JobTemplate::parse(kind, &raw)?
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(kind = %kind, "No template override, using built-in graph");
                    JobTemplate::parse(kind, builtin_source(kind))?
                }
                Err(e) => {
                    return Err(AppError::Template(format!(
                        "failed to read {}: {}",
                        path.display(),
                        e
                    )))
                }
            };
            templates.insert(kind, template);
        }
        Ok(TemplateStore { templates })
    }

    pub fn with_template(mut self, kind: JobKind, template: JobTemplate) -> Self {
        self.templates.insert(kind, template);
        self
    }

    pub fn template(&self, kind: JobKind) -> AppResult<&JobTemplate> {
        self.templates
            .get(&kind)
            .ok_or_else(|| AppError::Template(format!("no template registered for {}", kind)))
    }
}

fn builtin_source(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Txt2Img => BUILTIN_TXT2IMG,
        JobKind::Txt2Bg => BUILTIN_TXT2BG,
        JobKind::ImgEdit => BUILTIN_IMGEDIT,
    }
}
