//! Graph Parameterizer: turns a read-only template into a job payload.
//!
//! The template is never touched; every call works on its own deep copy, so
//! concurrent tool calls cannot observe each other's prompts or seeds.
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::comfyui::types::JobPayload;
use crate::error::AppResult;
use crate::prompt::seeds::randomize_seeds;
use crate::prompt::AspectRatio;
use crate::utils::prompt_ops::{
    inputs_mut, is_link, link, require_inputs, set_input_if_present, set_required_input,
};
use crate::workflow::{nodes, JobTemplate, KindDefaults};

#[derive(Clone, Debug, Serialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub batch_size: u32,
    pub negative_prompt: Option<String>,
    pub model: Option<String>,
}

impl GenerationParams {
    pub fn from_defaults(defaults: &KindDefaults) -> Self {
        GenerationParams {
            prompt: defaults.prompt.clone(),
            width: defaults.width,
            height: defaults.height,
            batch_size: defaults.batch_size,
            negative_prompt: None,
            model: None,
        }
    }
}

/// The two graph shapes the edit template can take.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum EditInputs {
    /// One uploaded image; the second loader and its wiring are removed.
    Single { image: String },
    /// Two uploaded images stitched side by side before editing.
    Dual { first: String, second: String },
}

impl EditInputs {
    pub fn new(first: String, second: Option<String>) -> Self {
        match second {
            Some(second) => EditInputs::Dual { first, second },
            None => EditInputs::Single { image: first },
        }
    }

    pub fn first(&self) -> &str {
        match self {
            EditInputs::Single { image } => image,
            EditInputs::Dual { first, .. } => first,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EditParams {
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub guidance: f64,
    pub steps: u32,
    pub inputs: EditInputs,
}

pub struct PromptConstructor {
    api_key: Option<String>,
}

impl PromptConstructor {
    pub fn new(api_key: Option<String>) -> Self {
        PromptConstructor { api_key }
    }

    /// Text-to-image style graphs (txt2img, txt2bg).
    pub fn generation(&self, template: &JobTemplate, params: &GenerationParams) -> AppResult<JobPayload> {
        let mut graph = template.to_graph();

        set_required_input(&mut graph, nodes::PROMPT, "prompt1", json!(params.prompt))?;
        if let Some(negative) = &params.negative_prompt {
            if !set_input_if_present(&mut graph, nodes::PROMPT, "prompt2", json!(negative)) {
                tracing::debug!("Template has no negative prompt field, skipping");
            }
        }
        if let Some(model) = &params.model {
            if !set_input_if_present(&mut graph, nodes::CHECKPOINT, "ckpt_name", json!(model)) {
                tracing::debug!("Template has no checkpoint field, skipping model override");
            }
        }
        set_input_if_present(&mut graph, nodes::LATENT, "width", json!(params.width));
        set_input_if_present(&mut graph, nodes::LATENT, "height", json!(params.height));
        set_input_if_present(&mut graph, nodes::LATENT, "batch_size", json!(params.batch_size));

        self.finish(graph)
    }

    /// Image edit graph, shaped for one or two input images.
    pub fn edit(&self, template: &JobTemplate, params: &EditParams) -> AppResult<JobPayload> {
        let mut graph = template.to_graph();

        set_required_input(&mut graph, nodes::EDIT, "prompt", json!(params.prompt))?;
        set_input_if_present(&mut graph, nodes::EDIT, "aspect_ratio", json!(params.aspect_ratio.as_str()));
        set_input_if_present(&mut graph, nodes::EDIT, "guidance", json!(params.guidance));
        set_input_if_present(&mut graph, nodes::EDIT, "steps", json!(params.steps));
        set_required_input(&mut graph, nodes::FIRST_IMAGE, "image", json!(params.inputs.first()))?;

        match &params.inputs {
            EditInputs::Single { .. } => shape_single(&mut graph),
            EditInputs::Dual { second, .. } => shape_dual(&mut graph, second)?,
        }

        self.finish(graph)
    }

    fn finish(&self, mut graph: Map<String, Value>) -> AppResult<JobPayload> {
        let seeds = randomize_seeds(&mut graph);
        tracing::debug!(seeds, nodes = graph.len(), "Template parameterized");
        Ok(JobPayload::new(graph, self.api_key.as_deref()))
    }
}

/// Drop the second loader and every input still pointing at it.
fn shape_single(graph: &mut Map<String, Value>) {
    graph.remove(nodes::SECOND_IMAGE);
    if let Some(stitch) = inputs_mut(graph, nodes::STITCH) {
        stitch.remove("image2");
    }
    for node in graph.values_mut() {
        if let Some(inputs) = node.get_mut("inputs").and_then(Value::as_object_mut) {
            inputs.retain(|_, value| !(is_link(value) && value[0] == nodes::SECOND_IMAGE));
        }
    }
}

/// Make sure the second loader exists and is wired into the compositor.
fn shape_dual(graph: &mut Map<String, Value>, second: &str) -> AppResult<()> {
    match inputs_mut(graph, nodes::SECOND_IMAGE) {
        Some(inputs) => {
            inputs.insert("image".to_string(), json!(second));
        }
        None => {
            graph.insert(
                nodes::SECOND_IMAGE.to_string(),
                json!({
                    "inputs": {"image": second},
                    "class_type": "LoadImage",
                    "_meta": {"title": "Load Image"}
                }),
            );
        }
    }
    let stitch = require_inputs(graph, nodes::STITCH)?;
    stitch.insert("image2".to_string(), link(nodes::SECOND_IMAGE, 0));
    Ok(())
}
