//! Small helpers for poking at a ComfyUI node graph held as JSON.
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Input mapping of `node_id`, failing when the node (or its `inputs`) is absent.
pub fn require_inputs<'a>(graph: &'a mut Map<String, Value>, node_id: &str) -> AppResult<&'a mut Map<String, Value>> {
    graph
        .get_mut(node_id)
        .ok_or_else(|| AppError::Template(format!("node {} missing from template", node_id)))?
        .get_mut("inputs")
        .and_then(|v| v.as_object_mut())
        .ok_or_else(|| AppError::Template(format!("node {} has no inputs", node_id)))
}

/// Input mapping of `node_id` if the node exists.
pub fn inputs_mut<'a>(graph: &'a mut Map<String, Value>, node_id: &str) -> Option<&'a mut Map<String, Value>> {
    graph.get_mut(node_id)?.get_mut("inputs")?.as_object_mut()
}

/// Overwrite `field` only if the node already declares it. Returns whether
/// anything was written.
pub fn set_input_if_present(graph: &mut Map<String, Value>, node_id: &str, field: &str, value: Value) -> bool {
    match inputs_mut(graph, node_id) {
        Some(inputs) if inputs.contains_key(field) => {
            inputs.insert(field.to_string(), value);
            true
        }
        _ => false,
    }
}

/// Write `field`, requiring the node to exist and to already declare it.
pub fn set_required_input(graph: &mut Map<String, Value>, node_id: &str, field: &str, value: Value) -> AppResult<()> {
    let inputs = require_inputs(graph, node_id)?;
    match inputs.get_mut(field) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(AppError::Template(format!(
            "node {} has no '{}' input",
            node_id, field
        ))),
    }
}

/// Link value pointing at output `slot` of `node_id`.
pub fn link(node_id: &str, slot: u32) -> Value {
    Value::Array(vec![Value::String(node_id.to_string()), Value::from(slot)])
}

pub fn is_link(value: &Value) -> bool {
    matches!(value.as_array().map(Vec::as_slice), Some([Value::String(_), Value::Number(_)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph() -> Map<String, Value> {
        match json!({
            "3": {"inputs": {"seed": 1, "model": ["4", 0]}, "class_type": "KSampler"},
            "4": {"inputs": {"ckpt_name": "a.safetensors"}, "class_type": "CheckpointLoaderSimple"},
            "9": {"class_type": "SaveImage"}
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn set_if_present_skips_undeclared_fields() {
        let mut g = graph();
        assert!(set_input_if_present(&mut g, "4", "ckpt_name", json!("b.safetensors")));
        assert!(!set_input_if_present(&mut g, "4", "lora_name", json!("x")));
        assert!(!set_input_if_present(&mut g, "77", "width", json!(512)));
        assert_eq!(g["4"]["inputs"]["ckpt_name"], "b.safetensors");
        assert!(g["4"]["inputs"].get("lora_name").is_none());
    }

    #[test]
    fn required_input_fails_fast() {
        let mut g = graph();
        assert!(set_required_input(&mut g, "3", "seed", json!(2)).is_ok());
        assert!(set_required_input(&mut g, "3", "steps", json!(2)).is_err());
        assert!(set_required_input(&mut g, "9", "images", json!(2)).is_err());
        assert!(set_required_input(&mut g, "42", "seed", json!(2)).is_err());
    }

    #[test]
    fn links_are_recognised() {
        assert!(is_link(&link("102", 0)));
        assert!(!is_link(&json!(12345)));
        assert!(!is_link(&json!(["102"])));
    }
}
