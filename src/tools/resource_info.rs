//! Read-only resources describing the backend.
use serde_json::Value;

use crate::error::AppResult;
use crate::tools::{log_tool_call, ToolContext};

const CHECKPOINT_LOADER: &str = "CheckpointLoaderSimple";

pub async fn checkpoint_list(ctx: &ToolContext) -> AppResult<String> {
    log_tool_call("checkpoints", &(), async {
        let info = ctx.backend().get_object_info(CHECKPOINT_LOADER).await?;
        Ok(format_checkpoint_list(&info))
    })
    .await
}

/// Render `object_info/CheckpointLoaderSimple` as a numbered Markdown list.
///
/// Accepts both the legacy `[[names...], {tooltip}]` layout and the newer
/// `["COMBO", {options, tooltip}]` one. Missing pieces are reported in the
/// text rather than as errors.
pub fn format_checkpoint_list(info: &Value) -> String {
    let Some(node) = info.get(CHECKPOINT_LOADER) else {
        return format!("No {} node found; cannot list checkpoints.", CHECKPOINT_LOADER);
    };
    let Some(input) = node.get("input") else {
        return format!("{} has no `input` field.", CHECKPOINT_LOADER);
    };
    let Some(required) = input.get("required") else {
        return format!("{} has no `required` field.", CHECKPOINT_LOADER);
    };
    let Some(ckpt) = required.get("ckpt_name") else {
        return format!("{} has no `ckpt_name` field.", CHECKPOINT_LOADER);
    };

    let options = ckpt.get(1);
    let tooltip = options
        .and_then(|o| o.get("tooltip"))
        .and_then(Value::as_str)
        .unwrap_or("No description");
    let models: Vec<&Value> = match ckpt.get(0) {
        Some(Value::Array(names)) => names.iter().collect(),
        Some(Value::String(_)) => options
            .and_then(|o| o.get("options"))
            .and_then(Value::as_array)
            .map(|names| names.iter().collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut lines = vec![
        "## ComfyUI checkpoints".to_string(),
        format!("Description: {}", tooltip),
        format!("{} models found\n", models.len()),
    ];
    for (i, model) in models.iter().enumerate() {
        let name = model.as_str().map(str::to_string).unwrap_or_else(|| model.to_string());
        lines.push(format!("{}. {}", i + 1, name));
    }
    lines.join("\n")
}
