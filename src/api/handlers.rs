//! Axum request handlers for the HTTP API.
use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::Value;

use crate::api::routes::AppState;
use crate::error::AppResult;
use crate::tools::{self, parse_args, ToolInfo, CATALOGUE};

pub async fn root() -> &'static str {
    "ComfyUI Tools"
}

pub async fn list_tools() -> Json<Vec<ToolInfo>> {
    Json(CATALOGUE.to_vec())
}

pub async fn txt2img(
    State(state): State<Arc<AppState>>,
    Json(args): Json<Value>,
) -> AppResult<String> {
    tools::txt2img(&state.tools, parse_args("txt2img", args)?).await
}

pub async fn txt2bg(
    State(state): State<Arc<AppState>>,
    Json(args): Json<Value>,
) -> AppResult<String> {
    tools::txt2bg(&state.tools, parse_args("txt2bg", args)?).await
}

pub async fn imgedit(
    State(state): State<Arc<AppState>>,
    Json(args): Json<Value>,
) -> AppResult<String> {
    tools::imgedit(&state.tools, parse_args("imgedit", args)?).await
}

pub async fn checkpoints(State(state): State<Arc<AppState>>) -> AppResult<String> {
    tools::checkpoint_list(&state.tools).await
}
