use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::tools::ToolContext;

pub struct AppState {
    pub tools: ToolContext,
}

impl AppState {
    pub fn new(tools: ToolContext) -> Arc<Self> {
        Arc::new(AppState { tools })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/tools", get(handlers::list_tools))
        .route("/tools/txt2img", post(handlers::txt2img))
        .route("/tools/txt2bg", post(handlers::txt2bg))
        .route("/tools/imgedit", post(handlers::imgedit))
        .route("/resources/checkpoints", get(handlers::checkpoints))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
