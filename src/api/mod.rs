//! HTTP surface: one route per tool plus the checkpoint resource.
pub mod handlers;
pub mod routes;

pub use routes::{router, AppState};
