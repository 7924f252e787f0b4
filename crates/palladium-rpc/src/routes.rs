//! Route table.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Build the RPC router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mining/template", post(handlers::get_block_template))
        .route("/mining/submitblock", post(handlers::post_submit_block))
        .route("/mining/submitheader", post(handlers::post_submit_header))
        .route("/mining/info", get(handlers::get_mining_info))
        .route("/mining/generate", post(handlers::post_generate))
        .with_state(state)
}
