//! # palladium-rpc
//!
//! HTTP surface for the mining contract: block templates with long
//! polling, block and header submission, mining info and regtest
//! generation.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::AppState;

use std::net::SocketAddr;
use tracing::info;

/// Serve the RPC interface until the task is dropped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "rpc listening");
    axum::serve(listener, app).await
}
