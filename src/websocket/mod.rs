pub mod auth;
pub mod events;
pub mod handler;
pub mod manager;

pub use events::{ClientCommand, ClientEvent, ServerEvent};
pub use manager::{RoomManager, RoomStats};

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::AppState;

/// 清理间隔（秒）
const CLEANUP_INTERVAL_SECS: u64 = 300;
/// 无ping超时（分钟）
const STALE_AFTER_MINUTES: i64 = 10;

pub fn create_websocket_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(handler::websocket_handler))
        .route("/ws/stats", get(handler::websocket_stats))
}

/// Background task to periodically drop connections that stopped pinging.
pub async fn start_connection_cleanup_task(rooms: RoomManager) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(CLEANUP_INTERVAL_SECS));

    loop {
        interval.tick().await;
        tracing::debug!("Running WebSocket connection cleanup");
        let removed = rooms.cleanup_stale_connections(STALE_AFTER_MINUTES).await;
        if removed > 0 {
            tracing::info!(removed, "Dropped stale WebSocket connections");
        }
    }
}
