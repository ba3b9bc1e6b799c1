use axum::{
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 请求ID头部名称
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-request trace id, stored in request extensions.
#[derive(Clone, Copy, Debug)]
pub struct TraceId(pub Uuid);

pub async fn logger<B>(mut req: Request<B>, next: Next<B>) -> Response {
    // 生成 trace_id
    let trace_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::new_v4);
    req.extensions_mut().insert(TraceId(trace_id));

    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let mut response = next.run(req).await;
    let status = response.status();
    let elapsed = start.elapsed().as_millis();

    if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    if status.is_server_error() {
        error!(trace_id = %trace_id, method = %method, uri = %uri, status = status.as_u16(), elapsed_ms = elapsed, "Request failed");
    } else if status.is_client_error() {
        warn!(trace_id = %trace_id, method = %method, uri = %uri, status = status.as_u16(), elapsed_ms = elapsed, "Request rejected");
    } else {
        info!(trace_id = %trace_id, method = %method, uri = %uri, status = status.as_u16(), elapsed_ms = elapsed, "Request log");
    }
    response
}
