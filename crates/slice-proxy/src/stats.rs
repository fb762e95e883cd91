use crate::proxy::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::Arc;

/// Admin router, served on its own port: Prometheus render plus a
/// one-shot JSON snapshot of the cache counters.
pub fn router(state: Arc<AppState>, prom: PrometheusHandle) -> Router {
    Router::new()
        .route(
            "/metrics",
            get(move || {
                let handle = prom.clone();
                async move { handle.render() }
            }),
        )
        .route("/api/stats", get(stats_handler))
        .with_state(state)
}

/// GET /api/stats — one-shot cache stats.
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.cache.stats();
    let total = stats.hits + stats.misses;

    Json(json!({
        "hits": stats.hits,
        "misses": stats.misses,
        "hit_rate": if total > 0 { stats.hits as f64 / total as f64 } else { 0.0 },
        "evictions": stats.evictions,
        "entries": stats.entries,
        "current_bytes": stats.current_bytes,
        "max_bytes": stats.max_bytes,
    }))
}
