use crate::error::ProxyError;
use crate::origin::{OriginClient, ProbeInfo};
use crate::range::ByteRange;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use serde::Deserialize;
use slice_cache::CacheEngine;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state: the cache engine and the origin client,
/// both supplied at service construction time.
pub struct AppState {
    pub cache: Arc<CacheEngine>,
    pub origin: OriginClient,
}

/// Build the proxy router: the single endpoint, bound to `/`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(proxy_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    /// Source URL, possibly quoted.
    pub s: Option<String>,
    /// Wire byte range `"<start>-<end>"`, possibly quoted.
    pub range: Option<String>,
}

/// Serve a byte range of `s` from cache, fall back to a ranged origin
/// fetch on miss, or pass the whole body through when no range is given.
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProxyParams>,
) -> Response {
    let started = Instant::now();
    match serve(&state, params).await {
        Ok(response) => {
            metrics::counter!("proxy_requests_total", "outcome" => "ok").increment(1);
            metrics::histogram!("proxy_request_seconds").record(started.elapsed().as_secs_f64());
            response
        }
        Err(err) => {
            metrics::counter!("proxy_requests_total", "outcome" => "error").increment(1);
            err.into_response()
        }
    }
}

async fn serve(state: &AppState, params: ProxyParams) -> Result<Response, ProxyError> {
    // The range parameter is validated before anything else, even the
    // presence of the source.
    let range = match params.range.as_deref() {
        Some(wire) => Some(ByteRange::parse(wire)?),
        None => None,
    };

    let source = params.s.as_deref().ok_or(ProxyError::MissingSource)?;
    let source = source.trim_matches('"');
    let uri: Uri = source.parse().map_err(|_| ProxyError::InvalidSource)?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(ProxyError::InvalidSource);
    }

    let probe = state.origin.probe(&uri).await?;

    let Some(range) = range else {
        // Non-ranged pass-through; the cache is never consulted.
        let body = state.origin.fetch_full(&uri).await?;
        return Ok(respond(&probe, body, None));
    };

    if let Ok(bytes) = state.cache.get(range.start, range.end, source) {
        tracing::debug!(source, start = range.start, end = range.end, "cache hit");
        metrics::counter!("proxy_cache_results_total", "result" => "hit").increment(1);
        return Ok(respond(&probe, bytes, Some("HIT")));
    }

    // A miss is the only way get fails; fall back to the origin.
    tracing::debug!(source, start = range.start, end = range.end, "cache miss");
    metrics::counter!("proxy_cache_results_total", "result" => "miss").increment(1);

    let bytes = state.origin.fetch_range(&uri, &range).await?;

    // Detached population: never awaited by the response path, and its
    // outcome (including any eviction) is invisible to this request.
    let cache = Arc::clone(&state.cache);
    let payload = bytes.clone();
    let source_key = source.to_string();
    tokio::spawn(async move {
        if let Err(err) = cache.put(range.start, range.end, &payload, &source_key) {
            tracing::warn!(error = %err, source = %source_key, "cache population failed");
        }
    });

    Ok(respond(&probe, bytes, Some("MISS")))
}

fn respond(probe: &ProbeInfo, body: Bytes, cache_status: Option<&'static str>) -> Response {
    let mut response = Response::builder().status(StatusCode::OK);

    if let Some(ct) = &probe.content_type {
        response = response.header(header::CONTENT_TYPE, ct.clone());
    }
    if let Some(status) = cache_status {
        response = response.header("X-Cache", status);
    }

    response.body(Body::from(body)).unwrap()
}
