use axum::body::Body;
use axum::http::{header, HeaderMap, Response, StatusCode};
use axum::routing::get;
use axum::Router;
use rand::Rng;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// 1 MB of a deterministic byte pattern, so range responses are easy to
/// verify by eye (byte i is `i % 251`).
const BODY_LEN: usize = 1_048_576;

fn pattern_byte(i: usize) -> u8 {
    (i % 251) as u8
}

async fn data(headers: HeaderMap) -> Response<Body> {
    // Simulate origin latency (5-20ms)
    let delay = rand::thread_rng().gen_range(5..=20);
    tokio::time::sleep(Duration::from_millis(delay)).await;

    if let Some(spec) = headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        return match parse_range(spec, BODY_LEN) {
            Some((start, last)) => {
                tracing::debug!(start, last, "serving partial content");
                let body: Vec<u8> = (start..=last).map(pattern_byte).collect();
                Response::builder()
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(header::ACCEPT_RANGES, "bytes")
                    .header(header::CONTENT_TYPE, "application/octet-stream")
                    .header(
                        header::CONTENT_RANGE,
                        format!("bytes {start}-{last}/{BODY_LEN}"),
                    )
                    .body(Body::from(body))
                    .unwrap()
            }
            None => Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_RANGE, format!("bytes */{BODY_LEN}"))
                .body(Body::empty())
                .unwrap(),
        };
    }

    let body: Vec<u8> = (0..BODY_LEN).map(pattern_byte).collect();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(body))
        .unwrap()
}

/// Parse `bytes=<start>-<last>` against the body length.
fn parse_range(spec: &str, len: usize) -> Option<(usize, usize)> {
    let rest = spec.strip_prefix("bytes=")?;
    let (a, b) = rest.split_once('-')?;
    let start: usize = a.parse().ok()?;
    let last: usize = b.parse().ok()?;
    (start <= last && last < len).then_some((start, last))
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = Router::new()
        .route("/data", get(data))
        .route("/health", get(health));

    let addr = "0.0.0.0:3000";
    tracing::info!(addr, "demo origin starting");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
