use crate::error::ProxyError;
use crate::range::ByteRange;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, Response, StatusCode, Uri};
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

pub type HttpClient = Client<HttpConnector, Body>;

/// What the capability probe learned about a source.
#[derive(Debug, Clone)]
pub struct ProbeInfo {
    pub content_type: Option<HeaderValue>,
}

/// Pooled client for origin traffic: capability probes, ranged fetches,
/// and full pass-through fetches. One instance is shared process-wide.
#[derive(Clone)]
pub struct OriginClient {
    client: HttpClient,
    /// `None` means requests block until the origin responds or errors.
    timeout: Option<Duration>,
}

impl OriginClient {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    /// HEAD the source and require an `Accept-Ranges: bytes` declaration
    /// (case-insensitive). Yields the origin's content type for mirroring.
    pub async fn probe(&self, source: &Uri) -> Result<ProbeInfo, ProxyError> {
        let req = Request::builder()
            .method(Method::HEAD)
            .uri(source.clone())
            .body(Body::empty())
            .map_err(|e| ProxyError::OriginTransport(e.to_string()))?;

        let resp = self
            .dispatch(req)
            .await
            .map_err(|_| ProxyError::UnreachableSource)?;

        match resp.headers().get(header::ACCEPT_RANGES) {
            Some(v) if v.as_bytes().eq_ignore_ascii_case(b"bytes") => {}
            _ => return Err(ProxyError::RangeUnsupported),
        }

        Ok(ProbeInfo {
            content_type: resp.headers().get(header::CONTENT_TYPE).cloned(),
        })
    }

    /// GET exactly the requested byte range. The origin must answer with
    /// partial content; anything else is a forwarded failure.
    pub async fn fetch_range(&self, source: &Uri, range: &ByteRange) -> Result<Bytes, ProxyError> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(source.clone())
            .header(header::RANGE, range.header_value())
            .body(Body::empty())
            .map_err(|e| ProxyError::OriginTransport(e.to_string()))?;

        let resp = self.dispatch(req).await?;
        if resp.status() != StatusCode::PARTIAL_CONTENT {
            return Err(ProxyError::UnexpectedOriginStatus(resp.status().as_u16()));
        }

        Self::collect(resp).await
    }

    /// Plain GET of the whole resource, for the non-ranged pass-through.
    pub async fn fetch_full(&self, source: &Uri) -> Result<Bytes, ProxyError> {
        let req = Request::builder()
            .method(Method::GET)
            .uri(source.clone())
            .body(Body::empty())
            .map_err(|e| ProxyError::OriginTransport(e.to_string()))?;

        let resp = self.dispatch(req).await?;
        Self::collect(resp).await
    }

    async fn dispatch(&self, req: Request<Body>) -> Result<Response<Incoming>, ProxyError> {
        let fut = self.client.request(req);
        let result = match self.timeout {
            Some(deadline) => tokio::time::timeout(deadline, fut)
                .await
                .map_err(|_| ProxyError::OriginTransport("origin deadline exceeded".into()))?,
            None => fut.await,
        };
        result.map_err(|e| ProxyError::OriginTransport(e.to_string()))
    }

    async fn collect(resp: Response<Incoming>) -> Result<Bytes, ProxyError> {
        resp.into_body()
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|e| ProxyError::OriginTransport(e.to_string()))
    }
}
