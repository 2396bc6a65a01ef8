//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch requests: cache lookup on GET, origin forwarding otherwise
//! - Capture proxied GET responses for cache population
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::Cache;
use crate::config::Config;
use crate::http::capture::CaptureBody;
use crate::observability::metrics;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Hop-by-hop headers are connection-level and must not be replayed from the
/// cache or forwarded from the origin response. Headers nominated by the
/// `Connection` header value are hop-by-hop as well (RFC 7230 section 6.1).
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn Cache>,
    pub client: reqwest::Client,
    /// Origin base URL without a trailing slash.
    pub origin_base: String,
    pub ttl: Duration,
}

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and cache store.
    pub fn new(config: Config, cache: Arc<dyn Cache>) -> Result<Self, reqwest::Error> {
        // Redirects belong to the client: a 3xx from the origin is forwarded
        // verbatim, never chased by the proxy.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let state = AppState {
            cache,
            client,
            origin_base: config.origin_url.trim_end_matches('/').to_string(),
            ttl: config.ttl(),
        };

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            // Layers run outermost-last on this chain: the request ID is set
            // first, visible to tracing, and propagated onto the response.
            .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
///
/// GET requests go through the cache: a hit is served verbatim without
/// contacting the origin; a miss is forwarded with the response teed into
/// the cache. Any other method is forwarded untouched and never reads or
/// writes the cache.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let method_str = method.to_string();

    // Cache key: the URL exactly as received, no normalization. Byte-distinct
    // URLs are distinct entries.
    let cache_key = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    tracing::debug!(
        method = %method,
        key = %cache_key,
        "Received request"
    );

    if method != Method::GET {
        let response = forward(&state, request, &cache_key, None).await;
        metrics::record_request(&method_str, response.status().as_u16(), start_time);
        return response;
    }

    if let Some(entry) = state.cache.get(&cache_key).await {
        tracing::debug!(key = %cache_key, "cache hit");
        metrics::record_cache_hit();
        metrics::record_request(&method_str, StatusCode::OK.as_u16(), start_time);

        let mut response = (StatusCode::OK, Body::from(entry.body)).into_response();
        *response.headers_mut() = entry.headers;
        return response;
    }

    tracing::debug!(key = %cache_key, "cache miss, forwarding to origin");
    metrics::record_cache_miss();

    let capture = CaptureContext {
        cache: state.cache.clone(),
        key: cache_key.clone(),
        ttl: state.ttl,
    };
    let response = forward(&state, request, &cache_key, Some(capture)).await;
    metrics::record_request(&method_str, response.status().as_u16(), start_time);
    response
}

/// What a captured response needs to become a cache entry.
struct CaptureContext {
    cache: Arc<dyn Cache>,
    key: String,
    ttl: Duration,
}

/// Forward the request to the origin, streaming the response back.
///
/// With a `CaptureContext` the response body is teed; when the origin has
/// finished streaming, the captured bytes and headers are committed to the
/// cache off the response path. Origin statuses pass through verbatim,
/// including errors; a transport failure becomes 502.
async fn forward(
    state: &AppState,
    request: Request,
    path_query: &str,
    capture: Option<CaptureContext>,
) -> Response {
    let (parts, body) = request.into_parts();

    let url = format!("{}{}", state.origin_base, path_query);
    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    // The client sets Host from the origin URL, and re-streamed bodies are
    // re-framed, so the inbound framing headers must not survive.
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    let mut upstream_request = state
        .client
        .request(parts.method.clone(), url.as_str())
        .headers(headers);
    // A streamed body would force chunked encoding; bodyless methods skip it.
    if parts.method != Method::GET && parts.method != Method::HEAD {
        upstream_request =
            upstream_request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }
    let upstream = upstream_request.send().await;

    let upstream = match upstream {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Upstream request failed");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };

    let status = upstream.status();
    let mut response_headers = upstream.headers().clone();
    strip_hop_by_hop(&mut response_headers);

    let body = Body::from_stream(upstream.bytes_stream());
    let body = match capture {
        Some(ctx) => {
            let headers = response_headers.clone();
            CaptureBody::wrap(body, move |bytes| {
                // Committed in a spawned task so the client-visible response
                // path never waits on the cache write.
                tokio::spawn(async move {
                    ctx.cache.set(&ctx.key, bytes, headers, ctx.ttl).await;
                });
            })
        }
        None => body,
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    response
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Collect Connection-nominated names before removing Connection itself.
    let nominated: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();
    for name in nominated {
        headers.remove(name);
    }
    for name in &HOP_BY_HOP {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn strips_the_fixed_hop_by_hop_set() {
        let mut headers = header_map(&[
            ("connection", "close"),
            ("keep-alive", "timeout=5"),
            ("transfer-encoding", "chunked"),
            ("upgrade", "h2c"),
            ("content-type", "text/plain"),
        ]);
        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
    }

    #[test]
    fn strips_headers_nominated_by_connection() {
        let mut headers = header_map(&[
            ("connection", "x-tracking-token, x-session"),
            ("x-tracking-token", "abc"),
            ("x-session", "123"),
            ("x-kept", "yes"),
        ]);
        strip_hop_by_hop(&mut headers);
        assert!(headers.get("x-tracking-token").is_none());
        assert!(headers.get("x-session").is_none());
        assert_eq!(headers.get("x-kept").unwrap(), "yes");
    }
}
