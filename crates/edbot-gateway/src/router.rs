use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use edbot_llm::LlmProvider;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;

use super::handlers::{
    about_handler, create_session_handler, delete_session_handler, get_session_handler,
    health_handler, index_handler, reset_handler, submit_handler,
};
use super::server::AppState;

const MAX_TRACKED_CLIENTS: usize = 10_000;
const RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct AuthConfig {
    token: Option<String>,
}

/// Fixed-window request counter per client IP.
#[derive(Clone)]
struct RateLimiter {
    limit: u32,
    windows: Arc<Mutex<HashMap<IpAddr, (u32, Instant)>>>,
}

impl RateLimiter {
    fn new(limit: u32) -> Self {
        Self {
            limit,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request from `ip`; `false` once the window is exhausted.
    async fn allow(&self, ip: IpAddr, now: Instant) -> bool {
        if self.limit == 0 {
            return true;
        }

        let mut windows = self.windows.lock().await;
        if windows.len() >= MAX_TRACKED_CLIENTS && !windows.contains_key(&ip) {
            windows.retain(|_, (_, started)| now.duration_since(*started) < RATE_WINDOW);
        }

        let (count, started) = windows.entry(ip).or_insert((0, now));
        if now.duration_since(*started) >= RATE_WINDOW {
            *count = 0;
            *started = now;
        }
        *count += 1;
        *count <= self.limit
    }
}

pub(crate) fn build_router<P: LlmProvider + 'static>(
    state: AppState<P>,
    auth_token: Option<String>,
    rate_limit: u32,
    max_body_size: usize,
) -> Router {
    let api = Router::new()
        .route("/api/about", get(about_handler))
        .route("/api/sessions", post(create_session_handler::<P>))
        .route(
            "/api/sessions/{id}",
            get(get_session_handler::<P>).delete(delete_session_handler::<P>),
        )
        .route("/api/sessions/{id}/messages", post(submit_handler::<P>))
        .route("/api/sessions/{id}/reset", post(reset_handler::<P>))
        .layer(middleware::from_fn_with_state(
            RateLimiter::new(rate_limit),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            AuthConfig { token: auth_token },
            auth_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler::<P>))
        .merge(api)
        .with_state(state)
}

fn bearer_token(req: &Request<Body>) -> &str {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
}

/// Compare digests so neither timing nor token length leaks.
fn tokens_match(given: &str, expected: &str) -> bool {
    let given = blake3::hash(given.as_bytes());
    let expected = blake3::hash(expected.as_bytes());
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

async fn auth_middleware(
    State(cfg): State<AuthConfig>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(expected) = &cfg.token
        && !tokens_match(bearer_token(&req), expected)
    {
        tracing::debug!(path = %req.uri().path(), "rejected request without valid bearer token");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    next.run(req).await
}

async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ci| ci.0.ip());

    if !limiter.allow(ip, Instant::now()).await {
        tracing::debug!(%ip, "rate limit exceeded");
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }

    next.run(req).await
}
