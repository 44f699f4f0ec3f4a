use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

/// Windowed per-key counter. Counts reset when a key's window elapses;
/// state lives in process memory and disappears on restart.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u64,
    window_duration: Duration,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u64,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u64, window_duration_secs: u64) -> Self {
        Self {
            max_requests,
            window_duration: Duration::from_secs(window_duration_secs),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns false once the key has exhausted its window.
    pub fn check_rate_limit(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();

        let allowed = match entries.get_mut(key) {
            Some(entry) => {
                if now.duration_since(entry.window_start) < self.window_duration {
                    if entry.count >= self.max_requests {
                        false
                    } else {
                        entry.count += 1;
                        true
                    }
                } else {
                    entry.count = 1;
                    entry.window_start = now;
                    true
                }
            }
            None => {
                entries.insert(
                    key.to_string(),
                    RateLimitEntry {
                        count: 1,
                        window_start: now,
                    },
                );
                true
            }
        };

        entries.retain(|_, entry| now.duration_since(entry.window_start) < self.window_duration * 2);
        allowed
    }
}

/// The four limiter scopes the API uses, constructed once at startup.
#[derive(Clone)]
pub struct RateLimits {
    /// 100 requests / 15 minutes across the whole API.
    pub general: Arc<RateLimiter>,
    /// 10 requests / hour on register/login.
    pub auth: Arc<RateLimiter>,
    /// 30 requests / hour on AI-generation routes.
    pub ai: Arc<RateLimiter>,
    /// 20 requests / day on quote submission.
    pub quotes: Arc<RateLimiter>,
}

impl RateLimits {
    pub fn standard() -> Self {
        Self {
            general: Arc::new(RateLimiter::new(100, 15 * 60)),
            auth: Arc::new(RateLimiter::new(10, 60 * 60)),
            ai: Arc::new(RateLimiter::new(30, 60 * 60)),
            quotes: Arc::new(RateLimiter::new(20, 24 * 60 * 60)),
        }
    }
}

fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Attach with `middleware::from_fn_with_state(limiter, rate_limit_middleware)`.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = client_ip(&request);
    if !limiter.check_rate_limit(&ip) {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(request).await)
}

/// Tags every request with a fresh id and wraps the handler in a tracing
/// span carrying method and uri.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(request_id.clone());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri()
    );
    async move { next.run(request).await }.instrument(span).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_plus_first_request_in_window_is_rejected() {
        let limiter = RateLimiter::new(3, 3600);
        for _ in 0..3 {
            assert!(limiter.check_rate_limit("10.0.0.1"));
        }
        assert!(!limiter.check_rate_limit("10.0.0.1"));
    }

    #[test]
    fn keys_are_limited_independently() {
        let limiter = RateLimiter::new(1, 3600);
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(!limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.2"));
    }

    #[test]
    fn window_elapse_resets_the_counter() {
        let limiter = RateLimiter::new(1, 0);
        assert!(limiter.check_rate_limit("10.0.0.1"));
        // zero-length window: the next call starts a fresh one
        assert!(limiter.check_rate_limit("10.0.0.1"));
    }
}
