//! Request throttling for anonymous clients.
//!
//! [`ThrottleGate`] keeps a fixed-window counter per client identity. The
//! counter map is the only mutable state the gate owns and sits behind one
//! mutex, so increments are atomic per key: two concurrent requests can
//! never undercount a client into a permanent lockout. A request that slips
//! through while another holds the lock at the window edge may over-admit
//! by one, which is acceptable.
//!
//! Rejections are always surfaced to the caller as a rate-limit problem
//! response with retry guidance, never silently dropped.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::middleware::extract_or_generate_request_id;
use crate::problem::ProblemDetails;
use crate::state::AppState;

/// Default requests admitted per identity per window.
pub const DEFAULT_THROTTLE_LIMIT: u32 = 100;

/// Default window length.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_secs(3600);

/// Counter entries beyond this trigger a prune of expired windows.
const PRUNE_THRESHOLD: usize = 4096;

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request admitted.
    Allowed,
    /// Request rejected; the client may retry after this long.
    Throttled { retry_after: Duration },
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by anonymous client identity.
pub struct ThrottleGate {
    limit: u32,
    window: Duration,
    counters: Mutex<HashMap<String, Window>>,
}

impl ThrottleGate {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Check whether a request from `identity` is admitted right now.
    pub fn admit(&self, identity: &str) -> Decision {
        self.admit_at(identity, Instant::now())
    }

    fn admit_at(&self, identity: &str, now: Instant) -> Decision {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if counters.len() > PRUNE_THRESHOLD {
            let window = self.window;
            counters.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = counters.entry(identity.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.limit {
            let elapsed = now.duration_since(entry.started);
            Decision::Throttled {
                retry_after: self.window.saturating_sub(elapsed),
            }
        } else {
            entry.count += 1;
            Decision::Allowed
        }
    }
}

impl std::fmt::Debug for ThrottleGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottleGate")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .finish()
    }
}

/// Derive the anonymous client identity for a request.
///
/// Prefers the first hop of `X-Forwarded-For` (set by the fronting proxy),
/// then the peer socket address, then a shared fallback bucket.
pub fn client_identity(headers: &HeaderMap, extensions: &http::Extensions) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    if let Some(addr) = extensions.get::<axum::extract::ConnectInfo<SocketAddr>>() {
        return addr.0.ip().to_string();
    }

    "anonymous".to_string()
}

/// Axum middleware applying the throttle gate to API routes.
pub async fn throttle_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let identity = client_identity(request.headers(), request.extensions());

    match state.throttle().admit(&identity) {
        Decision::Allowed => next.run(request).await,
        Decision::Throttled { retry_after } => {
            let request_id = extract_or_generate_request_id(request.headers());
            warn!(
                request_id = %request_id,
                identity = %identity,
                "request throttled"
            );
            crate::metrics::record_request_throttled();
            ProblemDetails::rate_limited(retry_after.as_secs(), request_id.as_str())
                .into_response()
        }
    }
}
