//! Streamable HTTP gateway for the MCP protocol.
//!
//! One route carries the whole protocol:
//! POST delivers JSON-RPC messages (an `initialize` request with no session
//! header establishes a session), GET either serves the documentation page to
//! browsers or attaches the session's SSE event stream, and DELETE terminates
//! a session. Sessions are keyed by the `mcp-session-id` header; the
//! identifier is generated here and never accepted from clients at creation.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::VfbMcp;
use crate::session::{SessionError, SessionHandle, SessionRegistry};

/// Header carrying the session identifier once a session is established.
pub const SESSION_HEADER: &str = "mcp-session-id";

const INVALID_SESSION: i64 = -32000;
const INVALID_REQUEST: i64 = -32600;
const INTERNAL_ERROR: i64 = -32603;
const PARSE_ERROR: i64 = -32700;

/// Configuration for the streamable HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    /// Accepted `Host` header values; empty allows any host.
    pub allowed_hosts: Vec<String>,
    /// Bound on waiting for a session's server to answer one request.
    pub request_timeout: Duration,
    /// Idle session lifetime; `None` disables eviction.
    pub session_ttl: Option<Duration>,
    pub sweep_interval: Duration,
    pub sse_keep_alive: Duration,
}

impl GatewayConfig {
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            allowed_hosts: Vec::new(),
            request_timeout: Duration::from_secs(60),
            session_ttl: Some(Duration::from_secs(3600)),
            sweep_interval: Duration::from_secs(60),
            sse_keep_alive: Duration::from_secs(15),
        }
    }

    #[must_use]
    pub fn with_allowed_hosts(mut self, allowed_hosts: Vec<String>) -> Self {
        self.allowed_hosts = allowed_hosts;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, session_ttl: Option<Duration>) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    #[must_use]
    pub fn with_sse_keep_alive(mut self, sse_keep_alive: Duration) -> Self {
        self.sse_keep_alive = sse_keep_alive;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new("0.0.0.0:3000".parse().expect("valid default address"))
    }
}

/// Shared gateway state: the session table plus the per-session server
/// factory.
#[derive(Clone)]
pub(crate) struct GatewayState {
    pub(crate) registry: SessionRegistry,
    pub(crate) service_factory: Arc<dyn Fn(Uuid) -> VfbMcp + Send + Sync>,
    pub(crate) docs_html: Arc<String>,
    pub(crate) allowed_hosts: Arc<[String]>,
    pub(crate) sse_keep_alive: Duration,
}

pub(crate) fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/",
            get(handle_get).post(handle_post).delete(handle_delete),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

enum SessionKey {
    Absent,
    Invalid,
    Key(Uuid),
}

fn session_key(headers: &HeaderMap) -> SessionKey {
    match headers.get(SESSION_HEADER) {
        None => SessionKey::Absent,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map_or(SessionKey::Invalid, SessionKey::Key),
    }
}

fn is_initialize(message: &Value) -> bool {
    message.get("method").and_then(Value::as_str) == Some("initialize")
}

fn protocol_error(status: StatusCode, code: i64, message: &str) -> Response {
    let payload = json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
        "id": null,
    });
    (status, Json(payload)).into_response()
}

fn check_host(state: &GatewayState, headers: &HeaderMap) -> Result<(), Response> {
    if state.allowed_hosts.is_empty() {
        return Ok(());
    }
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let bare = host.split(':').next().unwrap_or_default();
    if state
        .allowed_hosts
        .iter()
        .any(|allowed| allowed == host || allowed == bare)
    {
        Ok(())
    } else {
        warn!(host, "rejecting request from disallowed host");
        Err((StatusCode::FORBIDDEN, "Forbidden: host not allowed").into_response())
    }
}

async fn handle_post(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Err(denied) = check_host(&state, &headers) {
        return denied;
    }

    let Ok(message) = serde_json::from_str::<Value>(&body) else {
        return protocol_error(StatusCode::BAD_REQUEST, PARSE_ERROR, "Parse error");
    };
    if !message.is_object() {
        return protocol_error(
            StatusCode::BAD_REQUEST,
            INVALID_REQUEST,
            "Invalid Request: expected a single JSON-RPC message",
        );
    }

    match session_key(&headers) {
        SessionKey::Key(id) => match state.registry.lookup(&id).await {
            Some(handle) => dispatch_to_session(&handle, message).await,
            None => protocol_error(
                StatusCode::BAD_REQUEST,
                INVALID_SESSION,
                "Bad Request: No valid session ID provided",
            ),
        },
        SessionKey::Absent if is_initialize(&message) => initialize_session(&state, message).await,
        SessionKey::Absent | SessionKey::Invalid => protocol_error(
            StatusCode::BAD_REQUEST,
            INVALID_SESSION,
            "Bad Request: No valid session ID provided",
        ),
    }
}

async fn initialize_session(state: &GatewayState, message: Value) -> Response {
    let factory = Arc::clone(&state.service_factory);
    let handle = state.registry.create(|id| factory(id)).await;

    match handle.request(message).await {
        Ok(reply) => {
            // The server expects `notifications/initialized` straight after
            // the handshake reply; synthesize it so clients that delay or
            // skip theirs cannot wedge the session.
            if handle.mark_initialized() {
                let _ = handle
                    .notify(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                    .await;
            }
            info!(session = %handle.id(), "session initialized");

            let mut response = (StatusCode::OK, Json(reply)).into_response();
            if let Ok(value) = HeaderValue::from_str(&handle.id().to_string()) {
                response.headers_mut().insert(SESSION_HEADER, value);
            }
            response
        }
        Err(err) => {
            warn!(session = %handle.id(), "initialization handshake failed: {err}");
            state.registry.remove(&handle.id()).await;
            protocol_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR,
                "Internal server error",
            )
        }
    }
}

async fn dispatch_to_session(handle: &SessionHandle, message: Value) -> Response {
    let method = message.get("method").and_then(Value::as_str);
    let has_id = message.get("id").filter(|v| !v.is_null()).is_some();

    if method == Some("notifications/initialized") {
        // The gateway already synthesized this during the handshake; forward
        // only a first copy and swallow the rest.
        if handle.mark_initialized() {
            let _ = handle.notify(message).await;
        }
        return StatusCode::ACCEPTED.into_response();
    }

    if method.is_some() && has_id {
        match handle.request(message).await {
            Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
            Err(SessionError::MissingId) => {
                protocol_error(StatusCode::BAD_REQUEST, INVALID_REQUEST, "Invalid Request")
            }
            Err(err) => {
                warn!(session = %handle.id(), "session request failed: {err}");
                protocol_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR,
                    "Internal server error",
                )
            }
        }
    } else {
        // Notification or client response: forward without awaiting a reply.
        match handle.notify(message).await {
            Ok(()) => StatusCode::ACCEPTED.into_response(),
            Err(err) => {
                warn!(session = %handle.id(), "session notify failed: {err}");
                protocol_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR,
                    "Internal server error",
                )
            }
        }
    }
}

async fn handle_get(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    if let Err(denied) = check_host(&state, &headers) {
        return denied;
    }

    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));
    if wants_html {
        return Html(state.docs_html.as_ref().clone()).into_response();
    }

    let SessionKey::Key(id) = session_key(&headers) else {
        return protocol_error(
            StatusCode::BAD_REQUEST,
            INVALID_SESSION,
            "Bad Request: Invalid or missing session ID",
        );
    };
    let Some(handle) = state.registry.lookup(&id).await else {
        return protocol_error(
            StatusCode::BAD_REQUEST,
            INVALID_SESSION,
            "Bad Request: Invalid or missing session ID",
        );
    };

    match handle.take_event_stream().await {
        Some(events) => {
            info!(session = %handle.id(), "event stream attached");
            let stream = ReceiverStream::new(events)
                .map(|message| Ok::<Event, Infallible>(Event::default().data(message.to_string())));
            Sse::new(stream)
                .keep_alive(KeepAlive::new().interval(state.sse_keep_alive))
                .into_response()
        }
        None => protocol_error(
            StatusCode::CONFLICT,
            INVALID_SESSION,
            "Conflict: event stream already established for this session",
        ),
    }
}

async fn handle_delete(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    if let Err(denied) = check_host(&state, &headers) {
        return denied;
    }

    let SessionKey::Key(id) = session_key(&headers) else {
        return protocol_error(
            StatusCode::BAD_REQUEST,
            INVALID_SESSION,
            "Bad Request: Invalid or missing session ID",
        );
    };

    if state.registry.remove(&id).await {
        StatusCode::OK.into_response()
    } else {
        protocol_error(
            StatusCode::BAD_REQUEST,
            INVALID_SESSION,
            "Bad Request: Invalid or missing session ID",
        )
    }
}
