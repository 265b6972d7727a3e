//! Session tracking for the streamable HTTP gateway.
//!
//! Each session binds a fresh MCP server instance to an in-process duplex
//! transport speaking line-delimited JSON-RPC, the same framing the stdio
//! transport uses on process pipes. The session handle owns that transport:
//! it correlates request/response pairs by JSON-RPC id and fans everything
//! the server initiates out to the session's event stream.
//!
//! The registry is the only shared mutable state in the gateway. All access
//! goes through `create`/`lookup`/`remove`; `remove` is idempotent, and a
//! removed identifier is permanently invalid.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use rmcp::serve_server;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::VfbMcp;

const DUPLEX_BUFFER: usize = 64 * 1024;
const OUTBOUND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 64;

/// Settings for the session registry.
#[derive(Debug, Clone)]
pub struct SessionRegistryConfig {
    pub ttl: Option<Duration>,
    pub sweep_interval: Duration,
    pub request_timeout: Duration,
}

impl SessionRegistryConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ttl: None,
            sweep_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(60),
        }
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub const fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for SessionRegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure while talking to a session's server instance.
#[derive(Debug)]
pub enum SessionError {
    /// The message has no JSON-RPC id to correlate a response with.
    MissingId,
    /// The session's transport is gone (removed or torn down mid-flight).
    Closed,
    /// No response arrived within the correlation timeout.
    Timeout,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => write!(f, "message has no request id"),
            Self::Closed => write!(f, "session transport closed"),
            Self::Timeout => write!(f, "session request timed out"),
        }
    }
}

impl Error for SessionError {}

/// An active session: the per-session server instance plus the gateway side
/// of its transport.
pub struct SessionHandle {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_used_ms: AtomicU64,
    request_timeout: Duration,
    to_server: mpsc::Sender<String>,
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<Value>>>>,
    events: Mutex<Option<mpsc::Receiver<Value>>>,
    initialized_forwarded: AtomicBool,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionHandle {
    fn spawn(id: Uuid, service: VfbMcp, request_timeout: Duration) -> Arc<Self> {
        let (gateway_io, server_io) = tokio::io::duplex(DUPLEX_BUFFER);
        let (server_read, server_write) = tokio::io::split(server_io);
        let (gateway_read, mut gateway_write) = tokio::io::split(gateway_io);

        let serve_task = tokio::spawn(async move {
            match serve_server(service, (server_read, server_write)).await {
                Ok(running) => {
                    if let Err(err) = running.waiting().await {
                        debug!(session = %id, "session server exited: {err}");
                    }
                }
                Err(err) => debug!(session = %id, "session handshake failed: {err}"),
            }
        });

        let (to_server, mut outbound) = mpsc::channel::<String>(OUTBOUND_BUFFER);
        let writer_task = tokio::spawn(async move {
            while let Some(line) = outbound.recv().await {
                if gateway_write.write_all(line.as_bytes()).await.is_err()
                    || gateway_write.write_all(b"\n").await.is_err()
                    || gateway_write.flush().await.is_err()
                {
                    break;
                }
            }
        });

        let pending: Arc<Mutex<HashMap<String, oneshot::Sender<Value>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (events_tx, events_rx) = mpsc::channel::<Value>(EVENT_BUFFER);
        let pump_pending = Arc::clone(&pending);
        let pump_task = tokio::spawn(async move {
            let mut lines = BufReader::new(gateway_read).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let Ok(value) = serde_json::from_str::<Value>(&line) else {
                    debug!(session = %id, "discarding unparseable server line");
                    continue;
                };

                let is_reply = value.get("result").is_some() || value.get("error").is_some();
                let reply_key = value
                    .get("id")
                    .filter(|v| !v.is_null())
                    .map(ToString::to_string);
                if is_reply {
                    if let Some(key) = reply_key {
                        if let Some(responder) = pump_pending.lock().await.remove(&key) {
                            // A dropped receiver means the caller is gone;
                            // the reply is discarded, not redirected.
                            let _ = responder.send(value);
                        }
                        continue;
                    }
                }

                // Server-initiated request or notification.
                if events_tx.try_send(value).is_err() {
                    debug!(session = %id, "no live event stream; dropping server push");
                }
            }
        });

        Arc::new(Self {
            id,
            created_at: Utc::now(),
            last_used_ms: AtomicU64::new(now_ms()),
            request_timeout,
            to_server,
            pending,
            events: Mutex::new(Some(events_rx)),
            initialized_forwarded: AtomicBool::new(false),
            tasks: vec![serve_task, writer_task, pump_task],
        })
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Sends a request to the session's server and awaits the correlated
    /// response.
    pub async fn request(&self, message: Value) -> Result<Value, SessionError> {
        self.touch();
        let key = message
            .get("id")
            .filter(|v| !v.is_null())
            .map(ToString::to_string)
            .ok_or(SessionError::MissingId)?;

        let (responder, reply) = oneshot::channel();
        self.pending.lock().await.insert(key.clone(), responder);

        if self.to_server.send(message.to_string()).await.is_err() {
            self.pending.lock().await.remove(&key);
            return Err(SessionError::Closed);
        }

        match tokio::time::timeout(self.request_timeout, reply).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(SessionError::Closed),
            Err(_) => {
                self.pending.lock().await.remove(&key);
                Err(SessionError::Timeout)
            }
        }
    }

    /// Forwards a notification or client response; nothing is awaited.
    pub async fn notify(&self, message: Value) -> Result<(), SessionError> {
        self.touch();
        self.to_server
            .send(message.to_string())
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Flags the `notifications/initialized` handshake step as forwarded.
    /// Returns true for the caller that gets to forward it; later callers
    /// must swallow their copy.
    pub fn mark_initialized(&self) -> bool {
        !self.initialized_forwarded.swap(true, Ordering::SeqCst)
    }

    /// Takes the session's server-push stream. Only one live stream exists
    /// per session.
    pub async fn take_event_stream(&self) -> Option<mpsc::Receiver<Value>> {
        self.events.lock().await.take()
    }

    fn touch(&self) {
        self.last_used_ms.store(now_ms(), Ordering::Relaxed);
    }

    fn idle_for(&self, now_ms: u64) -> Duration {
        let last = self.last_used_ms.load(Ordering::Relaxed);
        Duration::from_millis(now_ms.saturating_sub(last))
    }

    /// Tears the transport down: in-flight requests fail promptly and their
    /// results are discarded.
    async fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
        self.pending.lock().await.clear();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Registry of active sessions keyed by identifier.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<SessionRegistryInner>,
}

struct SessionRegistryInner {
    entries: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
    config: SessionRegistryConfig,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(config: SessionRegistryConfig) -> Self {
        Self {
            inner: Arc::new(SessionRegistryInner {
                entries: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Generates a fresh session identifier, binds a server instance to it,
    /// and registers the handle.
    pub async fn create<F>(&self, make_service: F) -> Arc<SessionHandle>
    where
        F: FnOnce(Uuid) -> VfbMcp,
    {
        let id = Uuid::new_v4();
        let handle = SessionHandle::spawn(id, make_service(id), self.inner.config.request_timeout);
        self.inner
            .entries
            .write()
            .await
            .insert(id, Arc::clone(&handle));
        info!(session = %id, created_at = %handle.created_at(), "session registered");
        handle
    }

    /// Looks a session up, refreshing its idle clock.
    pub async fn lookup(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        let handle = self.inner.entries.read().await.get(id).cloned();
        if let Some(handle) = &handle {
            handle.touch();
        }
        handle
    }

    /// Removes and tears down a session. Removing an absent identifier is a
    /// no-op; the call reports whether anything was removed.
    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.inner.entries.write().await.remove(id);
        match removed {
            Some(handle) => {
                handle.shutdown().await;
                info!(session = %id, "session closed");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Evicts sessions idle past the configured TTL.
    pub async fn evict_idle(&self) -> usize {
        let Some(ttl) = self.inner.config.ttl else {
            return 0;
        };
        let now = now_ms();
        let mut map = self.inner.entries.write().await;
        let expired: Vec<Uuid> = map
            .iter()
            .filter(|(_, handle)| handle.idle_for(now) > ttl)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            if let Some(handle) = map.remove(id) {
                handle.shutdown().await;
                info!(session = %id, "idle session evicted");
            }
        }
        expired.len()
    }

    /// Starts the idle-eviction sweeper when a TTL is configured.
    pub fn spawn_sweeper(self) -> Option<JoinHandle<()>> {
        let _ttl = self.inner.config.ttl?;
        let interval = self.inner.config.sweep_interval;
        let registry = self;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let _ = registry.evict_idle().await;
            }
        }))
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
