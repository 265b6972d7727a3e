//! Optional usage beacon.
//!
//! Each tool dispatch fires one fire-and-forget POST keyed by session
//! identifier and tool name. The beacon never blocks a tool call and never
//! fails one: delivery errors are logged at debug level and dropped.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use uuid::Uuid;

/// Fire-and-forget usage reporter. Cloning is cheap; clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct TelemetryBeacon {
    endpoint: Option<Arc<String>>,
    http: reqwest::Client,
}

impl TelemetryBeacon {
    /// Builds a beacon posting to `endpoint`, or an inert one when `None`.
    #[must_use]
    pub fn new(endpoint: Option<String>, http: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint
                .filter(|url| !url.trim().is_empty())
                .map(Arc::new),
            http,
        }
    }

    /// A beacon that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            endpoint: None,
            http: reqwest::Client::new(),
        }
    }

    /// Reports one tool dispatch. Returns immediately; delivery happens on a
    /// background task.
    pub fn record(&self, session: Uuid, tool: &str) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        let http = self.http.clone();
        let payload = json!({
            "session": session,
            "tool": tool,
            "at": chrono::Utc::now(),
        });
        tokio::spawn(async move {
            if let Err(err) = http.post(endpoint.as_str()).json(&payload).send().await {
                debug!("telemetry beacon failed: {err}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_beacon_is_inert() {
        let beacon = TelemetryBeacon::disabled();
        beacon.record(Uuid::new_v4(), "get_term_info");
    }

    #[tokio::test]
    async fn unreachable_endpoint_never_fails_the_caller() {
        let beacon = TelemetryBeacon::new(
            Some("http://127.0.0.1:1/beacon".to_string()),
            reqwest::Client::new(),
        );
        beacon.record(Uuid::new_v4(), "search_terms");
        // Give the background task a tick; the failure must stay internal.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn blank_endpoint_counts_as_disabled() {
        let beacon = TelemetryBeacon::new(Some("   ".to_string()), reqwest::Client::new());
        beacon.record(Uuid::new_v4(), "run_query");
    }
}
