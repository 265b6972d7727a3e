//! Thin HTTP client over the VFB term/query service and Solr search index.
//!
//! Every call either returns the backend's raw JSON or a [`BackendError`]
//! describing the failure. No transport error escapes this boundary: callers
//! always receive a usable result.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::query::CompiledQuery;

/// Default base URL for term-info and graph-query lookups.
pub const DEFAULT_TERM_SERVICE_URL: &str = "https://v3-cached.virtualflybrain.org";

/// Default Solr select endpoint for the ontology core.
pub const DEFAULT_SOLR_URL: &str = "https://solr.virtualflybrain.org/solr/ontology/select";

/// Default bound on any single outbound backend call.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// A captured backend failure. The display form is what tool callers see.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {url} failed: {detail}")]
    Request { url: String, detail: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} was not valid JSON: {detail}")]
    Decode { url: String, detail: String },
}

/// Connection settings for [`VfbClient`].
#[derive(Debug, Clone)]
pub struct VfbClientConfig {
    pub term_service_url: String,
    pub solr_url: String,
    pub timeout: Duration,
}

impl Default for VfbClientConfig {
    fn default() -> Self {
        Self {
            term_service_url: DEFAULT_TERM_SERVICE_URL.to_string(),
            solr_url: DEFAULT_SOLR_URL.to_string(),
            timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }
}

/// Stateless client for the two VFB data backends.
#[derive(Debug, Clone)]
pub struct VfbClient {
    http: reqwest::Client,
    term_service_url: String,
    solr_url: String,
}

impl VfbClient {
    /// Builds a client with its own bounded connection pool.
    pub fn new(config: VfbClientConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_http(http, config))
    }

    /// Builds a client over an existing pool. The pool's timeout applies;
    /// the config timeout is only consulted by [`VfbClient::new`].
    #[must_use]
    pub fn with_http(http: reqwest::Client, config: VfbClientConfig) -> Self {
        Self {
            http,
            term_service_url: config.term_service_url.trim_end_matches('/').to_string(),
            solr_url: config.solr_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetches term information for a VFB identifier.
    pub async fn get_term_info(&self, id: &str) -> Result<Value, BackendError> {
        let url = format!("{}/get_term_info", self.term_service_url);
        self.get_json(&url, &[("id", id.to_string())]).await
    }

    /// Runs a predefined graph query for a VFB identifier.
    pub async fn run_query(&self, id: &str, query_type: &str) -> Result<Value, BackendError> {
        let url = format!("{}/run_query", self.term_service_url);
        self.get_json(
            &url,
            &[
                ("id", id.to_string()),
                ("query_type", query_type.to_string()),
            ],
        )
        .await
    }

    /// Executes a compiled facet search against the Solr index.
    pub async fn search(&self, compiled: &CompiledQuery) -> Result<Value, BackendError> {
        self.get_json(&self.solr_url, &compiled.params()).await
    }

    /// Lists the live `facets_annotation` vocabulary from the Solr index.
    pub async fn facet_values(&self) -> Result<Vec<String>, BackendError> {
        let params = [
            ("q", "*:*".to_string()),
            ("rows", "0".to_string()),
            ("wt", "json".to_string()),
            ("facet", "true".to_string()),
            ("facet.field", "facets_annotation".to_string()),
            ("facet.limit", "-1".to_string()),
        ];
        let value = self.get_json(&self.solr_url, &params).await?;

        // Solr returns facet fields as a flat [value, count, value, count, ..]
        // array.
        let entries = value
            .pointer("/facet_counts/facet_fields/facets_annotation")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(entries
            .iter()
            .step_by(2)
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, BackendError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|err| BackendError::Request {
                url: url.to_string(),
                detail: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| BackendError::Decode {
                url: url.to_string(),
                detail: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::{Query, RawQuery, State};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::query::FacetQuery;

    fn test_config(base: &str) -> VfbClientConfig {
        VfbClientConfig {
            term_service_url: base.to_string(),
            solr_url: format!("{base}/solr/ontology/select"),
            timeout: Duration::from_secs(2),
        }
    }

    async fn spawn_backend(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    #[derive(Clone)]
    struct EchoState {
        hits: Arc<AtomicUsize>,
    }

    async fn echo_params(
        State(state): State<EchoState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        state.hits.fetch_add(1, Ordering::SeqCst);
        Json(json!({ "params": params }))
    }

    #[tokio::test]
    async fn term_lookup_issues_a_single_parameterized_call() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/get_term_info", get(echo_params))
            .with_state(EchoState { hits: hits.clone() });
        let base = spawn_backend(app).await;

        let client = VfbClient::new(test_config(&base)).expect("client");
        let value = client
            .get_term_info("VFB_jrcv0i43")
            .await
            .expect("lookup succeeds");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(value["params"]["id"], "VFB_jrcv0i43");
    }

    #[tokio::test]
    async fn graph_query_carries_both_parameters() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/run_query", get(echo_params))
            .with_state(EchoState { hits: hits.clone() });
        let base = spawn_backend(app).await;

        let client = VfbClient::new(test_config(&base)).expect("client");
        let value = client
            .run_query("VFB_00101567", "PaintedDomains")
            .await
            .expect("query succeeds");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(value["params"]["id"], "VFB_00101567");
        assert_eq!(value["params"]["query_type"], "PaintedDomains");
    }

    async fn echo_raw(RawQuery(raw): RawQuery) -> Json<Value> {
        Json(json!({ "raw": raw.unwrap_or_default() }))
    }

    #[tokio::test]
    async fn search_sends_every_filter_clause() {
        let app = Router::new().route("/solr/ontology/select", get(echo_raw));
        let base = spawn_backend(app).await;

        let client = VfbClient::new(test_config(&base)).expect("client");
        let compiled = FacetQuery::new("medulla")
            .with_filters(vec!["neuron".to_string()])
            .compile();
        let value = client.search(&compiled).await.expect("search succeeds");

        let raw = value["raw"].as_str().expect("raw query string");
        assert_eq!(raw.matches("fq=").count(), 2);
        assert!(raw.contains("rows=150"));
        assert!(raw.contains("wt=json"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_captured_not_thrown() {
        let client = VfbClient::new(test_config("http://127.0.0.1:1")).expect("client");

        let err = client
            .get_term_info("VFB_jrcv0i43")
            .await
            .expect_err("backend is unreachable");

        assert!(matches!(err, BackendError::Request { .. }));
        assert!(err.to_string().contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn http_error_status_is_captured() {
        let app = Router::new().route(
            "/get_term_info",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = spawn_backend(app).await;

        let client = VfbClient::new(test_config(&base)).expect("client");
        let err = client
            .get_term_info("VFB_jrcv0i43")
            .await
            .expect_err("status should be captured");

        assert!(matches!(err, BackendError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_captured() {
        let app = Router::new().route("/get_term_info", get(|| async { "not json" }));
        let base = spawn_backend(app).await;

        let client = VfbClient::new(test_config(&base)).expect("client");
        let err = client
            .get_term_info("VFB_jrcv0i43")
            .await
            .expect_err("decode should fail");

        assert!(matches!(err, BackendError::Decode { .. }));
    }
}
