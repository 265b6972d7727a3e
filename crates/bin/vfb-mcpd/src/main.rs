//! Daemon entry point for the VFB MCP server.
//!
//! Loads configuration from the environment, initializes logging, and serves
//! the MCP protocol over stdio or the session-scoped streamable HTTP
//! gateway.

mod config;

use std::sync::Arc;

use tracing::info;
use vfb_core::client::{VfbClient, VfbClientConfig};
use vfb_mcp::gateway::GatewayConfig;
use vfb_mcp::server::{serve_stdio, serve_streamable_http};
use vfb_mcp::telemetry::TelemetryBeacon;

use crate::config::{ServeMode, VfbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = VfbConfig::from_args()?;

    // Stdout carries the protocol in stdio mode; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vfb_mcpd=info,vfb_mcp=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let http = reqwest::Client::builder()
        .timeout(config.backend_timeout)
        .build()?;
    let client = Arc::new(VfbClient::with_http(
        http.clone(),
        VfbClientConfig {
            term_service_url: config.term_service_url.clone(),
            solr_url: config.solr_url.clone(),
            timeout: config.backend_timeout,
        },
    ));
    let telemetry = TelemetryBeacon::new(config.telemetry_url.clone(), http);

    match config.mode {
        ServeMode::Stdio => {
            info!("starting VFB MCP server in stdio mode");
            serve_stdio(client, telemetry).await
        }
        ServeMode::Http => {
            info!("starting VFB MCP server in HTTP mode on {}", config.http_addr);
            let gateway = GatewayConfig::new(config.http_addr)
                .with_allowed_hosts(config.allowed_hosts.clone())
                .with_request_timeout(config.request_timeout)
                .with_session_ttl(config.session_ttl)
                .with_sweep_interval(config.sweep_interval);
            serve_streamable_http(client, telemetry, gateway).await
        }
    }
}
