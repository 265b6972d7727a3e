//! MCP server runners for vfb-mcp.

use std::sync::Arc;

use rmcp::serve_server;
use rmcp::transport::io::stdio;
use tracing::info;
use uuid::Uuid;
use vfb_core::client::VfbClient;
use vfb_core::facets::discover_facets;

use crate::VfbMcp;
use crate::docs::docs_page;
use crate::gateway::{GatewayConfig, GatewayState, build_router};
use crate::session::{SessionRegistry, SessionRegistryConfig};
use crate::telemetry::TelemetryBeacon;

/// Serves the MCP server over stdio as a single anonymous session.
///
/// # Errors
/// Returns any transport or server error.
pub async fn serve_stdio(
    client: Arc<VfbClient>,
    telemetry: TelemetryBeacon,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let service = VfbMcp::new(client, telemetry, Uuid::new_v4());
    let (stdin, stdout) = stdio();
    let running = serve_server(service, (stdin, stdout)).await?;
    let _ = running.waiting().await?;
    Ok(())
}

/// Serves the MCP server using the session-scoped streamable HTTP transport.
///
/// # Errors
/// Returns any listener or server error.
pub async fn serve_streamable_http(
    client: Arc<VfbClient>,
    telemetry: TelemetryBeacon,
    config: GatewayConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = SessionRegistry::new(
        SessionRegistryConfig {
            ttl: config.session_ttl,
            sweep_interval: config.sweep_interval,
            request_timeout: config.request_timeout,
        },
    );
    let _sweeper = registry.clone().spawn_sweeper();

    // Documentation enrichment only; compilation never consults the live
    // vocabulary.
    let facets = discover_facets(&client).await;
    let docs_html = Arc::new(docs_page(&facets));

    let service_factory: Arc<dyn Fn(Uuid) -> VfbMcp + Send + Sync> = Arc::new(move |session| {
        VfbMcp::new(Arc::clone(&client), telemetry.clone(), session)
    });

    let state = GatewayState {
        registry,
        service_factory,
        docs_html,
        allowed_hosts: config.allowed_hosts.clone().into(),
        sse_keep_alive: config.sse_keep_alive,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("vfb-mcp gateway listening on {}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
