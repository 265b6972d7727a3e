//! MCP server implementation for Virtual Fly Brain.
//!
//! This crate wires the VFB lookup services into rmcp tool handlers and
//! exposes the session-scoped gateway that serves the protocol over
//! streamable HTTP, alongside the plain stdio runner.

pub mod docs;
pub mod gateway;
mod helpers;
pub mod server;
pub mod session;
pub mod telemetry;
mod tools;

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{ServerHandler, tool_handler};
use uuid::Uuid;
use vfb_core::client::VfbClient;

use crate::telemetry::TelemetryBeacon;

const SERVER_INSTRUCTIONS: &str = r"vfb-mcp exposes Virtual Fly Brain (VFB) lookups as MCP tools.

Tools:
- `get_term_info` fetches full term metadata for a VFB ID (e.g. VFB_jrcv0i43).
- `run_query` runs a predefined graph query for a VFB ID and query type
  (e.g. PaintedDomains).
- `search_terms` searches the VFB Solr index; results can be filtered,
  excluded, or boosted by facet type.

Notes:
- Facet tokens are free-form; unknown tokens match nothing rather than fail.
- Backend outages are reported inside the tool result text, so always read
  the returned text even when the call succeeds.";

/// MCP server bound to one session: the tool router plus the shared backend
/// client and telemetry beacon.
#[derive(Clone)]
pub struct VfbMcp {
    tool_router: ToolRouter<Self>,
    client: Arc<VfbClient>,
    telemetry: TelemetryBeacon,
    session: Uuid,
}

impl VfbMcp {
    /// Creates a server instance bound to the given session identifier.
    #[must_use]
    pub fn new(client: Arc<VfbClient>, telemetry: TelemetryBeacon, session: Uuid) -> Self {
        let tool_router = Self::tool_router_lookup() + Self::tool_router_search();
        Self {
            tool_router,
            client,
            telemetry,
            session,
        }
    }

    /// Session identifier this instance serves.
    #[must_use]
    pub const fn session(&self) -> Uuid {
        self.session
    }
}

#[tool_handler]
impl ServerHandler for VfbMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
