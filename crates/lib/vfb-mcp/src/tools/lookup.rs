use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{VfbMcp, helpers};

/// Parameters for a term-info lookup.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetTermInfoParams {
    /// VFB ID (e.g., VFB_jrcv0i43).
    pub id: String,
}

/// Parameters for running a predefined graph query.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RunQueryParams {
    /// VFB ID (e.g., VFB_00101567).
    pub id: String,
    /// Query type (e.g., PaintedDomains).
    pub query_type: String,
}

#[tool_router(router = tool_router_lookup, vis = "pub")]
impl VfbMcp {
    #[tool(description = "Get term information from VirtualFlyBrain using a VFB ID")]
    async fn get_term_info(
        &self,
        Parameters(params): Parameters<GetTermInfoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let id = helpers::required(&params.id, "id")?;
        self.telemetry.record(self.session, "get_term_info");
        let outcome = self.client.get_term_info(id).await;
        Ok(helpers::fold_backend(outcome, "Error fetching term info"))
    }

    #[tool(description = "Run a query on VirtualFlyBrain using a VFB ID and query type")]
    async fn run_query(
        &self,
        Parameters(params): Parameters<RunQueryParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let id = helpers::required(&params.id, "id")?;
        let query_type = helpers::required(&params.query_type, "query_type")?;
        self.telemetry.record(self.session, "run_query");
        let outcome = self.client.run_query(id, query_type).await;
        Ok(helpers::fold_backend(outcome, "Error running query"))
    }
}
