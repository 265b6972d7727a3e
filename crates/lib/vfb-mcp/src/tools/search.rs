use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use vfb_core::query::FacetQuery;

use crate::{VfbMcp, helpers};

/// Parameters for a faceted term search.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchTermsParams {
    /// Search query (e.g., medulla).
    pub query: String,
    /// Filter results to only include items matching ALL of these
    /// facets_annotation types (AND logic).
    #[serde(default)]
    pub filter_types: Option<Vec<String>>,
    /// Exclude results matching ANY of these facets_annotation types
    /// (OR logic).
    #[serde(default)]
    pub exclude_types: Option<Vec<String>>,
    /// Boost ranking of results matching these facets_annotation types
    /// without excluding others.
    #[serde(default)]
    pub boost_types: Option<Vec<String>>,
}

#[tool_router(router = tool_router_search, vis = "pub")]
impl VfbMcp {
    #[tool(
        description = "Search for VFB terms using the Solr search server. Results can be filtered, excluded, or boosted by entity type using facets_annotation values.\n\nAvailable filter types: entity, anatomy, nervous_system, individual, has_image, adult, cell, neuron, vfb, has_neuron_connectivity, nblast, visual_system, cholinergic, class, secondary_neuron, expression_pattern, gabaergic, expression_pattern_fragment, glutamatergic, feature, sensory_neuron, neuronbridge, deprecated, larva, has_region_connectivity, nblastexp, gene, primary_neuron, flycircuit, mechanosensory_system, histaminergic, lineage_mbp, peptidergic, hasscrnaseq, chemosensory_system, split, has_subclass, olfactory_system, dopaminergic, fafb, l1em, pub, enzyme, motor_neuron, cluster, lineage_6, lineage_3, serotonergic, lineage_19, lineage_cm3, lineage_dm6, proprioceptive_system, gustatory_system, sense_organ, lineage_mbp4, lineage_mbp1, lineage_1, lineage_mbp2, lineage_all1, lineage_balc, lineage_cm4, lineage_dm4, muscle, lineage_13, lineage_8, lineage_mbp3, lineage_12, lineage_dm1, lineage_dpmm1, lineage_9, lineage_cp2, lineage_dl1, fanc, lineage_7, lineage_vpnd2, lineage_dm3, lineage_dpmpm2, lineage_14, lineage_4, lineage_blp1, lineage_dalv2, lineage_eba1, lineage_dm2, lineage_dpmpm1, auditory_system, lineage_16, lineage_blvp1, lineage_blav2, lineage_vlpl2, lineage_alad1, lineage_bamv3, lineage_bld6, lineage_vpnd1, synaptic_neuropil, lineage_23, lineage_17, lineage_10, lineage_dplpv, lineage_21, lineage_alv1\n\nMultiple filter_types are ANDed (results must match ALL). Multiple exclude_types are ORed (any match excludes). boost_types soft-rank matching results higher without excluding others."
    )]
    async fn search_terms(
        &self,
        Parameters(params): Parameters<SearchTermsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let query = helpers::required(&params.query, "query")?;
        self.telemetry.record(self.session, "search_terms");

        let compiled = FacetQuery::new(query)
            .with_filters(params.filter_types.unwrap_or_default())
            .with_exclusions(params.exclude_types.unwrap_or_default())
            .with_boosts(params.boost_types.unwrap_or_default())
            .compile();
        let outcome = self.client.search(&compiled).await;
        Ok(helpers::fold_backend(outcome, "Error searching terms"))
    }
}
