//! Facet vocabulary discovery.
//!
//! The live vocabulary only enriches documentation (the gateway's HTML page).
//! Query compilation never consults it: facet tokens are passed through to
//! Solr verbatim and unknown tokens simply match nothing.

use tracing::debug;

use crate::client::VfbClient;

/// Facet vocabulary shipped with the server, used whenever the index cannot
/// be asked for the live list.
pub const FALLBACK_FACETS: &[&str] = &[
    "entity",
    "anatomy",
    "nervous_system",
    "individual",
    "has_image",
    "adult",
    "cell",
    "neuron",
    "vfb",
    "has_neuron_connectivity",
    "nblast",
    "visual_system",
    "cholinergic",
    "class",
    "secondary_neuron",
    "expression_pattern",
    "gabaergic",
    "expression_pattern_fragment",
    "glutamatergic",
    "feature",
    "sensory_neuron",
    "neuronbridge",
    "deprecated",
    "larva",
    "has_region_connectivity",
    "nblastexp",
    "gene",
    "primary_neuron",
    "flycircuit",
    "mechanosensory_system",
    "histaminergic",
    "lineage_mbp",
    "peptidergic",
    "hasscrnaseq",
    "chemosensory_system",
    "split",
    "has_subclass",
    "olfactory_system",
    "dopaminergic",
    "fafb",
    "l1em",
    "pub",
    "enzyme",
    "motor_neuron",
    "cluster",
    "lineage_6",
    "lineage_3",
    "serotonergic",
    "lineage_19",
    "lineage_cm3",
    "lineage_dm6",
    "proprioceptive_system",
    "gustatory_system",
    "sense_organ",
    "lineage_mbp4",
    "lineage_mbp1",
    "lineage_1",
    "lineage_mbp2",
    "lineage_all1",
    "lineage_balc",
    "lineage_cm4",
    "lineage_dm4",
    "muscle",
    "lineage_13",
    "lineage_8",
    "lineage_mbp3",
    "lineage_12",
    "lineage_dm1",
    "lineage_dpmm1",
    "lineage_9",
    "lineage_cp2",
    "lineage_dl1",
    "fanc",
    "lineage_7",
    "lineage_vpnd2",
    "lineage_dm3",
    "lineage_dpmpm2",
    "lineage_14",
    "lineage_4",
    "lineage_blp1",
    "lineage_dalv2",
    "lineage_eba1",
    "lineage_dm2",
    "lineage_dpmpm1",
    "auditory_system",
    "lineage_16",
    "lineage_blvp1",
    "lineage_blav2",
    "lineage_vlpl2",
    "lineage_alad1",
    "lineage_bamv3",
    "lineage_bld6",
    "lineage_vpnd1",
    "synaptic_neuropil",
    "lineage_23",
    "lineage_17",
    "lineage_10",
    "lineage_dplpv",
    "lineage_21",
    "lineage_alv1",
];

/// Returns the live facet vocabulary, or the built-in list when the index is
/// unreachable or answers with an empty field.
pub async fn discover_facets(client: &VfbClient) -> Vec<String> {
    match client.facet_values().await {
        Ok(values) if !values.is_empty() => values,
        Ok(_) => fallback(),
        Err(err) => {
            debug!("facet discovery failed, using built-in vocabulary: {err}");
            fallback()
        }
    }
}

fn fallback() -> Vec<String> {
    FALLBACK_FACETS.iter().map(|s| (*s).to_string()).collect()
}
