//! Core services for the Virtual Fly Brain MCP server.
//!
//! This crate holds the pieces that talk to VFB's public data backends: the
//! facet-aware Solr query compiler and the thin HTTP client over the
//! term-info/query endpoint and the Solr select endpoint.

pub mod client;
pub mod facets;
pub mod query;

pub use client::{BackendError, VfbClient, VfbClientConfig};
pub use query::{CompiledQuery, FacetQuery};
