//! MCP tool modules.
//!
//! Tools are grouped by backend: identifier-based lookups against the term
//! service, and facet search against the Solr index.

pub mod lookup;
pub mod search;
