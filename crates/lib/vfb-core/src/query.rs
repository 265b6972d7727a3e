//! Compilation of faceted search requests into Solr query parameters.
//!
//! A [`FacetQuery`] carries the caller's free-text query plus optional facet
//! token lists; [`FacetQuery::compile`] turns it into the full parameter set
//! the ontology Solr core expects. Facet tokens are passed through verbatim:
//! unknown tokens are legal and simply match nothing.

/// Result cap sent to Solr on every search.
pub const RESULT_ROWS: u32 = 150;

const MIN_MATCH: &str = "45%";
const QUERY_FIELDS: &str =
    "label^110 synonym^100 label_autosuggest synonym_autosuggest shortform_autosuggest";
const RESULT_FIELDS: &str = "short_form,label,synonym,id,facets_annotation,unique_facets";

/// Restricts results to VFB's own identifier namespaces (plus datasets and
/// publications) while excluding the internal `VFBc_*` sub-namespace. This
/// clause is always emitted first and caller-supplied filters can only narrow
/// it, never replace it.
const BASE_FILTER: &str = "(short_form:VFB* OR short_form:FB* OR facets_annotation:DataSet \
     OR facets_annotation:pub) AND NOT short_form:VFBc_*";

/// Baseline ranking: VFB and FlyBase anatomy namespaces far above the
/// experimental `VFBexp` namespace, a mild preference for the adult brain
/// term, and a heavy penalty for deprecated records.
const BASELINE_BOOST: &str = "short_form:VFBexp*^10.0 short_form:VFB*^100.0 \
     short_form:FBbt*^100.0 short_form:FBbt_00003982^2 facets_annotation:Deprecated^0.001";

/// Weight applied to caller-requested boost facets. Large enough to out-rank
/// every baseline weight without excluding non-matching results.
const FACET_BOOST_WEIGHT: &str = "1000.0";

/// A free-text search request with optional facet constraints.
#[derive(Debug, Clone, Default)]
pub struct FacetQuery {
    query: String,
    filter_types: Vec<String>,
    exclude_types: Vec<String>,
    boost_types: Vec<String>,
}

impl FacetQuery {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Facets a result must match all of (conjunctive).
    #[must_use]
    pub fn with_filters(mut self, filter_types: Vec<String>) -> Self {
        self.filter_types = filter_types;
        self
    }

    /// Facets any one of which disqualifies a result (disjunctive negation).
    #[must_use]
    pub fn with_exclusions(mut self, exclude_types: Vec<String>) -> Self {
        self.exclude_types = exclude_types;
        self
    }

    /// Facets that rank matching results higher without excluding others.
    #[must_use]
    pub fn with_boosts(mut self, boost_types: Vec<String>) -> Self {
        self.boost_types = boost_types;
        self
    }

    /// Compiles the request into backend-ready query parameters.
    #[must_use]
    pub fn compile(&self) -> CompiledQuery {
        let q = format!("{0} OR {0}* OR *{0}*", self.query);

        let mut filter_queries = vec![BASE_FILTER.to_string()];
        for facet in &self.filter_types {
            filter_queries.push(format!("facets_annotation:{facet}"));
        }
        if !self.exclude_types.is_empty() {
            // Exclusions collapse into one negated disjunction. Emitting an
            // independent NOT clause per token would be equivalent under
            // conjunctive fq evaluation.
            let group = self
                .exclude_types
                .iter()
                .map(|facet| format!("facets_annotation:{facet}"))
                .collect::<Vec<_>>()
                .join(" OR ");
            filter_queries.push(format!("NOT ({group})"));
        }

        let mut boost_query = BASELINE_BOOST.to_string();
        for facet in &self.boost_types {
            boost_query.push(' ');
            boost_query.push_str(&format!("facets_annotation:{facet}^{FACET_BOOST_WEIGHT}"));
        }

        CompiledQuery {
            q,
            filter_queries,
            boost_query,
        }
    }
}

/// The backend-ready parameter set derived from a [`FacetQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// Free-text expansion: exact term, prefix wildcard, and substring
    /// wildcard, ORed.
    pub q: String,
    /// Filter clauses; every clause is independently required. The namespace
    /// base clause is always the first entry.
    pub filter_queries: Vec<String>,
    /// Boost expression: baseline weights plus caller-requested boosts.
    pub boost_query: String,
}

impl CompiledQuery {
    /// Full Solr `select` parameter list, one `fq` pair per filter clause.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.q.clone()),
            ("q.op", "OR".to_string()),
            ("defType", "edismax".to_string()),
            ("mm", MIN_MATCH.to_string()),
            ("qf", QUERY_FIELDS.to_string()),
            ("indent", "true".to_string()),
            ("fl", RESULT_FIELDS.to_string()),
            ("start", "0".to_string()),
            ("pf", "true".to_string()),
            ("rows", RESULT_ROWS.to_string()),
            ("wt", "json".to_string()),
            ("bq", self.boost_query.clone()),
        ];
        for fq in &self.filter_queries {
            params.push(("fq", fq.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_query_compiles_to_base_clause_and_baseline_boost() {
        let compiled = FacetQuery::new("medulla").compile();

        assert_eq!(compiled.q, "medulla OR medulla* OR *medulla*");
        assert_eq!(compiled.filter_queries, vec![BASE_FILTER.to_string()]);
        assert_eq!(compiled.boost_query, BASELINE_BOOST);
    }

    #[test]
    fn filters_are_conjunctive_clauses() {
        let compiled = FacetQuery::new("medulla")
            .with_filters(vec!["neuron".to_string(), "adult".to_string()])
            .compile();

        assert_eq!(
            compiled.filter_queries,
            vec![
                BASE_FILTER.to_string(),
                "facets_annotation:neuron".to_string(),
                "facets_annotation:adult".to_string(),
            ]
        );
    }

    #[test]
    fn exclusions_form_a_single_negated_group() {
        let compiled = FacetQuery::new("x")
            .with_exclusions(vec!["larva".to_string(), "nblast".to_string()])
            .compile();

        assert_eq!(compiled.filter_queries.len(), 2);
        assert_eq!(
            compiled.filter_queries[1],
            "NOT (facets_annotation:larva OR facets_annotation:nblast)"
        );
    }

    #[test]
    fn exclusion_only_touches_annotated_records() {
        // A NOT clause disqualifies records tagged with the facet; records
        // with no facet annotation keep matching the base clause alone.
        let compiled = FacetQuery::new("x")
            .with_exclusions(vec!["larva".to_string()])
            .compile();

        assert_eq!(compiled.filter_queries[0], BASE_FILTER);
        assert_eq!(compiled.filter_queries[1], "NOT (facets_annotation:larva)");
    }

    #[test]
    fn boosts_extend_the_baseline_without_filtering() {
        let compiled = FacetQuery::new("medulla")
            .with_boosts(vec!["neuron".to_string()])
            .compile();

        assert!(compiled.boost_query.starts_with(BASELINE_BOOST));
        assert!(
            compiled
                .boost_query
                .ends_with("facets_annotation:neuron^1000.0")
        );
        assert_eq!(compiled.filter_queries, vec![BASE_FILTER.to_string()]);
    }

    #[test]
    fn base_clause_is_never_overridden_by_caller_filters() {
        let compiled = FacetQuery::new("medulla")
            .with_filters(vec!["vfb".to_string()])
            .with_exclusions(vec!["deprecated".to_string()])
            .compile();

        assert_eq!(compiled.filter_queries[0], BASE_FILTER);
    }

    #[test]
    fn params_repeat_fq_and_carry_fixed_settings() {
        let compiled = FacetQuery::new("medulla")
            .with_filters(vec!["neuron".to_string()])
            .compile();
        let params = compiled.params();

        let fq_count = params.iter().filter(|(name, _)| *name == "fq").count();
        assert_eq!(fq_count, 2);

        let lookup = |name: &str| {
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str())
        };
        assert_eq!(lookup("rows"), Some("150"));
        assert_eq!(lookup("mm"), Some("45%"));
        assert_eq!(lookup("defType"), Some("edismax"));
        assert_eq!(lookup("wt"), Some("json"));
    }
}
