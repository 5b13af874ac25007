use std::{sync::Arc, time::Duration};

use moka::sync::Cache;

use sift_config::SearchExpansion;

/// Domain-term synonym pairs; every key found as a substring of the lowered
/// query produces one substituted variant.
const SYNONYMS: &[(&str, &str)] = &[
	("config", "settings"),
	("settings", "config"),
	("folder", "directory"),
	("directory", "folder"),
	("file", "document"),
	("remove", "delete"),
	("delete", "remove"),
	("search", "find"),
	("error", "exception"),
	("function", "method"),
	("auth", "login"),
];

/// Bounded, TTL-limited memo of expansion results keyed by
/// `(query, max_variants)`. Expansion is pure, so entries are idempotent and
/// never need invalidation.
pub(crate) struct ExpansionCache {
	cache: Cache<(String, u32), Arc<Vec<String>>>,
}
impl ExpansionCache {
	pub(crate) fn new(cfg: &SearchExpansion) -> Self {
		let cache = Cache::builder()
			.max_capacity(cfg.cache_capacity)
			.time_to_live(Duration::from_secs(cfg.cache_ttl_secs))
			.build();

		Self { cache }
	}

	pub(crate) fn expand(&self, query: &str, max_variants: u32) -> Arc<Vec<String>> {
		self.cache
			.get_with((query.to_string(), max_variants), || {
				Arc::new(expand_query(query, max_variants))
			})
	}
}

/// The original query always comes first; substituted variants follow, capped
/// at `max_variants` total.
pub(crate) fn expand_query(query: &str, max_variants: u32) -> Vec<String> {
	let cap = max_variants.max(1) as usize;
	let mut out = vec![query.to_string()];
	let lowered = query.to_lowercase();

	for (term, synonym) in SYNONYMS {
		if out.len() >= cap {
			break;
		}
		if !lowered.contains(term) {
			continue;
		}

		let variant = lowered.replace(term, synonym);

		if variant != lowered && !out.iter().any(|existing| *existing == variant) {
			out.push(variant);
		}
	}

	out
}
