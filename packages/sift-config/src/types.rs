use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub chunking: Chunking,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub cross_encoder: ProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Chunking {
	/// Token-aligned windowing. Disabled indexes each file as a single chunk.
	pub enabled: bool,
	pub window_tokens: u32,
	pub stride_tokens: u32,
}
impl Default for Chunking {
	fn default() -> Self {
		Self { enabled: true, window_tokens: 256, stride_tokens: 192 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub top_k: u32,
	pub min_score: f32,
	pub candidate_multiplier: u32,
	#[serde(default)]
	pub hybrid: SearchHybrid,
	#[serde(default)]
	pub expansion: SearchExpansion,
	#[serde(default)]
	pub rerank: SearchRerank,
	#[serde(default)]
	pub diversity: SearchDiversity,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchHybrid {
	pub enabled: bool,
	/// Percentage of agents routed to the hybrid pipeline, 0-100.
	pub rollout_percent: u32,
	pub dense_weight: f32,
	pub lexical_weight: f32,
	pub rrf_k: f32,
}
impl Default for SearchHybrid {
	fn default() -> Self {
		Self {
			enabled: false,
			rollout_percent: 0,
			dense_weight: 1.5,
			lexical_weight: 0.2,
			rrf_k: 30.0,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchExpansion {
	pub enabled: bool,
	pub max_variants: u32,
	pub cache_capacity: u64,
	pub cache_ttl_secs: u64,
}
impl Default for SearchExpansion {
	fn default() -> Self {
		Self { enabled: true, max_variants: 3, cache_capacity: 512, cache_ttl_secs: 300 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchRerank {
	pub enabled: bool,
	/// Only the top-ranked candidates are scored; the rest pass through.
	pub top_k: u32,
}
impl Default for SearchRerank {
	fn default() -> Self {
		Self { enabled: false, top_k: 10 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchDiversity {
	pub enabled: bool,
	pub mmr_lambda: f32,
}
impl Default for SearchDiversity {
	fn default() -> Self {
		Self { enabled: false, mmr_lambda: 0.7 }
	}
}
