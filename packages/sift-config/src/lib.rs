mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, EmbeddingProviderConfig, ProviderConfig, Providers, Search, SearchDiversity,
	SearchExpansion, SearchHybrid, SearchRerank, Service,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.chunking.window_tokens == 0 {
		return Err(Error::Validation {
			message: "chunking.window_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.stride_tokens == 0 {
		return Err(Error::Validation {
			message: "chunking.stride_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.stride_tokens > cfg.chunking.window_tokens {
		return Err(Error::Validation {
			message: "chunking.stride_tokens must not exceed chunking.window_tokens.".to_string(),
		});
	}
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.min_score.is_finite() {
		return Err(Error::Validation {
			message: "search.min_score must be a finite number.".to_string(),
		});
	}
	if cfg.search.candidate_multiplier == 0 {
		return Err(Error::Validation {
			message: "search.candidate_multiplier must be greater than zero.".to_string(),
		});
	}
	if cfg.search.hybrid.rollout_percent > 100 {
		return Err(Error::Validation {
			message: "search.hybrid.rollout_percent must be between 0 and 100.".to_string(),
		});
	}

	for (label, weight) in [
		("search.hybrid.dense_weight", cfg.search.hybrid.dense_weight),
		("search.hybrid.lexical_weight", cfg.search.hybrid.lexical_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if !cfg.search.hybrid.rrf_k.is_finite() || cfg.search.hybrid.rrf_k <= 0.0 {
		return Err(Error::Validation {
			message: "search.hybrid.rrf_k must be a positive finite number.".to_string(),
		});
	}
	if cfg.search.expansion.max_variants == 0 {
		return Err(Error::Validation {
			message: "search.expansion.max_variants must be greater than zero.".to_string(),
		});
	}
	if cfg.search.expansion.cache_capacity == 0 {
		return Err(Error::Validation {
			message: "search.expansion.cache_capacity must be greater than zero.".to_string(),
		});
	}
	if cfg.search.expansion.cache_ttl_secs == 0 {
		return Err(Error::Validation {
			message: "search.expansion.cache_ttl_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.search.rerank.top_k == 0 {
		return Err(Error::Validation {
			message: "search.rerank.top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.diversity.mmr_lambda.is_finite()
		|| !(0.0..=1.0).contains(&cfg.search.diversity.mmr_lambda)
	{
		return Err(Error::Validation {
			message: "search.diversity.mmr_lambda must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}

	// The cross-encoder key may legitimately be absent; reranking degrades to
	// disabled at runtime instead of failing config validation.

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
