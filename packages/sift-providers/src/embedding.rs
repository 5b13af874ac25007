use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

/// Embed `texts` in one request. Vectors come back in input order even when
/// the provider reorders its response items.
pub async fn embed(
	cfg: &sift_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json, cfg.dimensions as usize)
}

fn parse_embedding_response(json: Value, expected_dim: usize) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(|value| value.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing the data array."))?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|value| value.as_u64())
			.map(|value| value as usize)
			.unwrap_or(fallback_index);
		let embedding = item
			.get("embedding")
			.and_then(|value| value.as_array())
			.ok_or_else(|| eyre::eyre!("Embedding item is missing its embedding array."))?;
		let mut vector = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value
				.as_f64()
				.ok_or_else(|| eyre::eyre!("Embedding values must be numeric."))?;

			vector.push(number as f32);
		}

		if vector.len() != expected_dim {
			return Err(eyre::eyre!(
				"Embedding dimension mismatch: expected {expected_dim}, got {}.",
				vector.len()
			));
		}

		indexed.push((index, vector));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}
