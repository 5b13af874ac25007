// std
use std::time::Duration as StdDuration;

// crates.io
use color_eyre::Result;
use reqwest::Client;
use serde_json::Value;

/// Score one `(query, candidate)` pair jointly.
///
/// The raw response body is returned untouched; the caller owns shape
/// validation, because a misconfigured model endpoint can answer with
/// anything and the reranker must decide how to degrade.
pub async fn classify(
	cfg: &sift_config::ProviderConfig,
	query: &str,
	candidate: &str,
) -> Result<Value> {
	let client = Client::builder().timeout(StdDuration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"text": query,
		"text_pair": candidate,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(json)
}
