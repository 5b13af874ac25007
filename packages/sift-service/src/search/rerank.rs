use std::{
	cmp::Ordering,
	sync::atomic::{AtomicBool, Ordering as AtomicOrdering},
};

use serde_json::Value;
use tokio::{sync::OnceCell, task::JoinSet};

use crate::{SiftService, search::Candidate};
use sift_config::ProviderConfig;
use sift_domain::fusion;

/// Typed view of one cross-encoder response, decoded once per call instead
/// of duck-typed field probing at every use site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RerankOutcome {
	Score(f32),
	UnexpectedShape,
}
impl RerankOutcome {
	/// Accepts `{"score": n}` / `{"relevance_score": n}` objects, or an array
	/// whose first element is such an object. Everything else is an
	/// unexpected shape.
	pub(crate) fn from_value(value: &Value) -> Self {
		let object = match value {
			Value::Array(items) => items.first(),
			other => Some(other),
		};
		let score = object.and_then(|item| {
			item.get("score").or_else(|| item.get("relevance_score")).and_then(Value::as_f64)
		});

		match score {
			Some(score) if score.is_finite() => Self::Score(score as f32),
			_ => Self::UnexpectedShape,
		}
	}
}

/// Load-once state for the cross-encoder. The cell caches the one-time load
/// (shared by concurrent first callers), including a failed load, so it is
/// never retried; the flag is tripped permanently by an unexpected output
/// shape.
pub(crate) struct RerankerState {
	ready: OnceCell<bool>,
	disabled: AtomicBool,
}
impl RerankerState {
	pub(crate) fn new() -> Self {
		Self { ready: OnceCell::new(), disabled: AtomicBool::new(false) }
	}

	fn disable(&self) -> bool {
		!self.disabled.swap(true, AtomicOrdering::SeqCst)
	}

	fn is_disabled(&self) -> bool {
		self.disabled.load(AtomicOrdering::SeqCst)
	}
}

impl SiftService {
	/// Score the top `rerank.top_k` candidates with the cross-encoder and
	/// reorder them; the remainder is appended unchanged to preserve recall.
	/// Passthrough whenever the channel is disabled, failed to load, tripped
	/// the shape guard, or hits a transient provider error.
	pub(crate) async fn rerank(&self, query: &str, candidates: Vec<Candidate>) -> Vec<Candidate> {
		if candidates.is_empty() || self.reranker.is_disabled() {
			return candidates;
		}

		let ready = self
			.reranker
			.ready
			.get_or_init(|| async { load_cross_encoder(&self.cfg.providers.cross_encoder) })
			.await;

		if !*ready {
			return candidates;
		}

		let top_n = (self.cfg.search.rerank.top_k as usize).min(candidates.len());
		let mut set = JoinSet::new();

		for (idx, candidate) in candidates.iter().take(top_n).enumerate() {
			let provider = self.providers.cross_encoder.clone();
			let query = query.to_string();
			let text = candidate.record.text.clone();
			let cfg = clone_provider_config(&self.cfg.providers.cross_encoder);

			set.spawn(async move { (idx, provider.classify(&cfg, &query, &text).await) });
		}

		let mut scores = vec![0.0_f32; top_n];

		while let Some(joined) = set.join_next().await {
			let (idx, result) = match joined {
				Ok(pair) => pair,
				Err(err) => {
					tracing::warn!(error = %err, "Cross-encoder task failed; keeping retrieval order.");

					return candidates;
				},
			};
			let value = match result {
				Ok(value) => value,
				Err(err) => {
					tracing::warn!(error = %err, "Cross-encoder call failed; keeping retrieval order.");

					return candidates;
				},
			};

			match RerankOutcome::from_value(&value) {
				RerankOutcome::Score(score) => {
					scores[idx] = score;
				},
				RerankOutcome::UnexpectedShape => {
					if self.reranker.disable() {
						tracing::warn!(
							"Cross-encoder returned an unexpected output shape; reranking is disabled for this process."
						);
					}

					return candidates;
				},
			}
		}

		reorder_head(candidates, &scores, top_n)
	}
}

/// One-time readiness check. Missing credentials degrade the channel to
/// disabled instead of erroring every query.
fn load_cross_encoder(cfg: &ProviderConfig) -> bool {
	if cfg.api_key.trim().is_empty() || cfg.api_base.trim().is_empty() {
		tracing::warn!(
			"Cross-encoder credentials are not configured; reranking is disabled for this process."
		);

		return false;
	}

	true
}

fn clone_provider_config(cfg: &ProviderConfig) -> ProviderConfig {
	ProviderConfig {
		provider_id: cfg.provider_id.clone(),
		api_base: cfg.api_base.clone(),
		api_key: cfg.api_key.clone(),
		path: cfg.path.clone(),
		model: cfg.model.clone(),
		timeout_ms: cfg.timeout_ms,
		default_headers: cfg.default_headers.clone(),
	}
}

/// Sort the scored head by cross-encoder score (stable on ties via the
/// incoming rank) and append the unscored tail untouched.
fn reorder_head(candidates: Vec<Candidate>, scores: &[f32], top_n: usize) -> Vec<Candidate> {
	let mut head: Vec<(usize, Candidate)> =
		candidates.iter().take(top_n).cloned().enumerate().collect();

	head.sort_by(|left, right| {
		let ord = fusion::cmp_f32_desc(scores[left.0], scores[right.0]);

		if ord != Ordering::Equal {
			return ord;
		}

		left.0.cmp(&right.0)
	});

	let mut out: Vec<Candidate> = head
		.into_iter()
		.map(|(idx, mut candidate)| {
			candidate.score = scores[idx];

			candidate
		})
		.collect();

	out.extend(candidates.into_iter().skip(top_n));

	out
}
