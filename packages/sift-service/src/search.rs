pub(crate) mod expansion;
pub(crate) mod rerank;
pub(crate) mod retrieval;

use ahash::AHashMap;

use crate::{ServiceError, ServiceResult, SiftService};
use sift_domain::{
	diversity,
	fusion::{self, FusionInput},
	rollout,
};
use sift_storage::{engine::QueryFilter, records::VectorRecord};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub agent_id: String,
	pub query: String,
	pub top_k: Option<u32>,
	pub min_score: Option<f32>,
	pub folder_ids: Option<Vec<String>>,
}

/// One ranked result with citation-grade provenance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchHit {
	pub id: String,
	pub score: f32,
	pub text: String,
	pub file_path: String,
	pub relative_path: String,
	pub chunk_index: i32,
	pub start_line: Option<u32>,
	pub end_line: Option<u32>,
	pub folder_id: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
	pub hits: Vec<SearchHit>,
}

/// A retrieval candidate; keeps the whole record so diversification can see
/// the dense vector before provenance is copied out.
#[derive(Clone, Debug)]
pub(crate) struct Candidate {
	pub(crate) record: VectorRecord,
	pub(crate) score: f32,
}
impl Candidate {
	fn into_hit(self) -> SearchHit {
		SearchHit {
			id: self.record.id,
			score: self.score,
			text: self.record.text,
			file_path: self.record.file_path,
			relative_path: self.record.relative_path,
			chunk_index: self.record.chunk_index,
			start_line: self.record.start_line,
			end_line: self.record.end_line,
			folder_id: self.record.folder_id,
		}
	}
}

impl SiftService {
	/// Hybrid retrieval entrypoint. Routine calls always return a (possibly
	/// empty) hit list; errors are reserved for bad requests and invariant
	/// violations.
	pub async fn search(&self, req: SearchRequest) -> ServiceResult<SearchResponse> {
		let agent_id = req.agent_id.trim();

		if agent_id.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "agent_id is required.".to_string(),
			});
		}

		let query = req.query.trim();

		if query.is_empty() {
			return Ok(SearchResponse { hits: Vec::new() });
		}

		let top_k = req.top_k.unwrap_or(self.cfg.search.top_k).max(1);
		let min_score = req.min_score.unwrap_or(self.cfg.search.min_score);
		let filter =
			req.folder_ids.filter(|ids| !ids.is_empty()).map(|ids| QueryFilter { folder_ids: Some(ids) });
		let dense_dim = self.cfg.providers.embedding.dimensions as usize;
		let handle = match self.collections.ensure(agent_id, dense_dim).await {
			Ok(handle) => handle,
			Err(err) => {
				tracing::warn!(
					agent_id = %agent_id,
					error = %err,
					"Could not open the agent collection; returning no hits."
				);

				return Ok(SearchResponse { hits: Vec::new() });
			},
		};
		let collection = sift_storage::collections::CollectionManager::collection_name(agent_id);
		let hybrid = rollout::use_hybrid(
			agent_id,
			self.cfg.search.hybrid.enabled,
			self.cfg.search.hybrid.rollout_percent,
		);
		let candidate_limit = top_k.saturating_mul(self.cfg.search.candidate_multiplier);

		if !hybrid {
			let queries = vec![query.to_string()];
			let mut dense = self
				.dense_search(&handle, &queries, candidate_limit, min_score, filter.as_ref())
				.await;

			dense.truncate(top_k as usize);

			return Ok(SearchResponse {
				hits: dense.into_iter().map(Candidate::into_hit).collect(),
			});
		}

		let queries = if self.cfg.search.expansion.enabled {
			self.expansion_cache.expand(query, self.cfg.search.expansion.max_variants)
		} else {
			std::sync::Arc::new(vec![query.to_string()])
		};
		let (dense, lexical) = tokio::join!(
			self.dense_search(&handle, &queries, candidate_limit, min_score, filter.as_ref()),
			self.lexical_search(
				&handle,
				&collection,
				&queries,
				candidate_limit,
				min_score,
				filter.as_ref()
			),
		);

		// A missing channel short-circuits fusion; the surviving channel is
		// already sorted and filtered.
		if dense.is_empty() || lexical.is_empty() {
			let mut survivors = if dense.is_empty() { lexical } else { dense };

			survivors.truncate(top_k as usize);

			return Ok(SearchResponse {
				hits: survivors.into_iter().map(Candidate::into_hit).collect(),
			});
		}

		let mut candidates = self.fuse(dense, lexical)?;

		if self.cfg.search.diversity.enabled && candidates.len() > 1 {
			candidates = diversify(
				candidates,
				self.cfg.search.diversity.mmr_lambda,
				top_k as usize,
			)?;
		}
		if self.cfg.search.rerank.enabled {
			candidates = self.rerank(query, candidates).await;
		}

		candidates.truncate(top_k as usize);

		Ok(SearchResponse { hits: candidates.into_iter().map(Candidate::into_hit).collect() })
	}

	fn fuse(
		&self,
		dense: Vec<Candidate>,
		lexical: Vec<Candidate>,
	) -> ServiceResult<Vec<Candidate>> {
		let dense_ids: Vec<&str> =
			dense.iter().map(|candidate| candidate.record.id.as_str()).collect();
		let lexical_ids: Vec<&str> =
			lexical.iter().map(|candidate| candidate.record.id.as_str()).collect();
		let inputs = [
			FusionInput { weight: self.cfg.search.hybrid.dense_weight, ids: dense_ids },
			FusionInput { weight: self.cfg.search.hybrid.lexical_weight, ids: lexical_ids },
		];
		let fused = fusion::reciprocal_rank_fusion(&inputs, self.cfg.search.hybrid.rrf_k);
		let mut by_id: AHashMap<&str, &Candidate> = AHashMap::new();

		for candidate in dense.iter().chain(lexical.iter()) {
			by_id.entry(candidate.record.id.as_str()).or_insert(candidate);
		}

		let mut out = Vec::with_capacity(fused.len());

		for entry in fused {
			let Some(candidate) = by_id.get(entry.id.as_str()) else {
				return Err(ServiceError::Internal {
					message: format!("Fused id {:?} has no matching hit record.", entry.id),
				});
			};

			out.push(Candidate { record: candidate.record.clone(), score: entry.score });
		}

		Ok(out)
	}
}

fn diversify(
	candidates: Vec<Candidate>,
	lambda: f32,
	top_k: usize,
) -> ServiceResult<Vec<Candidate>> {
	let ranked: Vec<(String, f32)> = candidates
		.iter()
		.map(|candidate| (candidate.record.id.clone(), candidate.score))
		.collect();
	let embeddings: AHashMap<String, Vec<f32>> = candidates
		.iter()
		.map(|candidate| (candidate.record.id.clone(), candidate.record.dense_vector.clone()))
		.collect();
	let selected = diversity::max_marginal_relevance(&ranked, &embeddings, lambda, top_k);
	let mut by_id: AHashMap<String, Candidate> = candidates
		.into_iter()
		.map(|candidate| (candidate.record.id.clone(), candidate))
		.collect();
	let mut out = Vec::with_capacity(selected.len());

	for id in selected {
		let Some(candidate) = by_id.remove(&id) else {
			return Err(ServiceError::Internal {
				message: format!("Diversified id {id:?} has no matching hit record."),
			});
		};

		out.push(candidate);
	}

	Ok(out)
}
