use std::sync::Arc;

use ahash::AHashMap;
use tokio::task::JoinSet;

use crate::{SiftService, l2_normalize, search::Candidate};
use sift_domain::{fusion, lexical};
use sift_storage::{
	Error as StorageError,
	engine::{CollectionHandle, DistanceMetric, QueryFilter, SearchRow},
	records::{DENSE_COLUMN, LEXICAL_COLUMN},
};

impl SiftService {
	/// Dense channel: embed every query variant in one call, then fan the
	/// nearest-neighbor queries out and merge by max score per id. Failures
	/// stay inside this boundary; the caller just sees an empty channel.
	pub(crate) async fn dense_search(
		&self,
		handle: &Arc<dyn CollectionHandle>,
		queries: &[String],
		limit: u32,
		min_score: f32,
		filter: Option<&QueryFilter>,
	) -> Vec<Candidate> {
		let embeddings = match self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, queries)
			.await
		{
			Ok(embeddings) => embeddings,
			Err(err) => {
				tracing::warn!(error = %err, "Query embedding failed; dense channel is empty for this call.");

				return Vec::new();
			},
		};

		if embeddings.len() != queries.len() {
			tracing::warn!(
				expected = queries.len(),
				got = embeddings.len(),
				"Embedding provider returned a mismatched vector count; dense channel is empty for this call."
			);

			return Vec::new();
		}

		let dense_dim = self.cfg.providers.embedding.dimensions as usize;
		let mut set = JoinSet::new();

		for vector in embeddings {
			if vector.len() != dense_dim {
				tracing::warn!(
					expected = dense_dim,
					got = vector.len(),
					"Embedding vector dimension mismatch; skipping that variant."
				);

				continue;
			}

			let vector = l2_normalize(vector);
			let handle = handle.clone();
			let filter = filter.cloned();

			set.spawn(async move {
				handle
					.nearest_neighbors(
						&vector,
						DENSE_COLUMN,
						DistanceMetric::Cosine,
						limit as usize,
						filter.as_ref(),
					)
					.await
			});
		}

		let mut best: AHashMap<String, Candidate> = AHashMap::new();

		while let Some(joined) = set.join_next().await {
			match joined {
				Ok(Ok(rows)) => merge_max_score(&mut best, rows),
				Ok(Err(err)) => {
					tracing::warn!(error = %err, "Dense retrieval query failed; skipping that variant.");
				},
				Err(err) => {
					tracing::warn!(error = %err, "Dense retrieval task failed; skipping that variant.");
				},
			}
		}

		finalize_candidates(best, min_score, limit as usize)
	}

	/// Lexical channel: encode every variant with the indexing-time encoder
	/// and query the lexical column. A collection without that column warns
	/// once and stays silent afterwards.
	pub(crate) async fn lexical_search(
		&self,
		handle: &Arc<dyn CollectionHandle>,
		collection: &str,
		queries: &[String],
		limit: u32,
		min_score: f32,
		filter: Option<&QueryFilter>,
	) -> Vec<Candidate> {
		match handle.schema().await {
			Ok(columns) =>
				if !columns.iter().any(|column| column == LEXICAL_COLUMN) {
					self.warn_lexical_missing_once(collection);

					return Vec::new();
				},
			Err(err) => {
				tracing::debug!(
					collection = %collection,
					error = %err,
					"Schema introspection failed; attempting lexical retrieval anyway."
				);
			},
		}

		let mut set = JoinSet::new();

		for query in queries {
			let vector = lexical::encode(query);

			if vector.iter().all(|value| *value == 0.0) {
				continue;
			}

			let handle = handle.clone();
			let filter = filter.cloned();

			set.spawn(async move {
				handle
					.nearest_neighbors(
						&vector,
						LEXICAL_COLUMN,
						DistanceMetric::Cosine,
						limit as usize,
						filter.as_ref(),
					)
					.await
			});
		}

		let mut best: AHashMap<String, Candidate> = AHashMap::new();
		let mut missing_column = false;

		while let Some(joined) = set.join_next().await {
			match joined {
				Ok(Ok(rows)) => merge_max_score(&mut best, rows),
				Ok(Err(StorageError::MissingColumn { .. })) => {
					missing_column = true;
				},
				Ok(Err(err)) => {
					tracing::warn!(error = %err, "Lexical retrieval query failed; skipping that variant.");
				},
				Err(err) => {
					tracing::warn!(error = %err, "Lexical retrieval task failed; skipping that variant.");
				},
			}
		}

		if missing_column {
			self.warn_lexical_missing_once(collection);
		}

		finalize_candidates(best, min_score, limit as usize)
	}

	fn warn_lexical_missing_once(&self, collection: &str) {
		let mut warned = self.lexical_warned.lock().unwrap_or_else(|err| err.into_inner());

		if warned.insert(collection.to_string()) {
			tracing::warn!(
				collection = %collection,
				"Collection lacks the lexical column; lexical retrieval is unavailable until re-index."
			);
		}
	}
}

fn merge_max_score(best: &mut AHashMap<String, Candidate>, rows: Vec<SearchRow>) {
	for row in rows {
		let score = 1.0 - row.distance;

		match best.get_mut(&row.record.id) {
			Some(existing) =>
				if score > existing.score {
					existing.score = score;
				},
			None => {
				best.insert(row.record.id.clone(), Candidate { record: row.record, score });
			},
		}
	}
}

fn finalize_candidates(
	best: AHashMap<String, Candidate>,
	min_score: f32,
	limit: usize,
) -> Vec<Candidate> {
	let mut out: Vec<Candidate> =
		best.into_values().filter(|candidate| candidate.score >= min_score).collect();

	out.sort_by(|left, right| {
		fusion::cmp_f32_desc(left.score, right.score)
			.then_with(|| left.record.id.cmp(&right.record.id))
	});
	out.truncate(limit);

	out
}
