//! Test doubles for the engine boundary: an in-memory [`VectorEngine`] with
//! the same infer-schema-from-rows contract as the embedded store, plus a
//! ready-made config for service tests.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use serde_json::Map;

use sift_config::{
	Chunking, Config, EmbeddingProviderConfig, ProviderConfig, Providers, Search, SearchDiversity,
	SearchExpansion, SearchHybrid, SearchRerank, Service,
};
use sift_domain::diversity::cosine_similarity;
use sift_storage::{
	BoxFuture, Error, Result,
	engine::{CollectionHandle, DeletePredicate, DistanceMetric, QueryFilter, SearchRow, VectorEngine},
	records::{DENSE_COLUMN, LEXICAL_COLUMN, VectorRecord},
};

const BASE_COLUMNS: &[&str] = &[
	"id",
	DENSE_COLUMN,
	"text",
	"file_path",
	"relative_path",
	"chunk_index",
	"token_count",
	"folder_id",
	"indexed_at",
	"schema_version",
];

#[derive(Default)]
pub struct MemoryEngine {
	collections: Mutex<HashMap<String, Arc<MemoryCollection>>>,
}
impl MemoryEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Row count for assertions; zero for unknown collections.
	pub fn row_count(&self, name: &str) -> usize {
		let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		collections
			.get(name)
			.map(|collection| {
				collection.rows.lock().unwrap_or_else(|err| err.into_inner()).len()
			})
			.unwrap_or(0)
	}
}
impl VectorEngine for MemoryEngine {
	fn create_collection<'a>(
		&'a self,
		name: &'a str,
		seed_rows: Vec<VectorRecord>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

			if collections.contains_key(name) {
				return Err(Error::CollectionExists { name: name.to_string() });
			}

			collections
				.insert(name.to_string(), Arc::new(MemoryCollection::from_seed(name, seed_rows)));

			Ok(())
		})
	}

	fn drop_collection<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());

			if collections.remove(name).is_none() {
				return Err(Error::CollectionNotFound { name: name.to_string() });
			}

			Ok(())
		})
	}

	fn list_collections<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move {
			let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
			let mut names: Vec<String> = collections.keys().cloned().collect();

			names.sort();

			Ok(names)
		})
	}

	fn open_collection<'a>(
		&'a self,
		name: &'a str,
	) -> BoxFuture<'a, Result<Arc<dyn CollectionHandle>>> {
		Box::pin(async move {
			let collections = self.collections.lock().unwrap_or_else(|err| err.into_inner());
			let collection = collections
				.get(name)
				.cloned()
				.ok_or_else(|| Error::CollectionNotFound { name: name.to_string() })?;

			Ok(collection as Arc<dyn CollectionHandle>)
		})
	}
}

pub struct MemoryCollection {
	name: String,
	columns: Vec<String>,
	rows: Mutex<Vec<VectorRecord>>,
}
impl MemoryCollection {
	/// Schema is inferred from the seed rows, exactly once; later inserts
	/// never widen it.
	fn from_seed(name: &str, seed_rows: Vec<VectorRecord>) -> Self {
		let mut columns: Vec<String> =
			BASE_COLUMNS.iter().map(|column| column.to_string()).collect();

		if seed_rows.iter().any(|row| row.lexical_vector.is_some()) {
			columns.push(LEXICAL_COLUMN.to_string());
		}
		if seed_rows.iter().any(|row| row.start_line.is_some()) {
			columns.push("start_line".to_string());
			columns.push("end_line".to_string());
			columns.push("token_offset".to_string());
		}

		Self { name: name.to_string(), columns, rows: Mutex::new(seed_rows) }
	}

	fn column_vector<'a>(&self, row: &'a VectorRecord, column: &str) -> Option<&'a Vec<f32>> {
		match column {
			DENSE_COLUMN => Some(&row.dense_vector),
			LEXICAL_COLUMN => row.lexical_vector.as_ref(),
			_ => None,
		}
	}
}
impl CollectionHandle for MemoryCollection {
	fn nearest_neighbors<'a>(
		&'a self,
		vector: &'a [f32],
		column: &'a str,
		metric: DistanceMetric,
		limit: usize,
		filter: Option<&'a QueryFilter>,
	) -> BoxFuture<'a, Result<Vec<SearchRow>>> {
		Box::pin(async move {
			let DistanceMetric::Cosine = metric;

			if !self.columns.iter().any(|known| known == column) {
				return Err(Error::MissingColumn {
					name: self.name.clone(),
					column: column.to_string(),
				});
			}

			let rows = self.rows.lock().unwrap_or_else(|err| err.into_inner());
			let mut scored = Vec::new();

			for row in rows.iter() {
				if let Some(QueryFilter { folder_ids: Some(allowed) }) = filter
					&& !allowed.iter().any(|folder| *folder == row.folder_id)
				{
					continue;
				}

				let Some(row_vector) = self.column_vector(row, column) else {
					continue;
				};
				let similarity = cosine_similarity(vector, row_vector).unwrap_or(0.0);

				scored.push(SearchRow { record: row.clone(), distance: 1.0 - similarity });
			}

			scored.sort_by(|left, right| {
				left.distance.partial_cmp(&right.distance).unwrap_or(std::cmp::Ordering::Equal)
			});
			scored.truncate(limit);

			Ok(scored)
		})
	}

	fn insert<'a>(&'a self, new_rows: Vec<VectorRecord>) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut rows = self.rows.lock().unwrap_or_else(|err| err.into_inner());

			for row in &new_rows {
				if row.lexical_vector.is_some()
					&& !self.columns.iter().any(|column| column == LEXICAL_COLUMN)
				{
					return Err(Error::MissingColumn {
						name: self.name.clone(),
						column: LEXICAL_COLUMN.to_string(),
					});
				}
			}

			rows.extend(new_rows);

			Ok(())
		})
	}

	fn delete<'a>(&'a self, predicate: &'a DeletePredicate) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut rows = self.rows.lock().unwrap_or_else(|err| err.into_inner());
			let before = rows.len();

			rows.retain(|row| match predicate {
				DeletePredicate::Id(id) => row.id != *id,
				DeletePredicate::FilePath(path) => row.file_path != *path,
				DeletePredicate::FolderId(folder) => row.folder_id != *folder,
				DeletePredicate::All => false,
			});

			Ok((before - rows.len()) as u64)
		})
	}

	fn schema<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move { Ok(self.columns.clone()) })
	}
}

/// A config that points every provider at an unroutable address; tests swap
/// in stub providers, so nothing should ever dial it.
pub fn test_config(dimensions: u32) -> Config {
	Config {
		service: Service { log_level: "debug".to_string() },
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			cross_encoder: ProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/classify".to_string(),
				model: "test-cross-encoder".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		chunking: Chunking { enabled: true, window_tokens: 32, stride_tokens: 24 },
		search: Search {
			top_k: 10,
			min_score: 0.0,
			candidate_multiplier: 4,
			hybrid: SearchHybrid {
				enabled: true,
				rollout_percent: 100,
				dense_weight: 1.5,
				lexical_weight: 0.2,
				rrf_k: 30.0,
			},
			expansion: SearchExpansion {
				enabled: true,
				max_variants: 3,
				cache_capacity: 64,
				cache_ttl_secs: 60,
			},
			rerank: SearchRerank { enabled: false, top_k: 10 },
			diversity: SearchDiversity { enabled: false, mmr_lambda: 0.7 },
		},
	}
}
