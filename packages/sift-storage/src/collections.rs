use std::sync::Arc;

use crate::{
	Result,
	engine::{CollectionHandle, DeletePredicate, VectorEngine},
	records::{LEXICAL_COLUMN, SENTINEL_ID, VectorRecord},
};

/// Owns one logical collection per agent and keeps its schema in step with
/// the configured hybrid mode.
pub struct CollectionManager {
	engine: Arc<dyn VectorEngine>,
	hybrid_enabled: bool,
}
impl CollectionManager {
	pub fn new(engine: Arc<dyn VectorEngine>, hybrid_enabled: bool) -> Self {
		Self { engine, hybrid_enabled }
	}

	pub fn collection_name(agent_id: &str) -> String {
		let mut name = String::with_capacity(agent_id.len() + 5);

		name.push_str("sift_");

		for ch in agent_id.chars() {
			if ch.is_ascii_alphanumeric() {
				name.push(ch.to_ascii_lowercase());
			} else {
				name.push('_');
			}
		}

		name
	}

	/// Open the agent's collection, creating or migrating it as needed.
	///
	/// A missing collection is created seeded with a single sentinel row (the
	/// engine infers schema from data) and the sentinel is deleted before the
	/// handle is returned. When hybrid is enabled and an existing collection
	/// lacks the lexical column, the collection is dropped and recreated —
	/// destructive, the caller must re-index. Schema introspection failures
	/// are logged and treated as compatible.
	pub async fn ensure(
		&self,
		agent_id: &str,
		dense_dim: usize,
	) -> Result<Arc<dyn CollectionHandle>> {
		let name = Self::collection_name(agent_id);
		let existing = self.engine.list_collections().await?;

		if !existing.iter().any(|collection| *collection == name) {
			return self.create(&name, dense_dim).await;
		}

		let handle = self.engine.open_collection(&name).await?;

		if !self.hybrid_enabled {
			return Ok(handle);
		}

		match handle.schema().await {
			Ok(columns) => {
				if columns.iter().any(|column| column == LEXICAL_COLUMN) {
					return Ok(handle);
				}

				tracing::warn!(
					collection = %name,
					"Dropping and recreating the collection to add the lexical column; all rows must be re-indexed."
				);

				self.engine.drop_collection(&name).await?;
				self.create(&name, dense_dim).await
			},
			Err(err) => {
				tracing::warn!(
					collection = %name,
					error = %err,
					"Schema introspection failed; assuming the collection is compatible."
				);

				Ok(handle)
			},
		}
	}

	async fn create(&self, name: &str, dense_dim: usize) -> Result<Arc<dyn CollectionHandle>> {
		let sentinel = VectorRecord::sentinel(dense_dim, self.hybrid_enabled);

		self.engine.create_collection(name, vec![sentinel]).await?;

		let handle = self.engine.open_collection(name).await?;

		handle.delete(&DeletePredicate::Id(SENTINEL_ID.to_string())).await?;

		Ok(handle)
	}
}
