use std::sync::Arc;

use crate::{BoxFuture, Result, records::VectorRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceMetric {
	Cosine,
}

/// Pushed down to the engine as an equality filter.
#[derive(Clone, Debug, Default)]
pub struct QueryFilter {
	pub folder_ids: Option<Vec<String>>,
}

#[derive(Clone, Debug)]
pub enum DeletePredicate {
	Id(String),
	FilePath(String),
	FolderId(String),
	All,
}

#[derive(Clone, Debug)]
pub struct SearchRow {
	pub record: VectorRecord,
	pub distance: f32,
}

/// The embedded vector-store engine. Point storage, ANN indexing, and
/// distance math live behind this boundary; the engine infers a collection's
/// schema from the rows it is created with.
pub trait VectorEngine
where
	Self: Send + Sync,
{
	fn create_collection<'a>(
		&'a self,
		name: &'a str,
		seed_rows: Vec<VectorRecord>,
	) -> BoxFuture<'a, Result<()>>;

	fn drop_collection<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>>;

	fn list_collections<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>>;

	fn open_collection<'a>(&'a self, name: &'a str)
	-> BoxFuture<'a, Result<Arc<dyn CollectionHandle>>>;
}

pub trait CollectionHandle
where
	Self: Send + Sync,
{
	fn nearest_neighbors<'a>(
		&'a self,
		vector: &'a [f32],
		column: &'a str,
		metric: DistanceMetric,
		limit: usize,
		filter: Option<&'a QueryFilter>,
	) -> BoxFuture<'a, Result<Vec<SearchRow>>>;

	fn insert<'a>(&'a self, rows: Vec<VectorRecord>) -> BoxFuture<'a, Result<()>>;

	fn delete<'a>(&'a self, predicate: &'a DeletePredicate) -> BoxFuture<'a, Result<u64>>;

	fn schema<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>>;
}
