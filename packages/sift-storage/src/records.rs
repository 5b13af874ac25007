use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use sift_domain::lexical::LEXICAL_DIM;

pub const DENSE_COLUMN: &str = "dense_vector";
pub const LEXICAL_COLUMN: &str = "lexical_vector";

/// Seed row inserted to force schema inference at collection creation; it is
/// deleted immediately afterwards and must never persist.
pub const SENTINEL_ID: &str = "__schema_sentinel__";

pub const SCHEMA_V1: i32 = 1;
pub const SCHEMA_V2: i32 = 2;

/// One indexed chunk. The backing engine infers the collection schema from
/// these rows, so optional columns must be populated consistently within a
/// collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
	/// `<relative_path>:<chunk_index>`, unique per collection.
	pub id: String,
	pub dense_vector: Vec<f32>,
	/// Present on schema v2 rows only; length is always [`LEXICAL_DIM`].
	pub lexical_vector: Option<Vec<f32>>,
	pub text: String,
	pub file_path: String,
	pub relative_path: String,
	pub chunk_index: i32,
	pub token_count: u32,
	pub start_line: Option<u32>,
	pub end_line: Option<u32>,
	pub token_offset: Option<u32>,
	pub folder_id: String,
	#[serde(with = "time::serde::rfc3339")]
	pub indexed_at: OffsetDateTime,
	pub schema_version: i32,
}
impl VectorRecord {
	pub fn record_id(relative_path: &str, chunk_index: i32) -> String {
		format!("{relative_path}:{chunk_index}")
	}

	pub fn sentinel(dense_dim: usize, with_lexical: bool) -> Self {
		Self {
			id: SENTINEL_ID.to_string(),
			dense_vector: vec![0.0; dense_dim],
			lexical_vector: with_lexical.then(|| vec![0.0; LEXICAL_DIM]),
			text: String::new(),
			file_path: String::new(),
			relative_path: String::new(),
			chunk_index: 0,
			token_count: 0,
			start_line: with_lexical.then_some(0),
			end_line: with_lexical.then_some(0),
			token_offset: with_lexical.then_some(0),
			folder_id: String::new(),
			indexed_at: OffsetDateTime::UNIX_EPOCH,
			schema_version: if with_lexical { SCHEMA_V2 } else { SCHEMA_V1 },
		}
	}
}
