use time::OffsetDateTime;

use crate::{ServiceError, ServiceResult, SiftService, l2_normalize};
use sift_chunking::{Chunk, ChunkingConfig};
use sift_domain::lexical;
use sift_storage::{
	engine::DeletePredicate,
	records::{SCHEMA_V1, SCHEMA_V2, VectorRecord},
};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexDocumentRequest {
	pub agent_id: String,
	pub folder_id: String,
	pub file_path: String,
	pub relative_path: String,
	pub text: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexReport {
	pub chunks: usize,
	/// Rows removed for this file before the new rows went in.
	pub replaced: u64,
}

impl SiftService {
	/// Index one file: chunk, embed, lexical-encode, then delete+reinsert its
	/// rows. The insert is a best-effort batch with no rollback; on partial
	/// failure the error is logged and surfaced so the caller retries the
	/// whole file.
	pub async fn index_document(&self, req: IndexDocumentRequest) -> ServiceResult<IndexReport> {
		let agent_id = req.agent_id.trim();
		let relative_path = req.relative_path.trim();

		if agent_id.is_empty() || relative_path.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "agent_id and relative_path are required.".to_string(),
			});
		}

		let dense_dim = self.cfg.providers.embedding.dimensions as usize;
		let handle = self.collections.ensure(agent_id, dense_dim).await?;
		let chunks = self.chunk_text(&req.text);
		let replaced =
			handle.delete(&DeletePredicate::FilePath(req.file_path.clone())).await?;

		if chunks.is_empty() {
			return Ok(IndexReport { chunks: 0, replaced });
		}

		let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;

		if embeddings.len() != chunks.len() {
			return Err(ServiceError::Provider {
				message: "Embedding provider returned a mismatched vector count.".to_string(),
			});
		}

		let hybrid = self.cfg.search.hybrid.enabled;
		let indexed_at = OffsetDateTime::now_utc();
		let mut rows = Vec::with_capacity(chunks.len());

		for (chunk, embedding) in chunks.into_iter().zip(embeddings.into_iter()) {
			if embedding.len() != dense_dim {
				return Err(ServiceError::Provider {
					message: "Embedding vector dimension mismatch.".to_string(),
				});
			}

			rows.push(VectorRecord {
				id: VectorRecord::record_id(relative_path, chunk.index),
				dense_vector: l2_normalize(embedding),
				lexical_vector: hybrid.then(|| lexical::encode(&chunk.text)),
				text: chunk.text,
				file_path: req.file_path.clone(),
				relative_path: relative_path.to_string(),
				chunk_index: chunk.index,
				token_count: chunk.token_count,
				start_line: hybrid.then_some(chunk.start_line),
				end_line: hybrid.then_some(chunk.end_line),
				token_offset: hybrid.then_some(chunk.token_offset),
				folder_id: req.folder_id.clone(),
				indexed_at,
				schema_version: if hybrid { SCHEMA_V2 } else { SCHEMA_V1 },
			});
		}

		let inserted = rows.len();

		if let Err(err) = handle.insert(rows).await {
			tracing::error!(
				file_path = %req.file_path,
				error = %err,
				"Chunk batch insert failed part way; the file must be re-indexed."
			);

			return Err(err.into());
		}

		Ok(IndexReport { chunks: inserted, replaced })
	}

	pub async fn remove_document(&self, agent_id: &str, file_path: &str) -> ServiceResult<u64> {
		let handle = self
			.collections
			.ensure(agent_id.trim(), self.cfg.providers.embedding.dimensions as usize)
			.await?;

		Ok(handle.delete(&DeletePredicate::FilePath(file_path.to_string())).await?)
	}

	pub async fn remove_folder(&self, agent_id: &str, folder_id: &str) -> ServiceResult<u64> {
		let handle = self
			.collections
			.ensure(agent_id.trim(), self.cfg.providers.embedding.dimensions as usize)
			.await?;

		Ok(handle.delete(&DeletePredicate::FolderId(folder_id.to_string())).await?)
	}

	fn chunk_text(&self, text: &str) -> Vec<Chunk> {
		let cfg = if self.cfg.chunking.enabled {
			ChunkingConfig {
				window_tokens: self.cfg.chunking.window_tokens,
				stride_tokens: self.cfg.chunking.stride_tokens,
			}
		} else {
			// One whole-file chunk; the window swallows everything.
			ChunkingConfig { window_tokens: u32::MAX, stride_tokens: u32::MAX }
		};

		sift_chunking::split_text(text, &cfg)
	}
}
