use std::sync::Arc;

use sift_service::{IndexDocumentRequest, Providers};
use sift_storage::{engine::DistanceMetric, records::DENSE_COLUMN};
use sift_testkit::MemoryEngine;

use super::{MapEmbedding, UnusedCrossEncoder, build_service};

fn providers() -> Providers {
	Providers::new(MapEmbedding::new(&[], vec![1.0, 0.0, 0.0]), Arc::new(UnusedCrossEncoder))
}

fn index_request(text: &str) -> IndexDocumentRequest {
	IndexDocumentRequest {
		agent_id: "agent-a".to_string(),
		folder_id: "folder-1".to_string(),
		file_path: "/corpus/notes/todo.md".to_string(),
		relative_path: "notes/todo.md".to_string(),
		text: text.to_string(),
	}
}

fn ten_words() -> String {
	(0..10).map(|idx| format!("word{idx}")).collect::<Vec<_>>().join(" ")
}

#[tokio::test]
async fn indexing_writes_one_row_per_chunk() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.chunking.window_tokens = 4;
	cfg.chunking.stride_tokens = 4;

	let engine = Arc::new(MemoryEngine::new());
	let service = build_service(cfg, engine.clone(), providers());
	let report = service.index_document(index_request(&ten_words())).await.expect("indexing failed");

	assert_eq!(report.chunks, 3);
	assert_eq!(report.replaced, 0);

	let collection = sift_storage::collections::CollectionManager::collection_name("agent-a");

	assert_eq!(engine.row_count(&collection), 3);

	let handle = service.collections.ensure("agent-a", 3).await.expect("ensure failed");
	let rows = handle
		.nearest_neighbors(&[1.0, 0.0, 0.0], DENSE_COLUMN, DistanceMetric::Cosine, 10, None)
		.await
		.expect("query failed");
	let mut ids: Vec<&str> = rows.iter().map(|row| row.record.id.as_str()).collect();

	ids.sort();

	assert_eq!(ids, vec!["notes/todo.md:0", "notes/todo.md:1", "notes/todo.md:2"]);

	for row in &rows {
		assert!(row.record.token_count <= 4);
		assert!(row.record.lexical_vector.is_some());
		assert_eq!(row.record.schema_version, 2);
		assert_eq!(row.record.start_line, Some(1));
	}
}

#[tokio::test]
async fn reindexing_replaces_the_previous_rows() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.chunking.window_tokens = 4;
	cfg.chunking.stride_tokens = 4;

	let engine = Arc::new(MemoryEngine::new());
	let service = build_service(cfg, engine.clone(), providers());

	service.index_document(index_request(&ten_words())).await.expect("first indexing failed");

	let report = service
		.index_document(index_request("short replacement text"))
		.await
		.expect("second indexing failed");

	assert_eq!(report.replaced, 3);
	assert_eq!(report.chunks, 1);

	let collection = sift_storage::collections::CollectionManager::collection_name("agent-a");

	assert_eq!(engine.row_count(&collection), 1);
}

#[tokio::test]
async fn disabled_chunking_indexes_the_whole_file_as_one_row() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.chunking.enabled = false;

	let engine = Arc::new(MemoryEngine::new());
	let service = build_service(cfg, engine.clone(), providers());
	let report = service.index_document(index_request(&ten_words())).await.expect("indexing failed");

	assert_eq!(report.chunks, 1);

	let handle = service.collections.ensure("agent-a", 3).await.expect("ensure failed");
	let rows = handle
		.nearest_neighbors(&[1.0, 0.0, 0.0], DENSE_COLUMN, DistanceMetric::Cosine, 10, None)
		.await
		.expect("query failed");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].record.token_count, 10);
}

#[tokio::test]
async fn empty_files_leave_no_rows_behind() {
	let engine = Arc::new(MemoryEngine::new());
	let service = build_service(sift_testkit::test_config(3), engine.clone(), providers());

	service.index_document(index_request("some initial content")).await.expect("indexing failed");

	let report = service.index_document(index_request("   ")).await.expect("re-indexing failed");

	assert_eq!(report.chunks, 0);
	assert_eq!(report.replaced, 1);

	let collection = sift_storage::collections::CollectionManager::collection_name("agent-a");

	assert_eq!(engine.row_count(&collection), 0);
}

#[tokio::test]
async fn removing_a_folder_deletes_its_rows() {
	let engine = Arc::new(MemoryEngine::new());
	let service = build_service(sift_testkit::test_config(3), engine.clone(), providers());

	service.index_document(index_request("some content to remove")).await.expect("indexing failed");

	let removed = service.remove_folder("agent-a", "folder-1").await.expect("removal failed");

	assert_eq!(removed, 1);

	let collection = sift_storage::collections::CollectionManager::collection_name("agent-a");

	assert_eq!(engine.row_count(&collection), 0);
}

#[tokio::test]
async fn line_provenance_survives_indexing() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.chunking.window_tokens = 2;
	cfg.chunking.stride_tokens = 2;

	let engine = Arc::new(MemoryEngine::new());
	let service = build_service(cfg, engine, providers());
	let mut req = index_request("alpha beta\ngamma delta\nepsilon");

	req.relative_path = "notes/lines.md".to_string();
	req.file_path = "/corpus/notes/lines.md".to_string();

	service.index_document(req).await.expect("indexing failed");

	let handle = service.collections.ensure("agent-a", 3).await.expect("ensure failed");
	let rows = handle
		.nearest_neighbors(&[1.0, 0.0, 0.0], DENSE_COLUMN, DistanceMetric::Cosine, 10, None)
		.await
		.expect("query failed");
	let mut lines: Vec<(i32, Option<u32>, Option<u32>)> = rows
		.iter()
		.map(|row| (row.record.chunk_index, row.record.start_line, row.record.end_line))
		.collect();

	lines.sort();

	assert_eq!(lines, vec![(0, Some(1), Some(1)), (1, Some(2), Some(2)), (2, Some(3), Some(3))]);
}
