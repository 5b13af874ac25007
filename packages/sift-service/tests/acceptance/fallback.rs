use std::sync::{Arc, atomic::AtomicUsize, atomic::Ordering};

use sift_service::{IndexDocumentRequest, Providers, SearchRequest};
use sift_testkit::MemoryEngine;

use super::{FailingEmbedding, MapEmbedding, SpyEmbedding, UnusedCrossEncoder, build_service};

const QUERY: &str = "parseConfig";
const LITERAL_TEXT: &str = "parseConfig loads the raw options map";
const SEMANTIC_TEXT: &str = "Reads persisted settings from disk before startup";

fn embedding() -> Arc<MapEmbedding> {
	MapEmbedding::new(
		&[
			(QUERY, vec![1.0, 0.0, 0.0]),
			(LITERAL_TEXT, vec![0.2, 0.9, 0.0]),
			(SEMANTIC_TEXT, vec![0.95, 0.3, 0.0]),
		],
		vec![0.0, 0.0, 1.0],
	)
}

async fn index_two_folders(service: &sift_service::SiftService) {
	for (relative_path, folder_id, text) in [
		("src/a.rs", "folder-1", LITERAL_TEXT),
		("docs/b.md", "folder-2", SEMANTIC_TEXT),
	] {
		service
			.index_document(IndexDocumentRequest {
				agent_id: "agent-a".to_string(),
				folder_id: folder_id.to_string(),
				file_path: format!("/corpus/{relative_path}"),
				relative_path: relative_path.to_string(),
				text: text.to_string(),
			})
			.await
			.expect("indexing failed");
	}
}

fn request(query: &str) -> SearchRequest {
	SearchRequest {
		agent_id: "agent-a".to_string(),
		query: query.to_string(),
		top_k: None,
		min_score: None,
		folder_ids: None,
	}
}

#[tokio::test]
async fn empty_query_returns_no_hits_without_embedding() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.expansion.enabled = false;

	let calls = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(SpyEmbedding { inner: embedding(), calls: calls.clone() }),
		Arc::new(UnusedCrossEncoder),
	);
	let service = build_service(cfg, Arc::new(MemoryEngine::new()), providers);
	let response = service.search(request("   ")).await.expect("search failed");

	assert!(response.hits.is_empty());
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_corpus_returns_no_hits() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.expansion.enabled = false;

	let providers = Providers::new(embedding(), Arc::new(UnusedCrossEncoder));
	let service = build_service(cfg, Arc::new(MemoryEngine::new()), providers);
	let response = service.search(request(QUERY)).await.expect("search failed");

	assert!(response.hits.is_empty());
}

/// A query made entirely of stop words has no lexical signal; the dense
/// channel alone must still answer.
#[tokio::test]
async fn stop_word_query_falls_back_to_dense_results() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.expansion.enabled = false;

	let engine = Arc::new(MemoryEngine::new());
	let providers = Providers::new(embedding(), Arc::new(UnusedCrossEncoder));
	let service = build_service(cfg, engine, providers);

	index_two_folders(&service).await;

	let response = service.search(request("the")).await.expect("search failed");

	assert_eq!(response.hits.len(), 2);
}

#[tokio::test]
async fn dense_failure_falls_back_to_lexical_results() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.expansion.enabled = false;

	let engine = Arc::new(MemoryEngine::new());
	let indexer = build_service(
		sift_testkit::test_config(3),
		engine.clone(),
		Providers::new(embedding(), Arc::new(UnusedCrossEncoder)),
	);

	index_two_folders(&indexer).await;

	cfg.search.min_score = 0.05;

	let searcher = build_service(
		cfg,
		engine,
		Providers::new(Arc::new(FailingEmbedding), Arc::new(UnusedCrossEncoder)),
	);
	let response = searcher.search(request(QUERY)).await.expect("search failed");

	assert_eq!(response.hits.len(), 1);
	assert_eq!(response.hits[0].id, "src/a.rs:0");
}

#[tokio::test]
async fn folder_allow_list_restricts_results() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.expansion.enabled = false;
	cfg.search.min_score = 0.05;

	let engine = Arc::new(MemoryEngine::new());
	let providers = Providers::new(embedding(), Arc::new(UnusedCrossEncoder));
	let service = build_service(cfg, engine, providers);

	index_two_folders(&service).await;

	let mut req = request(QUERY);

	req.folder_ids = Some(vec!["folder-2".to_string()]);

	let response = service.search(req).await.expect("search failed");

	assert_eq!(response.hits.len(), 1);
	assert_eq!(response.hits[0].folder_id, "folder-2");
}

/// Expanded variants run concurrently and merge by max score per id.
#[tokio::test]
async fn expanded_variants_merge_by_max_score() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.min_score = 0.3;

	let engine = Arc::new(MemoryEngine::new());
	let providers = Providers::new(
		MapEmbedding::new(
			&[
				("find config", vec![1.0, 1.0, 0.0]),
				("find settings", vec![1.0, 0.0, 0.0]),
				(SEMANTIC_TEXT, vec![0.95, 0.3, 0.0]),
			],
			vec![0.0, 0.0, 1.0],
		),
		Arc::new(UnusedCrossEncoder),
	);
	let service = build_service(cfg, engine, providers);

	service
		.index_document(IndexDocumentRequest {
			agent_id: "agent-a".to_string(),
			folder_id: "folder-1".to_string(),
			file_path: "/corpus/docs/b.md".to_string(),
			relative_path: "docs/b.md".to_string(),
			text: SEMANTIC_TEXT.to_string(),
		})
		.await
		.expect("indexing failed");

	let response = service.search(request("find config")).await.expect("search failed");

	assert_eq!(response.hits.len(), 1);
	// The "find settings" variant is the closer one; max-score merge must
	// keep its score rather than the original query's.
	assert!(response.hits[0].score > 0.94, "score was {}", response.hits[0].score);
}
