use std::sync::Arc;

use sift_service::{IndexDocumentRequest, Providers, SearchRequest};
use sift_testkit::MemoryEngine;

use super::{MapEmbedding, UnusedCrossEncoder, build_service};

const QUERY: &str = "parseConfig";
const LITERAL_TEXT: &str = "parseConfig loads the raw options map";
const SEMANTIC_TEXT: &str = "Reads persisted settings from disk before startup";

fn embedding() -> Arc<MapEmbedding> {
	// The semantic chunk dominates the dense channel; the literal chunk only
	// wins through its keyword overlap.
	MapEmbedding::new(
		&[
			(QUERY, vec![1.0, 0.0, 0.0]),
			(LITERAL_TEXT, vec![0.2, 0.9, 0.0]),
			(SEMANTIC_TEXT, vec![0.95, 0.3, 0.0]),
		],
		vec![0.0, 0.0, 1.0],
	)
}

async fn index_corpus(service: &sift_service::SiftService) {
	for (relative_path, text) in [("src/a.rs", LITERAL_TEXT), ("docs/b.md", SEMANTIC_TEXT)] {
		service
			.index_document(IndexDocumentRequest {
				agent_id: "agent-a".to_string(),
				folder_id: "folder-1".to_string(),
				file_path: format!("/corpus/{relative_path}"),
				relative_path: relative_path.to_string(),
				text: text.to_string(),
			})
			.await
			.expect("indexing failed");
	}
}

fn request() -> SearchRequest {
	SearchRequest {
		agent_id: "agent-a".to_string(),
		query: QUERY.to_string(),
		top_k: None,
		min_score: None,
		folder_ids: None,
	}
}

/// The delta that justifies hybrid mode: a literal identifier match must win
/// once the lexical channel votes, and must lose the dense-only ranking.
#[tokio::test]
async fn hybrid_ranks_the_literal_match_first() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.min_score = 0.05;
	cfg.search.expansion.enabled = false;

	let engine = Arc::new(MemoryEngine::new());
	let providers = Providers::new(embedding(), Arc::new(UnusedCrossEncoder));
	let service = build_service(cfg, engine, providers);

	index_corpus(&service).await;

	let response = service.search(request()).await.expect("search failed");

	assert!(!response.hits.is_empty());
	assert_eq!(response.hits[0].id, "src/a.rs:0");
	assert_eq!(response.hits[0].relative_path, "src/a.rs");
	assert_eq!(response.hits[0].chunk_index, 0);
	assert_eq!(response.hits[0].start_line, Some(1));
	assert_eq!(response.hits[0].end_line, Some(1));
}

#[tokio::test]
async fn dense_only_ranks_the_semantic_match_first() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.min_score = 0.05;
	cfg.search.expansion.enabled = false;
	cfg.search.hybrid.enabled = false;

	let engine = Arc::new(MemoryEngine::new());
	let providers = Providers::new(embedding(), Arc::new(UnusedCrossEncoder));
	let service = build_service(cfg, engine, providers);

	index_corpus(&service).await;

	let response = service.search(request()).await.expect("search failed");

	assert!(!response.hits.is_empty());
	assert_eq!(response.hits[0].id, "docs/b.md:0");
}

#[tokio::test]
async fn zero_rollout_keeps_an_agent_on_the_dense_path() {
	let mut cfg = sift_testkit::test_config(3);

	cfg.search.min_score = 0.05;
	cfg.search.expansion.enabled = false;
	cfg.search.hybrid.rollout_percent = 0;

	let engine = Arc::new(MemoryEngine::new());
	let providers = Providers::new(embedding(), Arc::new(UnusedCrossEncoder));
	let service = build_service(cfg, engine, providers);

	index_corpus(&service).await;

	let response = service.search(request()).await.expect("search failed");

	assert_eq!(response.hits[0].id, "docs/b.md:0");
}
