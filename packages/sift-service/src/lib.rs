pub mod indexing;
pub mod search;

use std::{
	collections::HashSet,
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};

use serde_json::Value;

pub use indexing::{IndexDocumentRequest, IndexReport};
pub use search::{SearchHit, SearchRequest, SearchResponse};

use sift_config::{Config, EmbeddingProviderConfig, ProviderConfig};
use sift_providers::{cross_encoder, embedding};
use sift_storage::{collections::CollectionManager, engine::VectorEngine};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait CrossEncoderProvider
where
	Self: Send + Sync,
{
	fn classify<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		candidate: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Provider { message: String },
	Storage { message: String },
	/// Invariant violation; a programmer error, not an operational condition.
	Internal { message: String },
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub cross_encoder: Arc<dyn CrossEncoderProvider>,
}

/// The retrieval service. One value per process; the expansion cache, the
/// reranker load state, and the lexical warn set all live here so behavior
/// is a function of the config snapshot taken at construction.
pub struct SiftService {
	pub cfg: Config,
	pub collections: CollectionManager,
	pub providers: Providers,
	pub(crate) expansion_cache: search::expansion::ExpansionCache,
	pub(crate) reranker: search::rerank::RerankerState,
	pub(crate) lexical_warned: Mutex<HashSet<String>>,
}

struct DefaultProviders;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Internal { message } => write!(f, "Internal error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sift_storage::Error> for ServiceError {
	fn from(err: sift_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl CrossEncoderProvider for DefaultProviders {
	fn classify<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		candidate: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(cross_encoder::classify(cfg, query, candidate))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		cross_encoder: Arc<dyn CrossEncoderProvider>,
	) -> Self {
		Self { embedding, cross_encoder }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), cross_encoder: provider }
	}
}

impl SiftService {
	pub fn new(cfg: Config, engine: Arc<dyn VectorEngine>) -> Self {
		Self::with_providers(cfg, engine, Providers::default())
	}

	pub fn with_providers(
		cfg: Config,
		engine: Arc<dyn VectorEngine>,
		providers: Providers,
	) -> Self {
		let collections = CollectionManager::new(engine, cfg.search.hybrid.enabled);
		let expansion_cache = search::expansion::ExpansionCache::new(&cfg.search.expansion);

		Self {
			cfg,
			collections,
			providers,
			expansion_cache,
			reranker: search::rerank::RerankerState::new(),
			lexical_warned: Mutex::new(HashSet::new()),
		}
	}
}

/// Install the global tracing subscriber per `service.log_level`; the
/// `RUST_LOG` environment variable wins when set. Later calls are no-ops, so
/// embedding hosts and tests can both call it freely.
pub fn init_tracing(cfg: &Config) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cfg.service.log_level.clone()));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Normalize to unit length; zero vectors stay zero. Query vectors must go
/// through the same normalization as indexed vectors or cosine scores drift.
pub(crate) fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in &mut vector {
			*value /= norm;
		}
	}

	vector
}
