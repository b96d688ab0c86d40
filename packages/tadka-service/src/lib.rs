pub mod context;
pub mod exclusion;
pub mod history;
pub mod interactions;
pub mod pg;
pub mod recommend;
pub mod refinement;
pub mod retrieval;

mod error;

pub use error::{Error, Result};
pub use interactions::{InteractionRequest, InteractionResponse, PurgeReport};
pub use recommend::RecommendRequest;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use tadka_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use tadka_domain::{
	model::{CandidateItem, ExclusionRecord, InteractionSignal, TaggedSignal, TasteProfile},
	ranker::HybridRanker,
};
use tadka_providers::{embedding, refiner};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One nearest-neighbour result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexHit {
	pub recipe_id: Uuid,
	pub score: f32,
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// Up to `k` hits, best first, none of them in `exclude`.
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		k: u64,
		exclude: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<IndexHit>>>;
}

pub trait ProfileStore
where
	Self: Send + Sync,
{
	fn load_profile<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<TasteProfile>>>;

	fn load_signals<'a>(
		&'a self,
		user_id: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<TaggedSignal>>>;

	fn append_signal<'a>(&'a self, signal: &'a InteractionSignal) -> BoxFuture<'a, Result<()>>;
}

pub trait CatalogStore
where
	Self: Send + Sync,
{
	/// Items for the ids that exist, in any order.
	fn load_recipes<'a>(&'a self, recipe_ids: &'a [Uuid])
	-> BoxFuture<'a, Result<Vec<CandidateItem>>>;
}

pub trait ExclusionStore
where
	Self: Send + Sync,
{
	fn load_exclusions<'a>(
		&'a self,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<ExclusionRecord>>>;

	/// Must be idempotent and must upgrade an existing cooldown.
	fn insert_permanent<'a>(&'a self, user_id: &'a str, recipe_id: Uuid)
	-> BoxFuture<'a, Result<()>>;

	/// Must never replace a permanent record.
	fn insert_cooldowns<'a>(&'a self, records: &'a [ExclusionRecord]) -> BoxFuture<'a, Result<()>>;

	fn purge_expired<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<u64>>;
}

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

pub trait RefinementProvider
where
	Self: Send + Sync,
{
	fn refine<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

#[derive(Clone)]
pub struct Stores {
	pub profiles: Arc<dyn ProfileStore>,
	pub catalog: Arc<dyn CatalogStore>,
	pub exclusions: Arc<dyn ExclusionStore>,
	pub index: Arc<dyn VectorIndex>,
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub refiner: Arc<dyn RefinementProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, refiner: Arc<dyn RefinementProvider>) -> Self {
		Self { embedding, refiner }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(HttpProviders);

		Self { embedding: provider.clone(), refiner: provider }
	}
}

/// Entry point for every ranking operation. Holds no per-user state; each request builds its own
/// context.
pub struct RecommendService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
	ranker: Arc<HybridRanker>,
}
impl RecommendService {
	pub fn new(cfg: Config, stores: Stores) -> Result<Self> {
		Self::with_providers(cfg, stores, Providers::default())
	}

	pub fn with_providers(cfg: Config, stores: Stores, providers: Providers) -> Result<Self> {
		let ranker = HybridRanker::from_config(&cfg.ranking)
			.map_err(|err| Error::Scoring { message: err.to_string() })?;

		Ok(Self { cfg, stores, providers, ranker: Arc::new(ranker) })
	}

	fn exclusion_tracker(&self) -> exclusion::ExclusionTracker {
		exclusion::ExclusionTracker::new(self.stores.exclusions.clone())
	}
}

struct HttpProviders;

impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl RefinementProvider for HttpProviders {
	fn refine<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(refiner::complete_json(cfg, messages))
	}
}
