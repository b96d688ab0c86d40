//! In-memory stand-ins for the stores, the vector index and the providers.

use std::{
	collections::BTreeMap,
	sync::{
		Arc, Mutex, MutexGuard,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration,
};

use color_eyre::eyre;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use tadka_config::{EmbeddingProviderConfig, LlmProviderConfig};
use tadka_domain::{
	exclusion,
	model::{
		CandidateItem, ExclusionKind, ExclusionRecord, InteractionSignal, TaggedSignal,
		TasteProfile,
	},
};
use tadka_service::{
	BoxFuture, CatalogStore, EmbeddingProvider, Error, ExclusionStore, IndexHit, ProfileStore,
	Providers, RefinementProvider, Result, Stores, VectorIndex,
};

#[derive(Default)]
struct MemoryState {
	profiles: BTreeMap<String, TasteProfile>,
	recipes: BTreeMap<Uuid, CandidateItem>,
	signals: Vec<InteractionSignal>,
	exclusions: BTreeMap<(String, Uuid), ExclusionRecord>,
}

/// Profiles, catalog, interaction log and exclusions behind one lock. Exclusion writes follow the
/// same precedence rules as the Postgres upserts.
#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<MemoryState>,
	fail_cooldown_writes: AtomicBool,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert_profile(&self, profile: TasteProfile) {
		self.lock().profiles.insert(profile.user_id.clone(), profile);
	}

	pub fn insert_recipe(&self, item: CandidateItem) {
		self.lock().recipes.insert(item.recipe_id, item);
	}

	pub fn exclusions_for(&self, user_id: &str) -> Vec<ExclusionRecord> {
		self.lock()
			.exclusions
			.values()
			.filter(|record| record.user_id == user_id)
			.cloned()
			.collect()
	}

	pub fn signals_for(&self, user_id: &str) -> Vec<InteractionSignal> {
		self.lock().signals.iter().filter(|signal| signal.user_id == user_id).cloned().collect()
	}

	/// Makes every later `insert_cooldowns` call fail.
	pub fn fail_cooldown_writes(&self, fail: bool) {
		self.fail_cooldown_writes.store(fail, Ordering::SeqCst);
	}

	fn lock(&self) -> MutexGuard<'_, MemoryState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn upsert_exclusion(state: &mut MemoryState, incoming: ExclusionRecord) {
		let key = (incoming.user_id.clone(), incoming.recipe_id);
		let merged = exclusion::merge(state.exclusions.get(&key), incoming);

		state.exclusions.insert(key, merged);
	}
}

impl ProfileStore for MemoryStore {
	fn load_profile<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<TasteProfile>>> {
		Box::pin(async move { Ok(self.lock().profiles.get(user_id).cloned()) })
	}

	fn load_signals<'a>(
		&'a self,
		user_id: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<TaggedSignal>>> {
		Box::pin(async move {
			let state = self.lock();

			Ok(state
				.signals
				.iter()
				.filter(|signal| signal.user_id == user_id && signal.occurred_at >= since)
				.filter_map(|signal| {
					state.recipes.get(&signal.recipe_id).map(|item| TaggedSignal {
						action: signal.action,
						occurred_at: signal.occurred_at,
						dwell_secs: signal.dwell_secs,
						tags: item.tags.clone(),
					})
				})
				.collect())
		})
	}

	fn append_signal<'a>(&'a self, signal: &'a InteractionSignal) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.lock().signals.push(signal.clone());

			Ok(())
		})
	}
}

impl CatalogStore for MemoryStore {
	fn load_recipes<'a>(
		&'a self,
		recipe_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<CandidateItem>>> {
		Box::pin(async move {
			let state = self.lock();

			Ok(recipe_ids.iter().filter_map(|id| state.recipes.get(id).cloned()).collect())
		})
	}
}

impl ExclusionStore for MemoryStore {
	fn load_exclusions<'a>(
		&'a self,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<ExclusionRecord>>> {
		Box::pin(async move {
			Ok(self
				.exclusions_for(user_id)
				.into_iter()
				.filter(|record| {
					record.kind == ExclusionKind::Permanent
						|| record.effective_until.is_some_and(|until| until > now)
				})
				.collect())
		})
	}

	fn insert_permanent<'a>(
		&'a self,
		user_id: &'a str,
		recipe_id: Uuid,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			Self::upsert_exclusion(&mut self.lock(), exclusion::permanent_record(user_id, recipe_id));

			Ok(())
		})
	}

	fn insert_cooldowns<'a>(&'a self, records: &'a [ExclusionRecord]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			if self.fail_cooldown_writes.load(Ordering::SeqCst) {
				return Err(Error::Storage { message: "Cooldown writes are disabled.".to_string() });
			}

			let mut state = self.lock();

			for record in records {
				Self::upsert_exclusion(&mut state, record.clone());
			}

			Ok(())
		})
	}

	fn purge_expired<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut state = self.lock();
			let before = state.exclusions.len();

			state.exclusions.retain(|_, record| {
				record.kind == ExclusionKind::Permanent
					|| record.effective_until.is_some_and(|until| until > now)
			});

			Ok((before - state.exclusions.len()) as u64)
		})
	}
}

/// Brute-force cosine index. Ties are broken by recipe id so results are stable.
#[derive(Default)]
pub struct MemoryIndex {
	vectors: Mutex<BTreeMap<Uuid, Vec<f32>>>,
	delay: Mutex<Option<Duration>>,
	searches: AtomicUsize,
}
impl MemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, recipe_id: Uuid, vector: Vec<f32>) {
		self.vectors.lock().unwrap_or_else(|err| err.into_inner()).insert(recipe_id, vector);
	}

	/// Every later search sleeps for `delay` before answering.
	pub fn set_delay(&self, delay: Option<Duration>) {
		*self.delay.lock().unwrap_or_else(|err| err.into_inner()) = delay;
	}

	pub fn search_count(&self) -> usize {
		self.searches.load(Ordering::SeqCst)
	}

	fn nearest(&self, vector: &[f32], k: u64, exclude: &[Uuid]) -> Vec<IndexHit> {
		let vectors = self.vectors.lock().unwrap_or_else(|err| err.into_inner());
		let mut hits: Vec<IndexHit> = vectors
			.iter()
			.filter(|(id, _)| !exclude.contains(id))
			.map(|(id, stored)| IndexHit { recipe_id: *id, score: cosine(vector, stored) })
			.collect();

		hits.sort_by(|left, right| {
			right
				.score
				.partial_cmp(&left.score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| left.recipe_id.cmp(&right.recipe_id))
		});
		hits.truncate(usize::try_from(k).unwrap_or(usize::MAX));

		hits
	}
}

impl VectorIndex for MemoryIndex {
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		k: u64,
		exclude: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			self.searches.fetch_add(1, Ordering::SeqCst);

			let delay = *self.delay.lock().unwrap_or_else(|err| err.into_inner());

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			Ok(self.nearest(vector, k, exclude))
		})
	}
}

/// Returns the same vector for every text.
pub struct StubEmbedding {
	vector: Vec<f32>,
	calls: AtomicUsize,
}
impl StubEmbedding {
	pub fn new(vector: Vec<f32>) -> Self {
		Self { vector, calls: AtomicUsize::new(0) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Ok(texts.iter().map(|_| self.vector.clone()).collect())
		})
	}
}

type Script = dyn Fn(&[Value]) -> color_eyre::Result<Value> + Send + Sync;

enum RefinerMode {
	Script(Box<Script>),
	Hang,
}

/// A refiner whose reply is computed by a closure over the request messages, or that never
/// answers.
pub struct ScriptedRefiner {
	mode: RefinerMode,
	calls: AtomicUsize,
}
impl ScriptedRefiner {
	pub fn new<F>(script: F) -> Self
	where
		F: Fn(&[Value]) -> color_eyre::Result<Value> + Send + Sync + 'static,
	{
		Self { mode: RefinerMode::Script(Box::new(script)), calls: AtomicUsize::new(0) }
	}

	pub fn replying(reply: Value) -> Self {
		Self::new(move |_| Ok(reply.clone()))
	}

	pub fn failing() -> Self {
		Self::new(|_| Err(eyre::eyre!("Refiner is unavailable.")))
	}

	pub fn hanging() -> Self {
		Self { mode: RefinerMode::Hang, calls: AtomicUsize::new(0) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

impl RefinementProvider for ScriptedRefiner {
	fn refine<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			match &self.mode {
				RefinerMode::Script(script) => script(messages),
				RefinerMode::Hang => std::future::pending().await,
			}
		})
	}
}

/// Candidate ids listed in the user message the refinement gateway sends, in listed order.
pub fn listed_candidate_ids(messages: &[Value]) -> Vec<Uuid> {
	messages
		.iter()
		.filter(|message| message.get("role").and_then(Value::as_str) == Some("user"))
		.filter_map(|message| message.get("content").and_then(Value::as_str))
		.filter_map(|content| serde_json::from_str::<Value>(content).ok())
		.flat_map(|payload| {
			payload
				.get("candidates")
				.and_then(Value::as_array)
				.cloned()
				.unwrap_or_default()
		})
		.filter_map(|candidate| {
			candidate.get("recipe_id").and_then(Value::as_str).and_then(|raw| Uuid::parse_str(raw).ok())
		})
		.collect()
}

/// Store and index handles sharing one [`MemoryStore`].
pub fn memory_stores(store: Arc<MemoryStore>, index: Arc<MemoryIndex>) -> Stores {
	Stores { profiles: store.clone(), catalog: store.clone(), exclusions: store, index }
}

pub fn providers(embedding: Arc<StubEmbedding>, refiner: Arc<ScriptedRefiner>) -> Providers {
	Providers::new(embedding, refiner)
}

fn cosine(left: &[f32], right: &[f32]) -> f32 {
	if left.len() != right.len() {
		return 0.0;
	}

	let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
	let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
	let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();

	if left_norm == 0.0 || right_norm == 0.0 {
		return 0.0;
	}

	dot / (left_norm * right_norm)
}
