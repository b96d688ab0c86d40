use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub signals: Signals,
	#[serde(default)]
	pub exclusion: Exclusion,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub ranking: Ranking,
	#[serde(default)]
	pub refinement: Refinement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	/// Collection holding one point per recipe; point ids are recipe UUIDs.
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub refiner: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_max_output_tokens")]
	pub max_output_tokens: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Signals {
	pub swipe_lookback_days: i64,
	pub cooking_lookback_days: i64,
	/// Views with a recorded dwell below this many seconds carry no interest signal.
	pub min_view_dwell_secs: f32,
	pub confidence_half_saturation: f32,
	pub weights: SignalWeights,
}
impl Default for Signals {
	fn default() -> Self {
		Self {
			swipe_lookback_days: 30,
			cooking_lookback_days: 60,
			min_view_dwell_secs: 3.0,
			confidence_half_saturation: 4.0,
			weights: SignalWeights::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
	pub like: f32,
	pub save: f32,
	pub skip: f32,
	pub view: f32,
	pub strong_dislike: f32,
	pub cooked: f32,
	pub would_cook_again: f32,
	pub would_not_cook_again: f32,
}
impl Default for SignalWeights {
	fn default() -> Self {
		Self {
			like: 0.20,
			save: 0.15,
			skip: -0.05,
			view: 0.05,
			strong_dislike: -0.50,
			cooked: 0.40,
			would_cook_again: 0.30,
			would_not_cook_again: -0.20,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Exclusion {
	pub cooldown_days: i64,
}
impl Default for Exclusion {
	fn default() -> Self {
		Self { cooldown_days: 7 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// Survivors kept per retrieval attempt before hybrid scoring.
	pub candidate_pool: u32,
	pub overfetch_factor: u32,
	pub min_candidates: u32,
	pub min_score: f32,
	pub timeout_ms: u64,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			candidate_pool: 100,
			overfetch_factor: 2,
			min_candidates: 5,
			min_score: 0.3,
			timeout_ms: 2_000,
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub weights: RankingWeights,
	pub pantry: RankingPantry,
	pub diversity: RankingDiversity,
	pub freshness: RankingFreshness,
	pub limits: RankingLimits,
	/// Worker threads for the per-candidate scoring pass. Zero means one per CPU core.
	pub scoring_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
	pub vector: f32,
	pub feedback: f32,
	pub diversity: f32,
	pub freshness: f32,
}
impl Default for RankingWeights {
	fn default() -> Self {
		Self { vector: 0.40, feedback: 0.30, diversity: 0.20, freshness: 0.10 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingPantry {
	pub weight: f32,
	pub match_cap: u32,
}
impl Default for RankingPantry {
	fn default() -> Self {
		Self { weight: 0.1, match_cap: 3 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingDiversity {
	pub min_word_chars: usize,
	pub min_shared_words: usize,
	/// Score by number of matching prior candidates: index 0 is no match, the last entry covers
	/// every count at or above its index.
	pub scores: Vec<f32>,
}
impl Default for RankingDiversity {
	fn default() -> Self {
		Self { min_word_chars: 4, min_shared_words: 2, scores: vec![1.0, 0.7, 0.4, 0.2] }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingFreshness {
	pub buckets: Vec<FreshnessBucket>,
	pub stale_score: f32,
	pub unknown_score: f32,
}
impl Default for RankingFreshness {
	fn default() -> Self {
		Self {
			buckets: vec![
				FreshnessBucket { max_age_days: 7, score: 1.0 },
				FreshnessBucket { max_age_days: 30, score: 0.8 },
				FreshnessBucket { max_age_days: 90, score: 0.6 },
			],
			stale_score: 0.4,
			unknown_score: 0.5,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreshnessBucket {
	/// Exclusive upper bound on age in whole days.
	pub max_age_days: i64,
	pub score: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingLimits {
	pub default_limit: u32,
	pub min_limit: u32,
	pub max_limit: u32,
}
impl Default for RankingLimits {
	fn default() -> Self {
		Self { default_limit: 15, min_limit: 5, max_limit: 30 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Refinement {
	pub enabled: bool,
	pub max_candidates: u32,
	pub timeout_ms: u64,
}
impl Default for Refinement {
	fn default() -> Self {
		Self { enabled: true, max_candidates: 30, timeout_ms: 5_000 }
	}
}

fn default_max_output_tokens() -> u32 {
	2_048
}
