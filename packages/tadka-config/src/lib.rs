mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Exclusion, FreshnessBucket, LlmProviderConfig, Postgres,
	Providers, Qdrant, Ranking, RankingDiversity, RankingFreshness, RankingLimits, RankingPantry,
	RankingWeights, Refinement, Retrieval, Service, SignalWeights, Signals, Storage,
};

use std::{fs, path::Path};

/// Upper bound on any batch or refinement window.
pub const MAX_WINDOW: u32 = 30;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("storage.qdrant.url", &cfg.storage.qdrant.url),
		("storage.qdrant.collection", &cfg.storage.qdrant.collection),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}
	if cfg.refinement.enabled && cfg.providers.refiner.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider refiner api_key must be non-empty when refinement.enabled is true."
				.to_string(),
		});
	}

	validate_signals(cfg)?;

	if cfg.exclusion.cooldown_days <= 0 {
		return Err(Error::Validation {
			message: "exclusion.cooldown_days must be greater than zero.".to_string(),
		});
	}

	validate_retrieval(cfg)?;
	validate_ranking(cfg)?;

	if cfg.refinement.max_candidates == 0 {
		return Err(Error::Validation {
			message: "refinement.max_candidates must be greater than zero.".to_string(),
		});
	}
	if cfg.refinement.max_candidates > MAX_WINDOW {
		return Err(Error::Validation {
			message: format!("refinement.max_candidates must be {MAX_WINDOW} or less."),
		});
	}
	if cfg.refinement.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "refinement.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_signals(cfg: &Config) -> Result<()> {
	let signals = &cfg.signals;

	if signals.swipe_lookback_days <= 0 || signals.cooking_lookback_days <= 0 {
		return Err(Error::Validation {
			message: "signals lookback windows must be greater than zero days.".to_string(),
		});
	}
	if !signals.min_view_dwell_secs.is_finite() || signals.min_view_dwell_secs < 0.0 {
		return Err(Error::Validation {
			message: "signals.min_view_dwell_secs must be a finite number, zero or greater."
				.to_string(),
		});
	}
	if !signals.confidence_half_saturation.is_finite() || signals.confidence_half_saturation <= 0.0
	{
		return Err(Error::Validation {
			message: "signals.confidence_half_saturation must be a finite number greater than zero."
				.to_string(),
		});
	}

	let weights = &signals.weights;

	for (label, weight) in [
		("like", weights.like),
		("save", weights.save),
		("skip", weights.skip),
		("view", weights.view),
		("strong_dislike", weights.strong_dislike),
		("cooked", weights.cooked),
		("would_cook_again", weights.would_cook_again),
		("would_not_cook_again", weights.would_not_cook_again),
	] {
		if !weight.is_finite() || !(-1.0..=1.0).contains(&weight) {
			return Err(Error::Validation {
				message: format!("signals.weights.{label} must be in the range -1.0-1.0."),
			});
		}
	}

	Ok(())
}

fn validate_retrieval(cfg: &Config) -> Result<()> {
	let retrieval = &cfg.retrieval;

	if retrieval.candidate_pool == 0 {
		return Err(Error::Validation {
			message: "retrieval.candidate_pool must be greater than zero.".to_string(),
		});
	}
	if retrieval.overfetch_factor == 0 {
		return Err(Error::Validation {
			message: "retrieval.overfetch_factor must be greater than zero.".to_string(),
		});
	}
	if retrieval.min_candidates == 0 {
		return Err(Error::Validation {
			message: "retrieval.min_candidates must be greater than zero.".to_string(),
		});
	}
	if !retrieval.min_score.is_finite() || !(-1.0..=1.0).contains(&retrieval.min_score) {
		return Err(Error::Validation {
			message: "retrieval.min_score must be in the range -1.0-1.0.".to_string(),
		});
	}
	if retrieval.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_ranking(cfg: &Config) -> Result<()> {
	let ranking = &cfg.ranking;
	let weights = &ranking.weights;
	let mut total = 0.0_f32;

	for (label, weight) in [
		("vector", weights.vector),
		("feedback", weights.feedback),
		("diversity", weights.diversity),
		("freshness", weights.freshness),
	] {
		if !weight.is_finite() || weight < 0.0 {
			return Err(Error::Validation {
				message: format!("ranking.weights.{label} must be a finite number, zero or greater."),
			});
		}

		total += weight;
	}

	if total <= 0.0 {
		return Err(Error::Validation {
			message: "ranking.weights must not all be zero.".to_string(),
		});
	}
	if !ranking.pantry.weight.is_finite() || ranking.pantry.weight < 0.0 {
		return Err(Error::Validation {
			message: "ranking.pantry.weight must be a finite number, zero or greater.".to_string(),
		});
	}
	if ranking.pantry.match_cap == 0 {
		return Err(Error::Validation {
			message: "ranking.pantry.match_cap must be greater than zero.".to_string(),
		});
	}
	if ranking.diversity.min_shared_words == 0 {
		return Err(Error::Validation {
			message: "ranking.diversity.min_shared_words must be greater than zero.".to_string(),
		});
	}
	if ranking.diversity.scores.is_empty() {
		return Err(Error::Validation {
			message: "ranking.diversity.scores must be non-empty.".to_string(),
		});
	}
	if ranking.diversity.scores.iter().any(|score| !unit_interval(*score)) {
		return Err(Error::Validation {
			message: "ranking.diversity.scores must be in the range 0.0-1.0.".to_string(),
		});
	}

	let freshness = &ranking.freshness;

	if freshness.buckets.iter().any(|bucket| bucket.max_age_days <= 0 || !unit_interval(bucket.score))
	{
		return Err(Error::Validation {
			message: "ranking.freshness.buckets need max_age_days greater than zero and a score in the range 0.0-1.0."
				.to_string(),
		});
	}
	if freshness.buckets.windows(2).any(|pair| pair[0].max_age_days == pair[1].max_age_days) {
		return Err(Error::Validation {
			message: "ranking.freshness.buckets must not repeat max_age_days.".to_string(),
		});
	}
	if !unit_interval(freshness.stale_score) || !unit_interval(freshness.unknown_score) {
		return Err(Error::Validation {
			message: "ranking.freshness stale_score and unknown_score must be in the range 0.0-1.0."
				.to_string(),
		});
	}

	let limits = &ranking.limits;

	if limits.min_limit == 0 {
		return Err(Error::Validation {
			message: "ranking.limits.min_limit must be greater than zero.".to_string(),
		});
	}
	if limits.max_limit > MAX_WINDOW {
		return Err(Error::Validation {
			message: format!("ranking.limits.max_limit must be {MAX_WINDOW} or less."),
		});
	}
	if !(limits.min_limit..=limits.max_limit).contains(&limits.default_limit) {
		return Err(Error::Validation {
			message: "ranking.limits.default_limit must lie between min_limit and max_limit."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	if cfg.service.log_level.is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	cfg.ranking.freshness.buckets.sort_by_key(|bucket| bucket.max_age_days);
}

fn unit_interval(value: f32) -> bool {
	value.is_finite() && (0.0..=1.0).contains(&value)
}
