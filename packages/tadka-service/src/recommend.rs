use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use tadka_config::MAX_WINDOW;
use tadka_domain::{
	model::{
		AffinityMap, RecommendationBatch, RequestMeta, RetrievedCandidate, ScoredCandidate,
	},
	ranker::{HybridRanker, RankInput},
	text,
};

use crate::{
	Error, RecommendService, Result,
	history::HistoryRecorder,
	refinement::RefinementGateway,
	retrieval::{CandidateRetriever, RetrievalQuery},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommendRequest {
	pub user_id: String,
	#[serde(default)]
	pub meal_type: Option<String>,
	/// Defaults to `ranking.limits.default_limit`; clamped into the configured bounds.
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub include_pantry: bool,
	#[serde(default)]
	pub pantry_ingredients: Vec<String>,
}
impl RecommendRequest {
	pub fn for_user(user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			meal_type: None,
			limit: None,
			include_pantry: false,
			pantry_ingredients: Vec::new(),
		}
	}
}

impl RecommendService {
	pub async fn generate_recommendations(
		&self,
		req: RecommendRequest,
	) -> Result<RecommendationBatch> {
		self.generate_recommendations_at(req, OffsetDateTime::now_utc()).await
	}

	/// Runs the full pipeline with an explicit clock.
	pub async fn generate_recommendations_at(
		&self,
		req: RecommendRequest,
		now: OffsetDateTime,
	) -> Result<RecommendationBatch> {
		let user_id = req.user_id.trim();

		if user_id.is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
		}

		let limit = self.effective_limit(req.limit);
		let meal_type = req
			.meal_type
			.as_deref()
			.map(text::normalize_phrase)
			.filter(|meal_type| !meal_type.is_empty());
		let pantry = if req.include_pantry { pantry_terms(&req.pantry_ingredients) } else { Vec::new() };
		let context = self.build_context(user_id, now).await?;
		let excluded = self.exclusion_tracker().compute_excluded(user_id, now).await?;
		let retriever = CandidateRetriever::new(
			self.stores.index.clone(),
			self.stores.catalog.clone(),
			self.cfg.retrieval.clone(),
		);
		let retrieval = retriever
			.fetch(RetrievalQuery {
				vector: &context.vector,
				excluded: &excluded,
				constraints: &context.constraints,
				meal_type: meal_type.as_deref(),
				limit: (self.cfg.retrieval.candidate_pool as usize).max(limit),
			})
			.await?;
		let window = self.ranking_window(limit);
		let ranked = score_on_pool(
			self.ranker.clone(),
			retrieval.candidates,
			context.affinity.clone(),
			pantry.clone(),
			now,
			window,
		)
		.await?;
		let meta = RequestMeta { meal_type, pantry_ingredients: pantry };
		let gateway = RefinementGateway::new(
			self.providers.refiner.clone(),
			self.cfg.providers.refiner.clone(),
			self.cfg.refinement.clone(),
		);
		let refinement = gateway.refine(ranked, &context, &meta, limit).await;
		let batch = RecommendationBatch {
			user_id: user_id.to_string(),
			candidates: refinement.candidates,
			meta,
			generated_at: now,
			refinement: refinement.state,
			relaxed: retrieval.relaxed,
		};

		HistoryRecorder::new(self.exclusion_tracker(), &self.cfg.exclusion).commit(&batch, now).await;

		tracing::info!(
			user_id,
			returned = batch.candidates.len(),
			excluded = excluded.len(),
			relaxed = batch.relaxed,
			refinement = refinement.fallback.map(|reason| reason.as_str()).unwrap_or("refined"),
			"Generated recommendations."
		);

		Ok(batch)
	}

	fn effective_limit(&self, requested: Option<u32>) -> usize {
		let limits = &self.cfg.ranking.limits;

		requested.unwrap_or(limits.default_limit).clamp(limits.min_limit, limits.max_limit) as usize
	}

	/// How many ranked candidates leave the ranker: enough for the batch and for the refiner.
	fn ranking_window(&self, limit: usize) -> usize {
		let refine = if self.cfg.refinement.enabled {
			self.cfg.refinement.max_candidates as usize
		} else {
			0
		};

		limit.max(refine).min(MAX_WINDOW as usize)
	}
}

/// Scoring is CPU-bound, so it runs on a blocking thread that hands the work to the rayon pool.
async fn score_on_pool(
	ranker: Arc<HybridRanker>,
	candidates: Vec<RetrievedCandidate>,
	affinity: AffinityMap,
	pantry: Vec<String>,
	now: OffsetDateTime,
	window: usize,
) -> Result<Vec<ScoredCandidate>> {
	tokio::task::spawn_blocking(move || {
		ranker.rank(candidates, &RankInput { affinity: &affinity, pantry: &pantry, now, window })
	})
	.await
	.map_err(|err| Error::Scoring { message: err.to_string() })
}

fn pantry_terms(raw: &[String]) -> Vec<String> {
	let mut terms: Vec<String> = raw
		.iter()
		.map(|ingredient| text::normalize_phrase(ingredient))
		.filter(|ingredient| !ingredient.is_empty())
		.collect();

	terms.sort();
	terms.dedup();

	terms
}
