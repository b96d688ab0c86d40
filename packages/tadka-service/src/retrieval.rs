use std::{collections::HashMap, sync::Arc, time::Duration};

use tadka_domain::{
	constraints::{self, HardConstraintSet},
	exclusion::ExclusionSet,
	model::RetrievedCandidate,
};

use crate::{CatalogStore, Error, IndexHit, Result, VectorIndex};

pub struct RetrievalQuery<'a> {
	pub vector: &'a [f32],
	pub excluded: &'a ExclusionSet,
	pub constraints: &'a HardConstraintSet,
	pub meal_type: Option<&'a str>,
	/// Survivors to keep.
	pub limit: usize,
}

#[derive(Debug)]
pub struct Retrieval {
	/// Eligible candidates in index order.
	pub candidates: Vec<RetrievedCandidate>,
	/// Set when cooldown exclusions were dropped to reach the minimum pool size.
	pub relaxed: bool,
}

pub struct CandidateRetriever {
	index: Arc<dyn VectorIndex>,
	catalog: Arc<dyn CatalogStore>,
	cfg: tadka_config::Retrieval,
}
impl CandidateRetriever {
	pub fn new(
		index: Arc<dyn VectorIndex>,
		catalog: Arc<dyn CatalogStore>,
		cfg: tadka_config::Retrieval,
	) -> Self {
		Self { index, catalog, cfg }
	}

	/// Fetches an eligible pool, relaxing cooldowns once when too few candidates survive. The
	/// whole call, relaxation included, is bounded by `retrieval.timeout_ms`.
	pub async fn fetch(&self, query: RetrievalQuery<'_>) -> Result<Retrieval> {
		let timeout_ms = self.cfg.timeout_ms;

		tokio::time::timeout(Duration::from_millis(timeout_ms), self.fetch_inner(&query))
			.await
			.map_err(|_| Error::RetrievalTimeout { timeout_ms })?
	}

	async fn fetch_inner(&self, query: &RetrievalQuery<'_>) -> Result<Retrieval> {
		let required = (self.cfg.min_candidates as usize).min(query.limit);
		let candidates = self.attempt(query, query.excluded).await?;

		if candidates.len() >= required {
			return Ok(Retrieval { candidates, relaxed: false });
		}
		if query.excluded.cooldown().is_empty() {
			return Err(Error::InsufficientCandidates { found: candidates.len(), required });
		}

		tracing::warn!(
			found = candidates.len(),
			required,
			cooldowns = query.excluded.cooldown().len(),
			"Too few candidates. Retrying once without cooldown exclusions."
		);

		let relaxed = query.excluded.without_cooldowns();
		let candidates = self.attempt(query, &relaxed).await?;

		if candidates.len() < required {
			return Err(Error::InsufficientCandidates { found: candidates.len(), required });
		}

		Ok(Retrieval { candidates, relaxed: true })
	}

	async fn attempt(
		&self,
		query: &RetrievalQuery<'_>,
		excluded: &ExclusionSet,
	) -> Result<Vec<RetrievedCandidate>> {
		let k = (query.limit as u64).saturating_mul(u64::from(self.cfg.overfetch_factor));
		let exclude_ids = excluded.ids();
		let hits = self.index.search(query.vector, k, &exclude_ids).await?;
		let hits: Vec<IndexHit> = hits
			.into_iter()
			.filter(|hit| !excluded.contains(&hit.recipe_id))
			.filter(|hit| hit.score.is_finite() && hit.score >= self.cfg.min_score)
			.collect();
		let ids: Vec<_> = hits.iter().map(|hit| hit.recipe_id).collect();
		let mut items: HashMap<_, _> = self
			.catalog
			.load_recipes(&ids)
			.await?
			.into_iter()
			.map(|item| (item.recipe_id, item))
			.collect();
		let candidates: Vec<RetrievedCandidate> = hits
			.iter()
			.filter_map(|hit| {
				items
					.remove(&hit.recipe_id)
					.map(|item| RetrievedCandidate { item, vector_score: hit.score })
			})
			.filter(|candidate| constraints::is_eligible(&candidate.item, query.constraints))
			.filter(|candidate| constraints::matches_meal_type(&candidate.item, query.meal_type))
			.take(query.limit)
			.collect();

		tracing::debug!(
			hits = hits.len(),
			excluded = excluded.len(),
			survivors = candidates.len(),
			"Retrieval attempt finished."
		);

		Ok(candidates)
	}
}
