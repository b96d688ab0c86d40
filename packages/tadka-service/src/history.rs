use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use tadka_domain::model::RecommendationBatch;

use crate::{Result, exclusion::ExclusionTracker};

/// Starts cooldowns for everything a user was just shown.
pub struct HistoryRecorder {
	tracker: ExclusionTracker,
	ttl: Duration,
}
impl HistoryRecorder {
	pub fn new(tracker: ExclusionTracker, cfg: &tadka_config::Exclusion) -> Self {
		Self { tracker, ttl: Duration::days(cfg.cooldown_days) }
	}

	pub async fn try_commit(&self, batch: &RecommendationBatch, now: OffsetDateTime) -> Result<usize> {
		let ids: Vec<Uuid> = batch.candidates.iter().map(|candidate| candidate.item.recipe_id).collect();

		if ids.is_empty() {
			return Ok(0);
		}

		self.tracker.record_shown(&batch.user_id, &ids, self.ttl, now).await
	}

	/// Like [`Self::try_commit`], but a failed write is logged and dropped so the batch still
	/// reaches the user.
	pub async fn commit(&self, batch: &RecommendationBatch, now: OffsetDateTime) {
		match self.try_commit(batch, now).await {
			Ok(written) => tracing::debug!(
				user_id = batch.user_id.as_str(),
				written,
				"Recorded recommendation cooldowns."
			),
			Err(err) => tracing::error!(
				user_id = batch.user_id.as_str(),
				candidates = batch.candidates.len(),
				error = %err,
				"Failed to record recommendation cooldowns."
			),
		}
	}
}
