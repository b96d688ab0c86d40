use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use tadka_domain::exclusion::{self, ExclusionSet};

use crate::{ExclusionStore, Result};

/// Store-backed view of what a user must not be shown.
#[derive(Clone)]
pub struct ExclusionTracker {
	store: Arc<dyn ExclusionStore>,
}
impl ExclusionTracker {
	pub fn new(store: Arc<dyn ExclusionStore>) -> Self {
		Self { store }
	}

	/// Permanent rejections plus cooldowns still running at `now`.
	pub async fn compute_excluded(&self, user_id: &str, now: OffsetDateTime) -> Result<ExclusionSet> {
		let records = self.store.load_exclusions(user_id, now).await?;

		Ok(ExclusionSet::from_records(&records, now))
	}

	/// Starts a cooldown of `ttl` for every id. Returns how many distinct ids were written.
	pub async fn record_shown(
		&self,
		user_id: &str,
		recipe_ids: &[Uuid],
		ttl: Duration,
		now: OffsetDateTime,
	) -> Result<usize> {
		let records = exclusion::cooldown_records(user_id, recipe_ids, ttl, now);

		self.store.insert_cooldowns(&records).await?;

		Ok(records.len())
	}

	pub async fn record_rejection(&self, user_id: &str, recipe_id: Uuid) -> Result<()> {
		self.store.insert_permanent(user_id, recipe_id).await
	}

	pub async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64> {
		self.store.purge_expired(now).await
	}
}
