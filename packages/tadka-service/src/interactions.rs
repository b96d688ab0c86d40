use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use tadka_domain::model::{ActionKind, InteractionSignal};

use crate::{Error, RecommendService, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InteractionRequest {
	pub user_id: String,
	pub recipe_id: Uuid,
	pub action: ActionKind,
	#[serde(default)]
	pub dwell_secs: Option<f32>,
	/// Defaults to the time the request is handled.
	#[serde(default, with = "tadka_domain::time_serde::option")]
	pub occurred_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResponse {
	pub recorded: bool,
	pub permanently_excluded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
	pub purged: u64,
}

impl RecommendService {
	/// Appends one interaction. A strong dislike also excludes the recipe for good.
	pub async fn record_interaction(&self, req: InteractionRequest) -> Result<InteractionResponse> {
		let user_id = req.user_id.trim();

		if user_id.is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
		}
		if req.dwell_secs.is_some_and(|dwell| !dwell.is_finite() || dwell < 0.0) {
			return Err(Error::InvalidRequest {
				message: "dwell_secs must be a finite number, zero or greater.".to_string(),
			});
		}

		let known = self.stores.catalog.load_recipes(&[req.recipe_id]).await?;

		if known.is_empty() {
			return Err(Error::InvalidRequest {
				message: format!("Unknown recipe_id {}.", req.recipe_id),
			});
		}

		let signal = InteractionSignal {
			user_id: user_id.to_string(),
			recipe_id: req.recipe_id,
			action: req.action,
			occurred_at: req.occurred_at.unwrap_or_else(OffsetDateTime::now_utc),
			dwell_secs: req.dwell_secs,
		};

		self.stores.profiles.append_signal(&signal).await?;

		let permanently_excluded = req.action == ActionKind::StrongDislike;

		if permanently_excluded {
			self.exclusion_tracker().record_rejection(user_id, req.recipe_id).await?;
		}

		tracing::info!(
			user_id,
			recipe_id = %req.recipe_id,
			action = req.action.as_str(),
			permanently_excluded,
			"Recorded interaction."
		);

		Ok(InteractionResponse { recorded: true, permanently_excluded })
	}

	/// Deletes cooldown rows that have already ended. Reads ignore them either way.
	pub async fn purge_expired_cooldowns(&self) -> Result<PurgeReport> {
		self.purge_expired_cooldowns_at(OffsetDateTime::now_utc()).await
	}

	pub async fn purge_expired_cooldowns_at(&self, now: OffsetDateTime) -> Result<PurgeReport> {
		let purged = self.exclusion_tracker().purge_expired(now).await?;

		tracing::info!(purged, "Purged expired cooldowns.");

		Ok(PurgeReport { purged })
	}
}
