use time::OffsetDateTime;

use tadka_domain::{
	constraints::HardConstraintSet,
	ledger::{self, SignalPolicy},
	model::{TasteProfile, UserTasteContext},
	taste_text,
};

use crate::{Error, RecommendService, Result};

impl RecommendService {
	/// Loads everything one request needs to know about `user_id`.
	pub async fn build_context(&self, user_id: &str, now: OffsetDateTime) -> Result<UserTasteContext> {
		let profile = self
			.stores
			.profiles
			.load_profile(user_id)
			.await?
			.ok_or_else(|| Error::ProfileNotFound { user_id: user_id.to_string() })?;

		if !profile.onboarding_completed {
			return Err(Error::OnboardingIncomplete { user_id: user_id.to_string() });
		}

		let policy = SignalPolicy::from_config(&self.cfg.signals);
		let signals =
			self.stores.profiles.load_signals(user_id, policy.earliest_relevant(now)).await?;
		let affinity = ledger::accumulate(&signals, now, &policy);
		let vector = self.taste_vector(&profile).await?;

		tracing::debug!(
			user_id,
			signals = signals.len(),
			affinity_keys = affinity.len(),
			"Built taste context."
		);

		Ok(UserTasteContext {
			user_id: user_id.to_string(),
			vector,
			constraints: HardConstraintSet::from_profile(&profile),
			affinity,
			summary: taste_text::build_summary(&profile),
		})
	}

	/// The stored taste vector when it fits the index, otherwise an embedding of the profile text.
	async fn taste_vector(&self, profile: &TasteProfile) -> Result<Vec<f32>> {
		let dim = self.cfg.storage.qdrant.vector_dim as usize;

		if let Some(vector) = profile.taste_vector.as_ref() {
			if vector.len() == dim {
				return Ok(vector.clone());
			}

			tracing::warn!(
				user_id = profile.user_id.as_str(),
				stored = vector.len(),
				expected = dim,
				"Stored taste vector has the wrong dimension. Re-embedding profile text."
			);
		}

		let text = taste_text::build_taste_text(profile);
		let vectors =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &[text]).await?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != dim {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}
}
