use std::collections::BTreeSet;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::model::{ExclusionKind, ExclusionRecord};

/// Recipes a user must not be shown right now, split by why.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExclusionSet {
	permanent: BTreeSet<Uuid>,
	cooldown: BTreeSet<Uuid>,
}
impl ExclusionSet {
	/// Permanent records always count. Cooldowns count only while `effective_until` lies after
	/// `now`; a cooldown without an end is treated as absent.
	pub fn from_records(records: &[ExclusionRecord], now: OffsetDateTime) -> Self {
		let mut set = Self::default();

		for record in records {
			match record.kind {
				ExclusionKind::Permanent => {
					set.permanent.insert(record.recipe_id);
				},
				ExclusionKind::Cooldown =>
					if record.effective_until.is_some_and(|until| until > now) {
						set.cooldown.insert(record.recipe_id);
					},
			}
		}

		set.cooldown.retain(|id| !set.permanent.contains(id));

		set
	}

	pub fn contains(&self, recipe_id: &Uuid) -> bool {
		self.permanent.contains(recipe_id) || self.cooldown.contains(recipe_id)
	}

	pub fn permanent(&self) -> &BTreeSet<Uuid> {
		&self.permanent
	}

	pub fn cooldown(&self) -> &BTreeSet<Uuid> {
		&self.cooldown
	}

	/// The relaxed view used by the retrieval retry: rejections stay, cooldowns go.
	pub fn without_cooldowns(&self) -> Self {
		Self { permanent: self.permanent.clone(), cooldown: BTreeSet::new() }
	}

	pub fn ids(&self) -> Vec<Uuid> {
		self.permanent.union(&self.cooldown).copied().collect()
	}

	pub fn len(&self) -> usize {
		self.permanent.len() + self.cooldown.len()
	}

	pub fn is_empty(&self) -> bool {
		self.permanent.is_empty() && self.cooldown.is_empty()
	}
}

pub fn permanent_record(user_id: &str, recipe_id: Uuid) -> ExclusionRecord {
	ExclusionRecord {
		user_id: user_id.to_string(),
		recipe_id,
		kind: ExclusionKind::Permanent,
		effective_until: None,
	}
}

pub fn cooldown_records(
	user_id: &str,
	recipe_ids: &[Uuid],
	ttl: Duration,
	now: OffsetDateTime,
) -> Vec<ExclusionRecord> {
	let until = now + ttl;
	let mut seen = BTreeSet::new();

	recipe_ids
		.iter()
		.filter(|id| seen.insert(**id))
		.map(|recipe_id| ExclusionRecord {
			user_id: user_id.to_string(),
			recipe_id: *recipe_id,
			kind: ExclusionKind::Cooldown,
			effective_until: Some(until),
		})
		.collect()
}

/// Result of writing `incoming` over the stored record for the same (user, recipe) pair. A
/// permanent record is never replaced; cooldowns are last-write-wins.
pub fn merge(existing: Option<&ExclusionRecord>, incoming: ExclusionRecord) -> ExclusionRecord {
	match existing {
		Some(current) if current.kind == ExclusionKind::Permanent => current.clone(),
		_ => incoming,
	}
}
