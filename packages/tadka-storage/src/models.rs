use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use tadka_domain::model::{
	ActionKind, CandidateItem, ExclusionKind, ExclusionRecord, TagValue, TaggedSignal, Tags,
	TasteProfile,
};

use crate::{Error, Result};

/// Profile columns that live outside the `answers` document.
const PROFILE_COLUMNS: [&str; 3] = ["user_id", "onboarding_completed", "taste_vector"];

#[derive(Debug, sqlx::FromRow)]
pub struct UserProfileRow {
	pub user_id: String,
	pub onboarding_completed: bool,
	pub answers: Value,
	pub taste_vector: Option<Vec<f32>>,
	pub updated_at: OffsetDateTime,
}
impl UserProfileRow {
	pub fn into_profile(self) -> Result<TasteProfile> {
		let Self { user_id, onboarding_completed, answers, taste_vector, .. } = self;
		let mut profile: TasteProfile = serde_json::from_value(answers).map_err(|err| {
			Error::MalformedRow(format!("user_profiles.answers for {user_id:?}: {err}."))
		})?;

		profile.user_id = user_id;
		profile.onboarding_completed = onboarding_completed;
		profile.taste_vector = taste_vector;

		Ok(profile)
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct RecipeRow {
	pub recipe_id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub tags: Value,
	pub total_time_minutes: Option<i32>,
	pub created_at: Option<OffsetDateTime>,
}
impl RecipeRow {
	pub fn into_item(self) -> CandidateItem {
		CandidateItem {
			recipe_id: self.recipe_id,
			title: self.title,
			description: self.description,
			tags: tags_from_json(&self.tags),
			total_time_minutes: self.total_time_minutes.and_then(|minutes| u32::try_from(minutes).ok()),
			created_at: self.created_at,
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct SignalRow {
	pub action: String,
	pub occurred_at: OffsetDateTime,
	pub dwell_secs: Option<f32>,
	pub tags: Value,
}
impl SignalRow {
	/// `None` for actions this build does not know about.
	pub fn into_tagged(self) -> Option<TaggedSignal> {
		let action = ActionKind::parse(&self.action)?;

		Some(TaggedSignal {
			action,
			occurred_at: self.occurred_at,
			dwell_secs: self.dwell_secs,
			tags: tags_from_json(&self.tags),
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ExclusionRow {
	pub user_id: String,
	pub recipe_id: Uuid,
	pub kind: String,
	pub effective_until: Option<OffsetDateTime>,
}
impl ExclusionRow {
	pub fn into_record(self) -> Result<ExclusionRecord> {
		let kind = ExclusionKind::parse(&self.kind).ok_or_else(|| {
			Error::MalformedRow(format!("Unknown exclusion kind {:?}.", self.kind))
		})?;

		Ok(ExclusionRecord {
			user_id: self.user_id,
			recipe_id: self.recipe_id,
			kind,
			effective_until: self.effective_until,
		})
	}
}

/// Reads the recipe `tags` document. Strings pass through, booleans and numbers are rendered as
/// text, arrays become multi-select values. Nulls, nested objects and empty arrays are dropped.
pub fn tags_from_json(value: &Value) -> Tags {
	let Some(object) = value.as_object() else {
		return Tags::new();
	};

	object
		.iter()
		.filter_map(|(dimension, raw)| {
			let tag = match raw {
				Value::Array(items) => {
					let values: Vec<String> = items.iter().filter_map(scalar_text).collect();

					if values.is_empty() {
						return None;
					}

					TagValue::MultiSelect(values)
				},
				other => TagValue::Scalar(scalar_text(other)?),
			};

			Some((dimension.clone(), tag))
		})
		.collect()
}

pub fn tags_to_json(tags: &Tags) -> Value {
	serde_json::to_value(tags).unwrap_or_else(|_| Value::Object(Default::default()))
}

/// The `answers` document stored for `profile`.
pub fn profile_answers(profile: &TasteProfile) -> Result<Value> {
	let mut answers = serde_json::to_value(profile)
		.map_err(|err| Error::InvalidArgument(format!("Profile is not serializable: {err}.")))?;

	if let Some(object) = answers.as_object_mut() {
		for column in PROFILE_COLUMNS {
			object.remove(column);
		}
	}

	Ok(answers)
}

fn scalar_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Number(number) => Some(number.to_string()),
		_ => None,
	}
}
