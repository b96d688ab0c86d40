use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::constraints::HardConstraintSet;

pub type Tags = BTreeMap<String, TagValue>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
	Like,
	Save,
	Skip,
	View,
	StrongDislike,
	Cooked,
	WouldCookAgain,
	WouldNotCookAgain,
}
impl ActionKind {
	pub const ALL: [Self; 8] = [
		Self::Like,
		Self::Save,
		Self::Skip,
		Self::View,
		Self::StrongDislike,
		Self::Cooked,
		Self::WouldCookAgain,
		Self::WouldNotCookAgain,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Like => "like",
			Self::Save => "save",
			Self::Skip => "skip",
			Self::View => "view",
			Self::StrongDislike => "strong_dislike",
			Self::Cooked => "cooked",
			Self::WouldCookAgain => "would_cook_again",
			Self::WouldNotCookAgain => "would_not_cook_again",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
	}

	/// Cooking outcomes are looked back further than swipe-type actions.
	pub fn is_cooking(self) -> bool {
		matches!(self, Self::Cooked | Self::WouldCookAgain | Self::WouldNotCookAgain)
	}
}

/// A recipe attribute value. Single-choice dimensions carry a scalar, multi-choice dimensions a
/// list. Matching code never inspects the shape directly; it goes through [`TagValue::values`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
	Scalar(String),
	MultiSelect(Vec<String>),
}
impl TagValue {
	pub fn values(&self) -> &[String] {
		match self {
			Self::Scalar(value) => std::slice::from_ref(value),
			Self::MultiSelect(values) => values.as_slice(),
		}
	}
}

/// Flattened `dimension:value` keys, in tag-map order.
pub fn tag_keys(tags: &Tags) -> Vec<String> {
	tags.iter()
		.flat_map(|(dimension, value)| {
			value.values().iter().map(move |value| format!("{dimension}:{value}"))
		})
		.collect()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InteractionSignal {
	pub user_id: String,
	pub recipe_id: Uuid,
	pub action: ActionKind,
	#[serde(with = "crate::time_serde")]
	pub occurred_at: OffsetDateTime,
	pub dwell_secs: Option<f32>,
}

/// An interaction joined with the tags of the recipe it touched.
#[derive(Clone, Debug)]
pub struct TaggedSignal {
	pub action: ActionKind,
	pub occurred_at: OffsetDateTime,
	pub dwell_secs: Option<f32>,
	pub tags: Tags,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
	pub recipe_id: Uuid,
	pub title: String,
	pub description: Option<String>,
	pub tags: Tags,
	pub total_time_minutes: Option<u32>,
	#[serde(with = "crate::time_serde::option")]
	pub created_at: Option<OffsetDateTime>,
}

/// A hydrated catalog item together with the similarity the vector index reported for it.
#[derive(Clone, Debug)]
pub struct RetrievedCandidate {
	pub item: CandidateItem,
	pub vector_score: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
	pub vector: f32,
	pub feedback: f32,
	pub diversity: f32,
	pub freshness: f32,
	pub pantry: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
	pub item: CandidateItem,
	pub scores: ComponentScores,
	pub combined: f32,
	pub rank: u32,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub explanation: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
	Permanent,
	Cooldown,
}
impl ExclusionKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Permanent => "permanent",
			Self::Cooldown => "cooldown",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"permanent" => Some(Self::Permanent),
			"cooldown" => Some(Self::Cooldown),
			_ => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExclusionRecord {
	pub user_id: String,
	pub recipe_id: Uuid,
	pub kind: ExclusionKind,
	#[serde(with = "crate::time_serde::option")]
	pub effective_until: Option<OffsetDateTime>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementState {
	Refined,
	UnrefinedFallback,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
	pub meal_type: Option<String>,
	pub pantry_ingredients: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecommendationBatch {
	pub user_id: String,
	pub candidates: Vec<ScoredCandidate>,
	pub meta: RequestMeta,
	#[serde(with = "crate::time_serde")]
	pub generated_at: OffsetDateTime,
	pub refinement: RefinementState,
	/// Set when cooldown exclusions had to be dropped to reach the minimum pool size.
	pub relaxed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affinity {
	/// Signed preference in [-1, 1].
	pub score: f32,
	/// Grows with the number of contributing events, in [0, 1).
	pub confidence: f32,
	pub observations: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AffinityMap {
	entries: BTreeMap<String, Affinity>,
}
impl AffinityMap {
	pub fn from_entries(entries: BTreeMap<String, Affinity>) -> Self {
		Self { entries }
	}

	pub fn get(&self, key: &str) -> Option<&Affinity> {
		self.entries.get(key)
	}

	/// Signed score for `key`, zero when the key was never observed.
	pub fn score(&self, key: &str) -> f32 {
		self.entries.get(key).map(|entry| entry.score).unwrap_or(0.0)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Affinity)> {
		self.entries.iter()
	}
}

/// Onboarding answers as stored for a user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasteProfile {
	pub user_id: String,
	pub onboarding_completed: bool,
	pub diet_type: Option<String>,
	pub allium_status: Option<String>,
	pub is_jain: bool,
	pub is_dairy_free: bool,
	pub is_gluten_free: bool,
	pub is_halal: bool,
	pub no_beef: bool,
	pub no_pork: bool,
	pub specific_prohibitions: Vec<String>,
	pub allergies: Vec<String>,
	pub regions: Vec<String>,
	pub heat_level: Option<u8>,
	pub sweetness_in_savory: Option<String>,
	pub gravy_preferences: Vec<String>,
	pub fat_richness: Option<String>,
	pub cooking_fat: Option<String>,
	pub primary_staple: Option<String>,
	pub signature_masalas: Vec<String>,
	pub health_modifications: Vec<String>,
	pub time_available_weekday: Option<u32>,
	pub skill_level: Option<String>,
	pub household_type: Option<String>,
	pub multigenerational_household: bool,
	pub experimentation_level: Option<String>,
	/// Precomputed taste embedding, when one has been stored for the user.
	pub taste_vector: Option<Vec<f32>>,
}

/// Everything one ranking request knows about its user. Built once per request and only read
/// afterwards.
#[derive(Clone, Debug)]
pub struct UserTasteContext {
	pub user_id: String,
	pub vector: Vec<f32>,
	pub constraints: HardConstraintSet,
	pub affinity: AffinityMap,
	/// Compact profile description handed to the refiner.
	pub summary: String,
}
