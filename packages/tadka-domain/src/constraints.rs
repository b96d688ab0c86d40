use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
	model::{CandidateItem, TasteProfile},
	text,
};

const MEAT_KEYWORDS: &[&str] = &[
	"chicken", "mutton", "lamb", "fish", "prawn", "shrimp", "meat", "beef", "pork", "keema", "gosht",
];
const EGG_KEYWORDS: &[&str] = &["egg", "anda"];
const ONION_KEYWORDS: &[&str] = &["onion", "pyaz", "pyaaz", "kanda"];
const GARLIC_KEYWORDS: &[&str] = &["garlic", "lehsun", "lasun", "lahsun"];
const DAIRY_KEYWORDS: &[&str] = &[
	"paneer", "cheese", "milk", "cream", "butter", "ghee", "curd", "yogurt", "yoghurt", "dahi",
	"malai", "makhani", "khoya", "khoa",
];

/// Tag dimensions that describe constraint status rather than content. Their values never feed
/// keyword matching.
const STATUS_DIMENSIONS: &[&str] = &["allium", "dairy", "diet", "diet_type", "is_jain"];
const NEGATIVE_TAG_VALUES: &[&str] =
	&["none", "no", "false", "free", "absent", "allium_free", "dairy_free", "jain", "vegan"];
const POSITIVE_TAG_VALUES: &[&str] = &["yes", "true", "present", "contains", "both"];
/// Words that mark the following ingredient as absent ("no onion", "without butter").
const NEGATING_PREFIXES: &[&str] = &["no", "without", "non", "zero"];
/// Words that mark the preceding ingredient as absent ("dairy-free", "garlic free").
const NEGATING_SUFFIXES: &[&str] = &["free", "less"];
/// Words that carry a negation over to the next ingredient ("no onion or garlic").
const NEGATION_JOINERS: &[&str] = &["and", "or", "nor"];
const ALLIUM_WORDS: &[&str] = &["allium"];
const DAIRY_WORDS: &[&str] = &["dairy", "lactose"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietType {
	PureVeg,
	Vegetarian,
	VegEggs,
	NonVeg,
}
impl DietType {
	/// Unrecognized values fall back to the stricter vegetarian reading.
	pub fn parse(raw: &str) -> Self {
		match text::normalize(raw).trim() {
			"pure_veg" | "pure_vegetarian" | "jain" | "vegan" => Self::PureVeg,
			"veg_eggs" | "eggetarian" | "vegetarian_eggs" => Self::VegEggs,
			"non_veg" | "non_vegetarian" | "nonveg" => Self::NonVeg,
			_ => Self::Vegetarian,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlliumRule {
	Any,
	NoOnion,
	NoGarlic,
	NoBoth,
}
impl AlliumRule {
	pub fn parse(raw: &str, is_jain: bool) -> Self {
		if is_jain {
			return Self::NoBoth;
		}

		match text::normalize(raw).trim() {
			"no_onion" => Self::NoOnion,
			"no_garlic" => Self::NoGarlic,
			"no_both" | "none" | "jain" => Self::NoBoth,
			_ => Self::Any,
		}
	}

	fn forbids_onion(self) -> bool {
		matches!(self, Self::NoOnion | Self::NoBoth)
	}

	fn forbids_garlic(self) -> bool {
		matches!(self, Self::NoGarlic | Self::NoBoth)
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardConstraintSet {
	pub diet: DietType,
	pub allium: AlliumRule,
	pub dairy_free: bool,
	/// Normalized phrases that must not appear anywhere in an item.
	pub prohibitions: Vec<String>,
	pub allergens: Vec<String>,
}
impl HardConstraintSet {
	pub fn unrestricted() -> Self {
		Self {
			diet: DietType::NonVeg,
			allium: AlliumRule::Any,
			dairy_free: false,
			prohibitions: Vec::new(),
			allergens: Vec::new(),
		}
	}

	pub fn from_profile(profile: &TasteProfile) -> Self {
		let mut prohibitions: Vec<String> =
			profile.specific_prohibitions.iter().map(|raw| text::normalize_phrase(raw)).collect();

		if profile.no_beef {
			prohibitions.push("beef".to_string());
		}
		if profile.no_pork {
			prohibitions.push("pork".to_string());
		}

		Self {
			diet: profile.diet_type.as_deref().map(DietType::parse).unwrap_or(DietType::Vegetarian),
			allium: AlliumRule::parse(profile.allium_status.as_deref().unwrap_or(""), profile.is_jain),
			dairy_free: profile.is_dairy_free,
			prohibitions: clean_phrases(prohibitions),
			allergens: clean_phrases(
				profile.allergies.iter().map(|raw| text::normalize_phrase(raw)).collect(),
			),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DietClass {
	Veg,
	Egg,
	NonVeg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Presence {
	Present,
	Absent,
	Unknown,
}
impl Presence {
	fn merge(self, other: Self) -> Self {
		match (self, other) {
			(Self::Present, _) | (_, Self::Present) => Self::Present,
			(Self::Absent, _) | (_, Self::Absent) => Self::Absent,
			_ => Self::Unknown,
		}
	}
}

/// Normalized views of one item used by every check.
struct ItemText {
	/// Title, description and content tag values, newline separated.
	haystack: String,
	words: BTreeSet<String>,
	/// `haystack` without the words it only mentions as absent.
	mentions: String,
	/// Words the text explicitly calls absent.
	negated: BTreeSet<String>,
	ingredients: Option<Vec<String>>,
}
impl ItemText {
	fn new(item: &CandidateItem) -> Self {
		let mut parts = vec![text::normalize(&item.title)];

		if let Some(description) = item.description.as_deref() {
			parts.push(text::normalize(description));
		}

		for (dimension, value) in &item.tags {
			if STATUS_DIMENSIONS.contains(&dimension.as_str()) {
				continue;
			}

			parts.extend(value.values().iter().map(|value| text::normalize_phrase(value)));
		}

		let haystack = parts.join("\n");
		let words = text::word_set(&haystack);
		let (mentions, negated) = split_negations(&haystack);
		let ingredients = item
			.tags
			.get("ingredients")
			.map(|value| value.values().iter().map(|value| text::normalize_phrase(value)).collect());

		Self { haystack, words, mentions, negated, ingredients }
	}

	fn tag_values(item: &CandidateItem, dimension: &str) -> Vec<String> {
		item.tags
			.get(dimension)
			.map(|value| value.values().iter().map(|value| text::normalize(value)).collect())
			.unwrap_or_default()
	}

	/// Presence decided by the ingredient list when the item carries one.
	fn ingredient_presence(&self, keywords: &[&str]) -> Presence {
		match &self.ingredients {
			Some(list) if list.iter().any(|ingredient| text::contains_any(ingredient, keywords)) =>
				Presence::Present,
			Some(_) => Presence::Absent,
			None => Presence::Unknown,
		}
	}

	/// Present when a keyword is mentioned outside a negation, absent when the text only says the
	/// item is free of it.
	fn keyword_presence(&self, keywords: &[&str], absence_words: &[&str]) -> Presence {
		if text::contains_any(&self.mentions, keywords) {
			Presence::Present
		} else if text::has_any_word(&self.negated, keywords)
			|| text::has_any_word(&self.negated, absence_words)
		{
			Presence::Absent
		} else {
			Presence::Unknown
		}
	}
}

/// Splits `haystack` into the text with negated words removed, line by line, and the set of
/// negated words.
fn split_negations(haystack: &str) -> (String, BTreeSet<String>) {
	let mut negated = BTreeSet::new();
	let lines: Vec<String> = haystack
		.lines()
		.map(|line| {
			let words: Vec<&str> = line.unicode_words().collect();
			let mut dropped = vec![false; words.len()];
			let mut negating = false;

			for (index, word) in words.iter().enumerate() {
				if NEGATING_PREFIXES.contains(word) {
					negating = true;

					continue;
				}
				if negating && NEGATION_JOINERS.contains(word) {
					continue;
				}
				if negating {
					dropped[index] = true;
					negating = false;

					if words.get(index + 1).is_some_and(|next| NEGATION_JOINERS.contains(next)) {
						negating = true;
					}
				}
				if words.get(index + 1).is_some_and(|next| NEGATING_SUFFIXES.contains(next)) {
					dropped[index] = true;
				}
			}

			words
				.iter()
				.zip(dropped)
				.filter_map(|(word, dropped)| {
					if dropped {
						negated.insert((*word).to_string());

						None
					} else {
						Some(*word)
					}
				})
				.collect::<Vec<_>>()
				.join(" ")
		})
		.collect();

	(lines.join("\n"), negated)
}

/// Hard eligibility gate. Total: every item is either eligible or not, and an item whose
/// allium or dairy status cannot be established is treated as containing it.
pub fn is_eligible(item: &CandidateItem, constraints: &HardConstraintSet) -> bool {
	let view = ItemText::new(item);

	diet_allows(item, &view, constraints.diet)
		&& allium_allows(item, &view, constraints.allium)
		&& (!constraints.dairy_free || dairy_presence(item, &view) == Presence::Absent)
		&& !constraints
			.prohibitions
			.iter()
			.chain(constraints.allergens.iter())
			.any(|phrase| view.haystack.contains(phrase.as_str()))
}

/// Meal-type gate. Items that carry no `meal_type` tag pass.
pub fn matches_meal_type(item: &CandidateItem, meal_type: Option<&str>) -> bool {
	let Some(wanted) = meal_type.map(text::normalize_phrase).filter(|value| !value.is_empty())
	else {
		return true;
	};
	let Some(tag) = item.tags.get("meal_type") else {
		return true;
	};

	tag.values().iter().any(|value| text::normalize_phrase(value) == wanted)
}

fn diet_allows(item: &CandidateItem, view: &ItemText, diet: DietType) -> bool {
	let allowed = match diet {
		DietType::PureVeg | DietType::Vegetarian => DietClass::Veg,
		DietType::VegEggs => DietClass::Egg,
		DietType::NonVeg => return true,
	};

	item_diet_class(item, view) <= allowed
}

fn item_diet_class(item: &CandidateItem, view: &ItemText) -> DietClass {
	let mut class = DietClass::Veg;

	for dimension in ["diet_type", "diet"] {
		for value in ItemText::tag_values(item, dimension) {
			let tagged = match value.as_str() {
				"non_veg" | "non_vegetarian" | "nonveg" | "non-veg" | "non-vegetarian" =>
					DietClass::NonVeg,
				"veg_eggs" | "egg" | "eggetarian" | "contains_egg" => DietClass::Egg,
				_ => DietClass::Veg,
			};

			class = class.max(tagged);
		}
	}

	if text::has_any_word(&view.words, MEAT_KEYWORDS) {
		class = class.max(DietClass::NonVeg);
	}
	if text::has_any_word(&view.words, EGG_KEYWORDS) {
		class = class.max(DietClass::Egg);
	}

	class
}

fn allium_allows(item: &CandidateItem, view: &ItemText, rule: AlliumRule) -> bool {
	if rule == AlliumRule::Any {
		return true;
	}

	let (onion, garlic) = allium_presence(item, view);

	(!rule.forbids_onion() || onion == Presence::Absent)
		&& (!rule.forbids_garlic() || garlic == Presence::Absent)
}

fn allium_presence(item: &CandidateItem, view: &ItemText) -> (Presence, Presence) {
	let mut onion_tag = Presence::Unknown;
	let mut garlic_tag = Presence::Unknown;

	for value in ItemText::tag_values(item, "is_jain") {
		if matches!(value.as_str(), "true" | "yes") {
			onion_tag = onion_tag.merge(Presence::Absent);
			garlic_tag = garlic_tag.merge(Presence::Absent);
		}
	}
	for value in ItemText::tag_values(item, "allium") {
		let value = value.as_str();

		match value {
			"no_onion" => onion_tag = onion_tag.merge(Presence::Absent),
			"no_garlic" => garlic_tag = garlic_tag.merge(Presence::Absent),
			"onion" => onion_tag = Presence::Present,
			"garlic" => garlic_tag = Presence::Present,
			_ if NEGATIVE_TAG_VALUES.contains(&value) => {
				onion_tag = onion_tag.merge(Presence::Absent);
				garlic_tag = garlic_tag.merge(Presence::Absent);
			},
			_ if POSITIVE_TAG_VALUES.contains(&value) => {
				onion_tag = Presence::Present;
				garlic_tag = Presence::Present;
			},
			_ => {},
		}
	}

	let onion = onion_tag
		.merge(view.ingredient_presence(ONION_KEYWORDS))
		.merge(view.keyword_presence(ONION_KEYWORDS, ALLIUM_WORDS));
	let garlic = garlic_tag
		.merge(view.ingredient_presence(GARLIC_KEYWORDS))
		.merge(view.keyword_presence(GARLIC_KEYWORDS, ALLIUM_WORDS));

	(onion, garlic)
}

fn dairy_presence(item: &CandidateItem, view: &ItemText) -> Presence {
	let mut tagged = Presence::Unknown;

	for value in ItemText::tag_values(item, "dairy") {
		if NEGATIVE_TAG_VALUES.contains(&value.as_str()) {
			tagged = tagged.merge(Presence::Absent);
		} else if POSITIVE_TAG_VALUES.contains(&value.as_str()) {
			tagged = Presence::Present;
		}
	}
	for value in ItemText::tag_values(item, "diet_type") {
		if value == "vegan" {
			tagged = tagged.merge(Presence::Absent);
		}
	}

	tagged
		.merge(view.ingredient_presence(DAIRY_KEYWORDS))
		.merge(view.keyword_presence(DAIRY_KEYWORDS, DAIRY_WORDS))
}

fn clean_phrases(mut phrases: Vec<String>) -> Vec<String> {
	phrases.retain(|phrase| !phrase.is_empty());
	phrases.sort();
	phrases.dedup();

	phrases
}
