use std::collections::BTreeSet;

use time::OffsetDateTime;

use tadka_config::{RankingDiversity, RankingFreshness};

use crate::{
	model::{AffinityMap, Tags, tag_keys},
	text,
};

pub fn vector_score(raw: f32) -> f32 {
	if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 }
}

/// Mean affinity over the item's flattened tags, mapped from [-1, 1] onto [0, 1]. Items without
/// tags and users without history both land on the neutral 0.5.
pub fn feedback_score(tags: &Tags, affinity: &AffinityMap) -> f32 {
	let keys = tag_keys(tags);

	if keys.is_empty() {
		return 0.5;
	}

	let mean = keys.iter().map(|key| affinity.score(key)).sum::<f32>() / keys.len() as f32;

	((mean + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Bucketed penalty for title overlap with candidates processed earlier in the same batch.
pub fn diversity_score(
	words: &BTreeSet<String>,
	processed: &[BTreeSet<String>],
	cfg: &RankingDiversity,
) -> f32 {
	let matches = processed
		.iter()
		.filter(|prior| prior.intersection(words).count() >= cfg.min_shared_words)
		.count();

	match cfg.scores.get(matches).or_else(|| cfg.scores.last()) {
		Some(score) => *score,
		None => 1.0,
	}
}

pub fn freshness_score(
	created_at: Option<OffsetDateTime>,
	now: OffsetDateTime,
	cfg: &RankingFreshness,
) -> f32 {
	let Some(created_at) = created_at else {
		return cfg.unknown_score;
	};
	let age_days = (now - created_at).whole_days().max(0);

	cfg.buckets
		.iter()
		.find(|bucket| age_days < bucket.max_age_days)
		.map(|bucket| bucket.score)
		.unwrap_or(cfg.stale_score)
}

/// Share of pantry ingredients named in the title, saturating at `match_cap` matches. An
/// ingredient counts when every one of its words appears as a title word.
pub fn pantry_ratio(title: &str, pantry: &[String], match_cap: u32) -> f32 {
	if pantry.is_empty() || match_cap == 0 {
		return 0.0;
	}

	let title_words = text::word_set(&text::normalize(title));
	let wanted: BTreeSet<String> = pantry
		.iter()
		.map(|ingredient| text::normalize_phrase(ingredient))
		.filter(|ingredient| !ingredient.is_empty())
		.collect();
	let matches = wanted
		.iter()
		.filter(|ingredient| {
			ingredient.split_whitespace().all(|word| text::has_word(&title_words, word))
		})
		.count();

	(matches.min(match_cap as usize) as f32) / match_cap as f32
}

#[cfg(test)]
mod tests {
	use time::{Duration, macros::datetime};

	use super::*;
	use crate::model::{Affinity, TagValue};

	const NOW: OffsetDateTime = datetime!(2026-05-10 09:00 UTC);

	#[test]
	fn vector_score_clamps_and_rejects_nan() {
		assert_eq!(vector_score(1.3), 1.0);
		assert_eq!(vector_score(-0.2), 0.0);
		assert_eq!(vector_score(f32::NAN), 0.0);
		assert_eq!(vector_score(0.42), 0.42);
	}

	#[test]
	fn feedback_averages_over_all_tags() {
		let mut tags = Tags::new();

		tags.insert("region".to_string(), TagValue::Scalar("punjabi".to_string()));
		tags.insert("course".to_string(), TagValue::Scalar("main".to_string()));

		let affinity = AffinityMap::from_entries(
			[(
				"region:punjabi".to_string(),
				Affinity { score: 1.0, confidence: 0.5, observations: 4 },
			)]
			.into_iter()
			.collect(),
		);

		assert!((feedback_score(&tags, &affinity) - 0.75).abs() < 1e-6);
		assert_eq!(feedback_score(&tags, &AffinityMap::default()), 0.5);
		assert_eq!(feedback_score(&Tags::new(), &affinity), 0.5);
	}

	#[test]
	fn diversity_buckets_by_matching_titles() {
		let cfg = RankingDiversity::default();
		let words = text::significant_words("Paneer Butter Masala Curry", 4);
		let similar = text::significant_words("Paneer Butter Masala", 4);
		let different = text::significant_words("Lemon Rice", 4);

		assert_eq!(diversity_score(&words, &[], &cfg), 1.0);
		assert_eq!(diversity_score(&words, &[different.clone()], &cfg), 1.0);
		assert_eq!(diversity_score(&words, &[similar.clone(), different], &cfg), 0.7);
		assert_eq!(diversity_score(&words, &[similar.clone(), similar.clone()], &cfg), 0.4);
		assert_eq!(diversity_score(&words, &vec![similar; 5], &cfg), 0.2);
	}

	#[test]
	fn freshness_follows_age_buckets() {
		let cfg = RankingFreshness::default();

		assert_eq!(freshness_score(None, NOW, &cfg), 0.5);
		assert_eq!(freshness_score(Some(NOW - Duration::days(6)), NOW, &cfg), 1.0);
		assert_eq!(freshness_score(Some(NOW - Duration::days(7)), NOW, &cfg), 0.8);
		assert_eq!(freshness_score(Some(NOW - Duration::days(89)), NOW, &cfg), 0.6);
		assert_eq!(freshness_score(Some(NOW - Duration::days(400)), NOW, &cfg), 0.4);
		assert_eq!(freshness_score(Some(NOW + Duration::days(2)), NOW, &cfg), 1.0);
	}

	#[test]
	fn pantry_ratio_caps_at_three() {
		let pantry: Vec<String> =
			["Paneer", "tomato", "peas", "capsicum"].iter().map(|s| s.to_string()).collect();

		assert_eq!(pantry_ratio("Matar Paneer", &pantry, 3), 1.0 / 3.0);
		assert_eq!(pantry_ratio("Paneer Tomato Peas Capsicum Jalfrezi", &pantry, 3), 1.0);
		assert_eq!(pantry_ratio("Jeera Rice", &pantry, 3), 0.0);
		assert_eq!(pantry_ratio("Matar Paneer", &[], 3), 0.0);
	}

	#[test]
	fn pantry_matches_whole_words_only() {
		let pantry: Vec<String> =
			["peas", "green chilli", "tomato"].iter().map(|s| s.to_string()).collect();

		assert_eq!(pantry_ratio("Peasant Pulao", &pantry, 3), 0.0);
		assert_eq!(pantry_ratio("Tomatoes and Green Chilli Chutney", &pantry, 3), 2.0 / 3.0);
	}
}
