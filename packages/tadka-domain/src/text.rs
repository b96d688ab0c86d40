use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// NFKC-normalized, lowercased copy of `input`. All matching runs on this form.
pub fn normalize(input: &str) -> String {
	input.nfkc().collect::<String>().to_lowercase()
}

/// Normalizes a user-entered phrase such as `bitter_gourd` into `bitter gourd`.
pub fn normalize_phrase(input: &str) -> String {
	normalize(input).replace('_', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_set(normalized: &str) -> BTreeSet<String> {
	normalized.unicode_words().map(str::to_string).collect()
}

/// Whole-word match that also accepts the simple plural forms of `keyword`.
pub fn has_word(words: &BTreeSet<String>, keyword: &str) -> bool {
	words.contains(keyword)
		|| words.contains(&format!("{keyword}s"))
		|| words.contains(&format!("{keyword}es"))
}

pub fn has_any_word(words: &BTreeSet<String>, keywords: &[&str]) -> bool {
	keywords.iter().any(|keyword| has_word(words, keyword))
}

pub fn contains_any(normalized: &str, needles: &[&str]) -> bool {
	needles.iter().any(|needle| normalized.contains(needle))
}

/// Words of at least `min_chars` characters, used for title overlap.
pub fn significant_words(title: &str, min_chars: usize) -> BTreeSet<String> {
	normalize(title)
		.unicode_words()
		.filter(|word| word.chars().count() >= min_chars)
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_folds_width_and_case() {
		assert_eq!(normalize("ＰＡＮＥＥＲ Tikka"), "paneer tikka");
	}

	#[test]
	fn phrases_drop_underscores_and_extra_spaces() {
		assert_eq!(normalize_phrase("  Bitter_Gourd "), "bitter gourd");
	}

	#[test]
	fn whole_words_accept_plurals_only() {
		let words = word_set(&normalize("Baingan (eggplant) with boiled Eggs"));

		assert!(has_word(&words, "egg"));
		assert!(!has_word(&word_set("smoky eggplant bharta"), "egg"));
		assert!(has_any_word(&word_set("prawns masala"), &["chicken", "prawn"]));
	}

	#[test]
	fn significant_words_skip_short_tokens() {
		let words = significant_words("Dal Makhani, Punjabi style", 4);

		assert_eq!(
			words.into_iter().collect::<Vec<_>>(),
			vec!["makhani".to_string(), "punjabi".to_string(), "style".to_string()]
		);
	}
}
