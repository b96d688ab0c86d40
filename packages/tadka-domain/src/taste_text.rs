//! Natural-language rendering of onboarding answers.
//!
//! The output reads like a recipe description so it can be embedded into the same space as the
//! catalog when a user has no stored taste vector. A shorter form doubles as the profile summary
//! sent to the refiner.

use crate::model::TasteProfile;

pub fn build_taste_text(profile: &TasteProfile) -> String {
	let mut parts: Vec<String> = Vec::new();

	parts.push(
		match profile.diet_type.as_deref() {
			Some("pure_veg") => "Looking for pure vegetarian Indian recipes, no eggs.",
			Some("veg_eggs") => "Looking for vegetarian Indian recipes, eggs are okay.",
			Some("non_veg") => "Looking for Indian recipes including non-vegetarian options.",
			Some("vegetarian") => "Looking for vegetarian Indian recipes.",
			_ => "Looking for Indian recipes.",
		}
		.to_string(),
	);

	let restrictions = restrictions(profile);

	if !restrictions.is_empty() {
		parts.push(format!("Dietary restrictions: {}.", restrictions.join(", ")));
	}
	if !profile.regions.is_empty() {
		let regions: Vec<String> = profile.regions.iter().map(|region| region_name(region)).collect();

		parts.push(format!("Prefers {} cuisine.", regions.join(" and ")));
	}
	if let Some(heat) = profile.heat_level.and_then(heat_text) {
		parts.push(heat.to_string());
	}
	if let Some(text) = profile.sweetness_in_savory.as_deref().and_then(|value| match value {
		"never" => Some("Does not like sweetness in savory dishes."),
		"subtle" => Some("Enjoys subtle sweetness in savory dishes like Gujarati style."),
		"regular" => Some("Likes regular sweetness in savory dishes."),
		_ => None,
	}) {
		parts.push(text.to_string());
	}
	if !profile.gravy_preferences.is_empty() {
		let gravies: Vec<String> = profile
			.gravy_preferences
			.iter()
			.map(|gravy| {
				match gravy.as_str() {
					"dry" => "dry preparations",
					"semi_dry" => "semi-dry dishes",
					"medium" => "medium gravy",
					"thin" => "thin gravy curries",
					"mixed" => "variety of gravy types",
					other => other,
				}
				.to_string()
			})
			.collect();

		parts.push(format!("Prefers {}.", gravies.join(", ")));
	}
	if let Some(text) = profile.fat_richness.as_deref().and_then(|value| match value {
		"light" => Some("Prefers light, healthy cooking with less oil and ghee."),
		"medium" => Some("Enjoys balanced richness, moderate use of fats."),
		"rich" => Some("Loves rich, indulgent dishes with generous ghee and cream."),
		_ => None,
	}) {
		parts.push(text.to_string());
	}
	if let Some(text) = profile.cooking_fat.as_deref().and_then(|value| match value {
		"ghee" => Some("Prefers cooking with ghee."),
		"mustard" => Some("Prefers mustard oil for cooking (Bengali/Eastern style)."),
		"coconut" => Some("Prefers coconut oil for cooking (South Indian style)."),
		"vegetable" => Some("Uses vegetable/neutral oil for cooking."),
		_ => None,
	}) {
		parts.push(text.to_string());
	}
	if let Some(text) = profile.primary_staple.as_deref().and_then(|value| match value {
		"rice" => Some("Rice is the primary staple, prefers rice-based meals."),
		"roti" => Some("Roti/chapati is the primary staple, prefers bread-based meals."),
		"both" => Some("Enjoys both rice and roti equally."),
		_ => None,
	}) {
		parts.push(text.to_string());
	}
	if !profile.signature_masalas.is_empty() {
		let masalas: Vec<String> =
			profile.signature_masalas.iter().map(|masala| masala_name(masala)).collect();

		parts.push(format!("Uses {} in cooking.", masalas.join(", ")));
	}
	if !profile.health_modifications.is_empty() {
		let goals: Vec<String> = profile
			.health_modifications
			.iter()
			.map(|goal| {
				match goal.as_str() {
					"diabetes" => "diabetic-friendly recipes",
					"low_oil" => "low-oil cooking",
					"low_salt" => "low-sodium recipes",
					"high_protein" => "high-protein dishes",
					"low_carb" => "low-carb options",
					"heart_healthy" => "heart-healthy cooking",
					other => other,
				}
				.to_string()
			})
			.collect();

		parts.push(format!("Prefers {}.", goals.join(", ")));
	}
	if let Some(minutes) = profile.time_available_weekday.filter(|minutes| *minutes > 0) {
		parts.push(time_text(minutes).to_string());
	}
	if !profile.specific_prohibitions.is_empty() {
		let dislikes: Vec<String> =
			profile.specific_prohibitions.iter().map(|item| item.replace('_', " ")).collect();

		parts.push(format!("Does not like: {}.", dislikes.join(", ")));
	}
	if let Some(text) = profile.skill_level.as_deref().and_then(|value| match value {
		"beginner" => Some("Beginner cook, prefers simple recipes."),
		"intermediate" => Some("Intermediate cooking skills."),
		"advanced" => Some("Advanced cook, can handle complex recipes."),
		_ => None,
	}) {
		parts.push(text.to_string());
	}
	if profile.multigenerational_household
		|| profile.household_type.as_deref().is_some_and(|household| household.contains("family"))
	{
		parts.push("Cooking for family, needs crowd-pleasing recipes.".to_string());
	}
	if let Some(text) = profile.experimentation_level.as_deref().and_then(|value| match value {
		"stick_to_familiar" => Some("Prefers familiar, traditional recipes."),
		"open_within_comfort" => Some("Open to trying new recipes within comfort zone."),
		"love_experimenting" => Some("Loves experimenting with new cuisines and fusion."),
		_ => None,
	}) {
		parts.push(text.to_string());
	}

	parts.join(" ")
}

/// Diet, restrictions, regions, heat and time budget in one short paragraph.
pub fn build_summary(profile: &TasteProfile) -> String {
	let mut lines = vec![format!("Diet: {}", profile.diet_type.as_deref().unwrap_or("unspecified"))];
	let restrictions = restrictions(profile);

	if !restrictions.is_empty() {
		lines.push(format!("Restrictions: {}", restrictions.join(", ")));
	}
	if !profile.allergies.is_empty() {
		lines.push(format!("Allergies: {}", profile.allergies.join(", ")));
	}
	if !profile.regions.is_empty() {
		let regions: Vec<String> = profile.regions.iter().map(|region| region_name(region)).collect();

		lines.push(format!("Regions: {}", regions.join(", ")));
	}
	if let Some(heat) = profile.heat_level {
		lines.push(format!("Heat level: {heat}/5"));
	}
	if let Some(minutes) = profile.time_available_weekday {
		lines.push(format!("Weekday time: {minutes} minutes"));
	}
	if !profile.specific_prohibitions.is_empty() {
		lines.push(format!("Avoids: {}", profile.specific_prohibitions.join(", ")));
	}

	lines.join("\n")
}

fn restrictions(profile: &TasteProfile) -> Vec<&'static str> {
	let mut out = Vec::new();

	if profile.no_beef {
		out.push("no beef");
	}
	if profile.no_pork {
		out.push("no pork");
	}
	if profile.is_halal {
		out.push("halal only");
	}

	match (profile.is_jain, profile.allium_status.as_deref()) {
		(true, _) | (false, Some("no_both")) => out.push("no onion and garlic (Jain)"),
		(false, Some("no_onion")) => out.push("no onion"),
		(false, Some("no_garlic")) => out.push("no garlic"),
		_ => {},
	}

	if profile.is_gluten_free {
		out.push("gluten-free");
	}
	if profile.is_dairy_free {
		out.push("dairy-free");
	}

	out
}

fn region_name(region: &str) -> String {
	match region {
		"north_indian" => "North Indian".to_string(),
		"south_indian" => "South Indian".to_string(),
		other => other
			.split('_')
			.filter(|word| !word.is_empty())
			.map(|word| {
				let mut chars = word.chars();

				match chars.next() {
					Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
					None => String::new(),
				}
			})
			.collect::<Vec<_>>()
			.join(" "),
	}
}

fn masala_name(masala: &str) -> String {
	match masala {
		"garam_masala" => "garam masala",
		"sambar_powder" => "sambar powder (South Indian)",
		"goda_masala" => "goda masala (Maharashtrian)",
		"panch_phoron" => "panch phoron (Bengali)",
		"rasam_powder" => "rasam powder (South Indian)",
		"chole_masala" => "chole masala (North Indian)",
		"kitchen_king" => "kitchen king masala",
		"pav_bhaji_masala" => "pav bhaji masala",
		"biryani_masala" => "biryani masala",
		other => other,
	}
	.to_string()
}

fn heat_text(level: u8) -> Option<&'static str> {
	match level {
		1 => Some("Prefers very mild, kid-friendly spice levels."),
		2 => Some("Prefers mild spice, gentle flavors."),
		3 => Some("Enjoys medium spice level, standard Indian heat."),
		4 => Some("Loves spicy food, high heat preferred."),
		5 => Some("Craves very hot and spicy dishes, maximum heat."),
		_ => None,
	}
}

fn time_text(minutes: u32) -> &'static str {
	match minutes {
		0..=20 => "Needs quick recipes under 20 minutes.",
		21..=30 => "Prefers recipes that take 20-30 minutes.",
		31..=45 => "Has 30-45 minutes for cooking.",
		_ => "Has time for elaborate cooking, 45+ minutes okay.",
	}
}
