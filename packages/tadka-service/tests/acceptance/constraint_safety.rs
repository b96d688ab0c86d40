use uuid::Uuid;

use tadka_domain::model::{RefinementState, TasteProfile};
use tadka_testkit::fakes::ScriptedRefiner;

use super::{add_veg_catalog, harness, ids, profile, recipe};

#[tokio::test]
async fn pure_veg_user_never_sees_top_scoring_non_veg_recipe() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-veg", "pure_veg"));
	harness.add_recipe(recipe(1, "Chicken Biryani", &[("diet_type", "non_veg")]), 0.99);
	harness.add_recipe(recipe(2, "Egg Bhurji", &[("diet_type", "veg_eggs")]), 0.97);
	harness.add_recipe(recipe(3, "Fish Moilee", &[]), 0.96);
	add_veg_catalog(&harness);

	let batch = harness.recommend("u-veg", 5).await.expect("Recommendation must succeed.");
	let returned = ids(&batch);

	assert_eq!(returned.len(), 5);
	assert!(!returned.contains(&Uuid::from_u128(1)));
	assert!(!returned.contains(&Uuid::from_u128(2)));
	assert!(!returned.contains(&Uuid::from_u128(3)));
	assert_eq!(returned[0], Uuid::from_u128(100));
	assert_eq!(batch.refinement, RefinementState::UnrefinedFallback);
	assert!(!batch.relaxed);
}

#[tokio::test]
async fn jain_user_only_gets_recipes_proven_allium_free() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(TasteProfile { is_jain: true, ..profile("u-jain", "pure_veg") });
	add_veg_catalog(&harness);

	let safe = [
		(40, "Sabudana Khichdi"),
		(41, "Kacche Kele Ki Sabzi"),
		(42, "Moong Dal Chilla"),
		(43, "Lauki Chana Dal"),
		(44, "Tindora Nu Shaak"),
	];

	for (id, title) in safe {
		harness.add_recipe(recipe(id, title, &[("diet_type", "pure_veg"), ("allium", "none")]), 0.5);
	}

	let batch = harness.recommend("u-jain", 10).await.expect("Recommendation must succeed.");
	let mut returned = ids(&batch);

	returned.sort();

	assert_eq!(returned, safe.iter().map(|(id, _)| Uuid::from_u128(*id)).collect::<Vec<_>>());
}

#[tokio::test]
async fn allergen_in_title_excludes_recipe() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(TasteProfile {
		allergies: vec!["peanut".to_string()],
		..profile("u-allergy", "pure_veg")
	});
	harness.add_recipe(recipe(9, "Peanut Chikki", &[("diet_type", "pure_veg")]), 0.98);
	add_veg_catalog(&harness);

	let batch = harness.recommend("u-allergy", 10).await.expect("Recommendation must succeed.");

	assert!(!ids(&batch).contains(&Uuid::from_u128(9)));
	assert_eq!(batch.candidates.len(), 10);
}
