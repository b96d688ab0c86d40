use std::time::{Duration, Instant};

use serde_json::{Value, json};
use uuid::Uuid;

use tadka_domain::model::RefinementState;
use tadka_testkit::fakes::{self, ScriptedRefiner};

use super::{add_veg_catalog, harness, harness_with, ids, profile};

#[tokio::test]
async fn refiner_reorders_and_explains() {
	let harness = harness(ScriptedRefiner::new(|messages| {
		let picks: Vec<Value> = fakes::listed_candidate_ids(messages)
			.into_iter()
			.take(3)
			.rev()
			.map(|id| json!({ "recipe_id": id.to_string(), "explanation": "Fits a weeknight." }))
			.collect();

		Ok(json!({ "recommendations": picks }))
	}));

	harness.store.insert_profile(profile("u-1", "pure_veg"));
	add_veg_catalog(&harness);

	let batch = harness.recommend("u-1", 5).await.expect("Recommendation must succeed.");

	assert_eq!(batch.refinement, RefinementState::Refined);
	assert_eq!(ids(&batch), vec![Uuid::from_u128(102), Uuid::from_u128(101), Uuid::from_u128(100)]);
	assert_eq!(
		batch.candidates.iter().map(|candidate| candidate.rank).collect::<Vec<_>>(),
		vec![1, 2, 3]
	);
	assert!(
		batch
			.candidates
			.iter()
			.all(|candidate| candidate.explanation.as_deref() == Some("Fits a weeknight."))
	);
	assert_eq!(harness.refiner.calls(), 1);
}

#[tokio::test]
async fn hanging_refiner_falls_back_to_ranked_order() {
	let harness = harness_with(ScriptedRefiner::hanging(), |cfg| cfg.refinement.timeout_ms = 50);
	let baseline = harness_with(ScriptedRefiner::failing(), |cfg| cfg.refinement.enabled = false);

	for target in [&harness, &baseline] {
		target.store.insert_profile(profile("u-2", "pure_veg"));
		add_veg_catalog(target);
	}

	let started = Instant::now();
	let batch = harness.recommend("u-2", 5).await.expect("Recommendation must succeed.");
	let expected = baseline.recommend("u-2", 5).await.expect("Recommendation must succeed.");

	assert!(started.elapsed() < Duration::from_secs(5));
	assert_eq!(batch.refinement, RefinementState::UnrefinedFallback);
	assert_eq!(ids(&batch), ids(&expected));
	assert!(batch.candidates.iter().all(|candidate| candidate.explanation.is_none()));
}

#[tokio::test]
async fn reply_naming_unknown_recipe_is_ignored() {
	let harness = harness(ScriptedRefiner::replying(json!({
		"recommendations": [
			{ "recipe_id": Uuid::from_u128(9_999).to_string(), "explanation": "Invented." }
		]
	})));

	harness.store.insert_profile(profile("u-3", "pure_veg"));
	add_veg_catalog(&harness);

	let batch = harness.recommend("u-3", 5).await.expect("Recommendation must succeed.");

	assert_eq!(batch.refinement, RefinementState::UnrefinedFallback);
	assert_eq!(batch.candidates.len(), 5);
	assert_eq!(ids(&batch)[0], Uuid::from_u128(100));
}

#[tokio::test]
async fn disabled_refinement_never_calls_the_provider() {
	let harness = harness_with(ScriptedRefiner::failing(), |cfg| cfg.refinement.enabled = false);

	harness.store.insert_profile(profile("u-4", "pure_veg"));
	add_veg_catalog(&harness);

	let batch = harness.recommend("u-4", 5).await.expect("Recommendation must succeed.");

	assert_eq!(harness.refiner.calls(), 0);
	assert_eq!(batch.refinement, RefinementState::UnrefinedFallback);
}
