use std::time::Duration;

use uuid::Uuid;

use tadka_domain::model::{ActionKind, TasteProfile};
use tadka_service::{Error, InteractionRequest};
use tadka_testkit::fakes::ScriptedRefiner;

use super::{Harness, NOW, add_veg_catalog, harness, harness_with, ids, profile, recipe};

fn add_sabzi_catalog(harness: &Harness, count: u128) {
	for id in 0..count {
		harness.add_recipe(
			recipe(200 + id, &format!("Sabzi Number {id}"), &[("diet_type", "pure_veg")]),
			0.9 - id as f32 * 0.05,
		);
	}
}

#[tokio::test]
async fn short_pool_returns_every_survivor() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-1", "pure_veg"));

	add_sabzi_catalog(&harness, 9);

	for id in 0..4 {
		harness.add_recipe(
			recipe(300 + id, &format!("Mutton Dish {id}"), &[("diet_type", "non_veg")]),
			0.95,
		);
	}

	let batch = harness.recommend("u-1", 15).await.expect("Recommendation must succeed.");

	assert_eq!(batch.candidates.len(), 9);
	assert_eq!(
		batch.candidates.iter().map(|candidate| candidate.rank).collect::<Vec<_>>(),
		(1..=9).collect::<Vec<u32>>()
	);
	assert!(ids(&batch).iter().all(|id| id.as_u128() < 300));
}

#[tokio::test]
async fn relaxed_pool_returns_every_survivor() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-relax", "pure_veg"));
	add_sabzi_catalog(&harness, 9);

	let first = harness.recommend("u-relax", 5).await.expect("First request must succeed.");

	assert_eq!(first.candidates.len(), 5);
	assert_eq!(harness.store.exclusions_for("u-relax").len(), 5);

	let second = harness.recommend("u-relax", 15).await.expect("Relaxed request must succeed.");

	assert!(second.relaxed);
	assert_eq!(second.candidates.len(), 9);
	assert_eq!(harness.index.search_count(), 3);
}

#[tokio::test]
async fn relaxed_retry_that_stays_short_is_reported() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-thin", "pure_veg"));
	add_sabzi_catalog(&harness, 6);

	let first = harness.recommend("u-thin", 5).await.expect("First request must succeed.");

	for recipe_id in ids(&first).into_iter().take(2) {
		harness
			.service
			.record_interaction(InteractionRequest {
				user_id: "u-thin".to_string(),
				recipe_id,
				action: ActionKind::StrongDislike,
				dwell_secs: None,
				occurred_at: Some(NOW),
			})
			.await
			.expect("Interaction must be recorded.");
	}

	let searches_before = harness.index.search_count();
	let err = harness.recommend("u-thin", 15).await.expect_err("Relaxed pool must stay short.");

	assert!(matches!(err, Error::InsufficientCandidates { found: 4, required: 5 }), "{err:?}");
	assert_eq!(harness.index.search_count() - searches_before, 2);
}

#[tokio::test]
async fn too_few_candidates_is_reported() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-2", "pure_veg"));

	for (id, title) in [(1, "Aloo Matar"), (2, "Palak Paneer"), (3, "Dal Tadka")] {
		harness.add_recipe(recipe(id, title, &[("diet_type", "pure_veg")]), 0.8);
	}

	let err = harness.recommend("u-2", 10).await.expect_err("Three recipes must not be enough.");

	assert!(matches!(err, Error::InsufficientCandidates { found: 3, required: 5 }), "{err:?}");
}

#[tokio::test]
async fn slow_index_times_out() {
	let harness = harness_with(ScriptedRefiner::failing(), |cfg| cfg.retrieval.timeout_ms = 50);

	harness.store.insert_profile(profile("u-3", "pure_veg"));
	add_veg_catalog(&harness);
	harness.index.set_delay(Some(Duration::from_millis(500)));

	let err = harness.recommend("u-3", 5).await.expect_err("Retrieval must time out.");

	assert!(matches!(err, Error::RetrievalTimeout { timeout_ms: 50 }), "{err:?}");
	assert!(harness.store.exclusions_for("u-3").is_empty());
}

#[tokio::test]
async fn missing_or_unfinished_profiles_are_rejected() {
	let harness = harness(ScriptedRefiner::failing());

	add_veg_catalog(&harness);
	harness.store.insert_profile(TasteProfile {
		onboarding_completed: false,
		..profile("u-new", "pure_veg")
	});

	let missing = harness.recommend("u-ghost", 5).await.expect_err("Unknown user must fail.");
	let unfinished = harness.recommend("u-new", 5).await.expect_err("Onboarding must be required.");

	assert!(matches!(missing, Error::ProfileNotFound { .. }), "{missing:?}");
	assert!(matches!(unfinished, Error::OnboardingIncomplete { .. }), "{unfinished:?}");
}

#[tokio::test]
async fn limit_is_clamped_to_configured_range() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-4", "pure_veg"));
	add_veg_catalog(&harness);

	let batch = harness.recommend("u-4", 1).await.expect("Recommendation must succeed.");

	assert_eq!(batch.candidates.len(), 5);
}

#[tokio::test]
async fn profile_without_stored_vector_is_embedded_once() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(TasteProfile { taste_vector: None, ..profile("u-5", "pure_veg") });
	add_veg_catalog(&harness);

	let batch = harness.recommend("u-5", 5).await.expect("Recommendation must succeed.");

	assert_eq!(harness.embedding.calls(), 1);
	assert_eq!(ids(&batch)[0], Uuid::from_u128(100));
}

#[tokio::test]
async fn identical_inputs_give_identical_batches() {
	let mut batches = Vec::new();

	for _ in 0..2 {
		let harness = harness(ScriptedRefiner::failing());

		harness.store.insert_profile(profile("u-6", "pure_veg"));
		add_veg_catalog(&harness);

		batches.push(harness.recommend("u-6", 8).await.expect("Recommendation must succeed."));
	}

	let scores = |index: usize| {
		batches[index].candidates.iter().map(|candidate| candidate.combined).collect::<Vec<_>>()
	};

	assert_eq!(ids(&batches[0]), ids(&batches[1]));
	assert_eq!(scores(0), scores(1));
}
