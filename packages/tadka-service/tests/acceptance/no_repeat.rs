use time::Duration;
use uuid::Uuid;

use tadka_domain::model::{ActionKind, ExclusionKind};
use tadka_service::{InteractionRequest, exclusion::ExclusionTracker};
use tadka_testkit::fakes::ScriptedRefiner;

use super::{NOW, add_veg_catalog, harness, ids, profile, recipe};

fn strong_dislike(user_id: &str, id: u128) -> InteractionRequest {
	InteractionRequest {
		user_id: user_id.to_string(),
		recipe_id: Uuid::from_u128(id),
		action: ActionKind::StrongDislike,
		dwell_secs: None,
		occurred_at: Some(NOW - Duration::days(1)),
	}
}

#[tokio::test]
async fn rejected_recipe_stays_out_despite_high_similarity() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-1", "pure_veg"));
	harness.add_recipe(recipe(7, "Paneer Tikka", &[("diet_type", "pure_veg")]), 0.95);
	add_veg_catalog(&harness);

	let response = harness
		.service
		.record_interaction(strong_dislike("u-1", 7))
		.await
		.expect("Interaction must be recorded.");

	assert!(response.permanently_excluded);

	let batch = harness.recommend("u-1", 10).await.expect("Recommendation must succeed.");

	assert!(!ids(&batch).contains(&Uuid::from_u128(7)));
	assert_eq!(harness.store.signals_for("u-1").len(), 1);
}

#[tokio::test]
async fn shown_recipes_are_not_repeated_within_cooldown() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-2", "pure_veg"));
	add_veg_catalog(&harness);

	let first = harness.recommend("u-2", 5).await.expect("First request must succeed.");
	let second = harness.recommend("u-2", 5).await.expect("Second request must succeed.");

	assert!(!second.relaxed);
	assert!(ids(&second).iter().all(|id| !ids(&first).contains(id)));

	let records = harness.store.exclusions_for("u-2");

	assert_eq!(records.len(), 10);
	assert!(records.iter().all(|record| {
		record.kind == ExclusionKind::Cooldown
			&& record.effective_until == Some(NOW + Duration::days(7))
	}));
}

#[tokio::test]
async fn cooldown_lapses_after_ttl() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-3", "pure_veg"));
	add_veg_catalog(&harness);

	let first = harness.recommend("u-3", 5).await.expect("First request must succeed.");
	let req = tadka_service::RecommendRequest {
		limit: Some(5),
		..tadka_service::RecommendRequest::for_user("u-3")
	};
	let later = harness
		.service
		.generate_recommendations_at(req, NOW + Duration::days(7))
		.await
		.expect("Later request must succeed.");

	let mut again = ids(&later);
	let mut before = ids(&first);

	again.sort();
	before.sort();

	assert!(!later.relaxed);
	assert_eq!(again, before);
}

#[tokio::test]
async fn relaxation_drops_cooldowns_but_keeps_rejections() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-4", "pure_veg"));
	harness.add_recipe(recipe(7, "Paneer Tikka", &[("diet_type", "pure_veg")]), 0.95);
	add_veg_catalog(&harness);
	harness
		.service
		.record_interaction(strong_dislike("u-4", 7))
		.await
		.expect("Interaction must be recorded.");

	let first = harness.recommend("u-4", 10).await.expect("First request must succeed.");

	assert_eq!(first.candidates.len(), 10);
	assert_eq!(harness.index.search_count(), 1);

	let second = harness.recommend("u-4", 5).await.expect("Relaxed request must succeed.");

	assert!(second.relaxed);
	assert_eq!(second.candidates.len(), 5);
	assert!(!ids(&second).contains(&Uuid::from_u128(7)));
	assert_eq!(harness.index.search_count(), 3);
}

#[tokio::test]
async fn rejection_is_idempotent_and_outranks_cooldowns() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-5", "pure_veg"));
	harness.add_recipe(recipe(7, "Paneer Tikka", &[("diet_type", "pure_veg")]), 0.95);

	for _ in 0..2 {
		harness
			.service
			.record_interaction(strong_dislike("u-5", 7))
			.await
			.expect("Interaction must be recorded.");
	}

	let tracker = ExclusionTracker::new(harness.store.clone());

	tracker
		.record_shown("u-5", &[Uuid::from_u128(7)], Duration::days(7), NOW)
		.await
		.expect("Cooldown write must succeed.");

	let records = harness.store.exclusions_for("u-5");

	assert_eq!(records.len(), 1);
	assert_eq!(records[0].kind, ExclusionKind::Permanent);
	assert_eq!(records[0].effective_until, None);
}

#[tokio::test]
async fn failed_cooldown_write_does_not_fail_the_request() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-6", "pure_veg"));
	add_veg_catalog(&harness);
	harness.store.fail_cooldown_writes(true);

	let batch = harness.recommend("u-6", 5).await.expect("Recommendation must succeed.");

	assert_eq!(batch.candidates.len(), 5);
	assert!(harness.store.exclusions_for("u-6").is_empty());
}

#[tokio::test]
async fn expired_cooldowns_are_purged() {
	let harness = harness(ScriptedRefiner::failing());

	harness.store.insert_profile(profile("u-7", "pure_veg"));
	harness.add_recipe(recipe(7, "Paneer Tikka", &[("diet_type", "pure_veg")]), 0.95);
	add_veg_catalog(&harness);
	harness
		.service
		.record_interaction(strong_dislike("u-7", 7))
		.await
		.expect("Interaction must be recorded.");
	harness.recommend("u-7", 5).await.expect("Recommendation must succeed.");

	let report = harness
		.service
		.purge_expired_cooldowns_at(NOW + Duration::days(8))
		.await
		.expect("Purge must succeed.");

	assert_eq!(report.purged, 5);
	assert_eq!(harness.store.exclusions_for("u-7").len(), 1);
}
