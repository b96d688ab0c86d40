use time::{Duration, OffsetDateTime, macros::datetime};
use tokio::runtime::Runtime;
use uuid::Uuid;

use tadka_config::Postgres;
use tadka_domain::{
	exclusion,
	model::{
		ActionKind, CandidateItem, ExclusionKind, InteractionSignal, TagValue, Tags, TasteProfile,
	},
};
use tadka_storage::{db::Db, queries};
use tadka_testkit::TestDatabase;

const NOW: OffsetDateTime = datetime!(2026-05-10 12:00 UTC);
const VECTOR_DIM: u32 = 4;

fn recipe(id: u128, title: &str) -> CandidateItem {
	let mut tags = Tags::new();

	tags.insert("region".to_string(), TagValue::Scalar("punjabi".to_string()));
	tags.insert(
		"ingredients".to_string(),
		TagValue::MultiSelect(vec!["rajma".to_string(), "onion".to_string()]),
	);

	CandidateItem {
		recipe_id: Uuid::from_u128(id),
		title: title.to_string(),
		description: Some("Weeknight staple.".to_string()),
		tags,
		total_time_minutes: Some(40),
		created_at: Some(NOW - Duration::days(3)),
	}
}

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(VECTOR_DIM).await.expect("Failed to ensure schema.");

	db
}

#[test]
#[ignore = "Requires external Postgres. Set TADKA_PG_DSN to run."]
fn exclusion_table_exists_after_bootstrap() {
	let Some(dsn) = tadka_testkit::env_dsn() else {
		eprintln!("Skipping exclusion_table_exists_after_bootstrap; set TADKA_PG_DSN to run this test.");

		return;
	};
	let rt = Runtime::new().expect("Failed to build runtime.");

	rt.block_on(async {
		let test_db = TestDatabase::new(&dsn).await.expect("Failed to create test database.");
		let db = bootstrap(&test_db).await;

		// A second bootstrap must be a no-op.
		db.ensure_schema(VECTOR_DIM).await.expect("Failed to re-run schema.");

		let count: i64 = sqlx::query_scalar(
			"SELECT count(*) FROM information_schema.tables WHERE table_name = 'recommendation_exclusions'",
		)
		.fetch_one(&db.pool)
		.await
		.expect("Failed to query schema tables.");

		assert_eq!(count, 1);

		test_db.cleanup().await.expect("Failed to cleanup test database.");
	});
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TADKA_PG_DSN to run."]
async fn permanent_rejection_survives_cooldown_writes() {
	let Some(base_dsn) = tadka_testkit::env_dsn() else {
		eprintln!("Skipping permanent_rejection_survives_cooldown_writes; set TADKA_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let rejected = Uuid::from_u128(7);
	let shown = Uuid::from_u128(8);

	queries::insert_permanent(&db, "u-1", rejected).await.expect("Failed to insert rejection.");
	queries::insert_permanent(&db, "u-1", rejected).await.expect("Rejection must be idempotent.");

	let cooldowns =
		exclusion::cooldown_records("u-1", &[rejected, shown], Duration::days(7), NOW);

	queries::insert_cooldowns(&db, &cooldowns).await.expect("Failed to insert cooldowns.");
	queries::insert_cooldowns(&db, &cooldowns).await.expect("Cooldowns must be idempotent.");

	let mut records =
		queries::load_exclusions(&db, "u-1", NOW).await.expect("Failed to load exclusions.");

	records.sort_by_key(|record| record.recipe_id);

	assert_eq!(records.len(), 2);
	assert_eq!(records[0].recipe_id, rejected);
	assert_eq!(records[0].kind, ExclusionKind::Permanent);
	assert_eq!(records[0].effective_until, None);
	assert_eq!(records[1].kind, ExclusionKind::Cooldown);

	let later = queries::load_exclusions(&db, "u-1", NOW + Duration::days(8))
		.await
		.expect("Failed to load exclusions.");

	assert_eq!(later.len(), 1);

	let purged = queries::purge_expired_cooldowns(&db, NOW + Duration::days(8))
		.await
		.expect("Failed to purge cooldowns.");

	assert_eq!(purged, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TADKA_PG_DSN to run."]
async fn signals_come_back_with_recipe_tags() {
	let Some(base_dsn) = tadka_testkit::env_dsn() else {
		eprintln!("Skipping signals_come_back_with_recipe_tags; set TADKA_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let item = recipe(1, "Rajma Chawal");

	queries::upsert_recipe(&db, &item).await.expect("Failed to insert recipe.");

	for (days_ago, action) in [(2, ActionKind::Cooked), (90, ActionKind::Like)] {
		let signal = InteractionSignal {
			user_id: "u-2".to_string(),
			recipe_id: item.recipe_id,
			action,
			occurred_at: NOW - Duration::days(days_ago),
			dwell_secs: None,
		};

		queries::insert_signal(&db, &signal).await.expect("Failed to insert signal.");
	}

	let signals = queries::load_signals(&db, "u-2", NOW - Duration::days(60))
		.await
		.expect("Failed to load signals.");

	assert_eq!(signals.len(), 1);
	assert_eq!(signals[0].action, ActionKind::Cooked);
	assert_eq!(signals[0].tags, item.tags);

	let loaded = queries::load_recipes(&db, &[item.recipe_id, Uuid::from_u128(99)])
		.await
		.expect("Failed to load recipes.");

	assert_eq!(loaded, vec![item]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TADKA_PG_DSN to run."]
async fn profile_round_trips_with_taste_vector() {
	let Some(base_dsn) = tadka_testkit::env_dsn() else {
		eprintln!("Skipping profile_round_trips_with_taste_vector; set TADKA_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let profile = TasteProfile {
		user_id: "u-3".to_string(),
		onboarding_completed: true,
		diet_type: Some("pure_veg".to_string()),
		is_jain: true,
		allergies: vec!["peanut".to_string()],
		taste_vector: Some(vec![0.1, 0.2, 0.3, 0.4]),
		..TasteProfile::default()
	};

	queries::upsert_profile(&db, &profile).await.expect("Failed to store profile.");

	let loaded = queries::load_profile(&db, "u-3").await.expect("Failed to load profile.");

	assert_eq!(loaded, Some(profile));
	assert_eq!(queries::load_profile(&db, "nobody").await.expect("Failed to query."), None);

	let wrong_dim = TasteProfile {
		user_id: "u-4".to_string(),
		taste_vector: Some(vec![1.0]),
		..TasteProfile::default()
	};

	assert!(queries::upsert_profile(&db, &wrong_dim).await.is_err());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
