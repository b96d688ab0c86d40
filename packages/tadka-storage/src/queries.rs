use time::OffsetDateTime;
use uuid::Uuid;

use tadka_domain::model::{
	CandidateItem, ExclusionKind, ExclusionRecord, InteractionSignal, TaggedSignal, TasteProfile,
};

use crate::{
	Error, Result,
	db::Db,
	models::{self, ExclusionRow, RecipeRow, SignalRow, UserProfileRow},
};

pub async fn load_profile(db: &Db, user_id: &str) -> Result<Option<TasteProfile>> {
	let row: Option<UserProfileRow> = sqlx::query_as(
		"\
SELECT user_id, onboarding_completed, answers, taste_vector, updated_at
FROM user_profiles
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	row.map(UserProfileRow::into_profile).transpose()
}

pub async fn upsert_profile(db: &Db, profile: &TasteProfile) -> Result<()> {
	if profile.user_id.trim().is_empty() {
		return Err(Error::InvalidArgument("Profile user_id must be non-empty.".to_string()));
	}

	let answers = models::profile_answers(profile)?;

	sqlx::query(
		"\
INSERT INTO user_profiles (user_id, onboarding_completed, answers, taste_vector)
VALUES ($1, $2, $3, $4)
ON CONFLICT (user_id) DO UPDATE
SET
	onboarding_completed = EXCLUDED.onboarding_completed,
	answers = EXCLUDED.answers,
	taste_vector = EXCLUDED.taste_vector,
	updated_at = now()",
	)
	.bind(profile.user_id.as_str())
	.bind(profile.onboarding_completed)
	.bind(&answers)
	.bind(profile.taste_vector.as_deref())
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn upsert_recipe(db: &Db, item: &CandidateItem) -> Result<()> {
	let minutes = item
		.total_time_minutes
		.map(i32::try_from)
		.transpose()
		.map_err(|_| Error::InvalidArgument("total_time_minutes is out of range.".to_string()))?;

	sqlx::query(
		"\
INSERT INTO recipes (recipe_id, title, description, tags, total_time_minutes, created_at)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (recipe_id) DO UPDATE
SET
	title = EXCLUDED.title,
	description = EXCLUDED.description,
	tags = EXCLUDED.tags,
	total_time_minutes = EXCLUDED.total_time_minutes,
	created_at = EXCLUDED.created_at",
	)
	.bind(item.recipe_id)
	.bind(item.title.as_str())
	.bind(item.description.as_deref())
	.bind(models::tags_to_json(&item.tags))
	.bind(minutes)
	.bind(item.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Hydrates catalog items. Unknown ids are skipped; the result is in no particular order.
pub async fn load_recipes(db: &Db, recipe_ids: &[Uuid]) -> Result<Vec<CandidateItem>> {
	if recipe_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows: Vec<RecipeRow> = sqlx::query_as(
		"\
SELECT recipe_id, title, description, tags, total_time_minutes, created_at
FROM recipes
WHERE recipe_id = ANY($1)",
	)
	.bind(recipe_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(RecipeRow::into_item).collect())
}

/// Interactions at or after `since`, each joined with the tags of its recipe.
pub async fn load_signals(
	db: &Db,
	user_id: &str,
	since: OffsetDateTime,
) -> Result<Vec<TaggedSignal>> {
	let rows: Vec<SignalRow> = sqlx::query_as(
		"\
SELECT s.action, s.occurred_at, s.dwell_secs, r.tags
FROM interaction_signals s
JOIN recipes r ON r.recipe_id = s.recipe_id
WHERE s.user_id = $1 AND s.occurred_at >= $2
ORDER BY s.occurred_at ASC",
	)
	.bind(user_id)
	.bind(since)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().filter_map(SignalRow::into_tagged).collect())
}

pub async fn insert_signal(db: &Db, signal: &InteractionSignal) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO interaction_signals (user_id, recipe_id, action, dwell_secs, occurred_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(signal.user_id.as_str())
	.bind(signal.recipe_id)
	.bind(signal.action.as_str())
	.bind(signal.dwell_secs)
	.bind(signal.occurred_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Permanent rows plus cooldowns still running at `now`.
pub async fn load_exclusions(
	db: &Db,
	user_id: &str,
	now: OffsetDateTime,
) -> Result<Vec<ExclusionRecord>> {
	let rows: Vec<ExclusionRow> = sqlx::query_as(
		"\
SELECT user_id, recipe_id, kind, effective_until
FROM recommendation_exclusions
WHERE user_id = $1
	AND (kind = 'permanent' OR effective_until > $2)",
	)
	.bind(user_id)
	.bind(now)
	.fetch_all(&db.pool)
	.await?;

	rows.into_iter().map(ExclusionRow::into_record).collect()
}

/// Records a rejection. Upgrades an existing cooldown; repeating the call changes nothing.
pub async fn insert_permanent(db: &Db, user_id: &str, recipe_id: Uuid) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO recommendation_exclusions (user_id, recipe_id, kind, effective_until)
VALUES ($1, $2, 'permanent', NULL)
ON CONFLICT (user_id, recipe_id) DO UPDATE
SET kind = 'permanent', effective_until = NULL, updated_at = now()
WHERE recommendation_exclusions.kind = 'cooldown'",
	)
	.bind(user_id)
	.bind(recipe_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Writes cooldown rows in one transaction. Existing cooldowns take the new end time; permanent
/// rows are left untouched.
pub async fn insert_cooldowns(db: &Db, records: &[ExclusionRecord]) -> Result<()> {
	if records.is_empty() {
		return Ok(());
	}

	let mut tx = db.pool.begin().await?;

	for record in records {
		let Some(until) = record.effective_until.filter(|_| record.kind == ExclusionKind::Cooldown)
		else {
			return Err(Error::InvalidArgument(format!(
				"Cooldown for recipe {} needs kind cooldown and an end time.",
				record.recipe_id
			)));
		};

		sqlx::query(
			"\
INSERT INTO recommendation_exclusions (user_id, recipe_id, kind, effective_until)
VALUES ($1, $2, 'cooldown', $3)
ON CONFLICT (user_id, recipe_id) DO UPDATE
SET effective_until = EXCLUDED.effective_until, updated_at = now()
WHERE recommendation_exclusions.kind = 'cooldown'",
		)
		.bind(record.user_id.as_str())
		.bind(record.recipe_id)
		.bind(until)
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(())
}

/// Deletes cooldown rows that ended at or before `now`. Returns the number removed.
pub async fn purge_expired_cooldowns(db: &Db, now: OffsetDateTime) -> Result<u64> {
	let result = sqlx::query(
		"\
DELETE FROM recommendation_exclusions
WHERE kind = 'cooldown' AND effective_until <= $1",
	)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}
