//! Store and index implementations over `tadka-storage`.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use tadka_domain::model::{
	CandidateItem, ExclusionRecord, InteractionSignal, TaggedSignal, TasteProfile,
};
use tadka_storage::{db::Db, qdrant::QdrantStore, queries};

use crate::{
	BoxFuture, CatalogStore, ExclusionStore, IndexHit, ProfileStore, Result, Stores, VectorIndex,
};

impl Stores {
	/// Postgres for profiles, catalog and exclusions; Qdrant for nearest-neighbour search.
	pub fn postgres(db: Db, qdrant: QdrantStore) -> Self {
		let db = Arc::new(db);

		Self { profiles: db.clone(), catalog: db.clone(), exclusions: db, index: Arc::new(qdrant) }
	}
}

impl ProfileStore for Db {
	fn load_profile<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<TasteProfile>>> {
		Box::pin(async move { Ok(queries::load_profile(self, user_id).await?) })
	}

	fn load_signals<'a>(
		&'a self,
		user_id: &'a str,
		since: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<TaggedSignal>>> {
		Box::pin(async move { Ok(queries::load_signals(self, user_id, since).await?) })
	}

	fn append_signal<'a>(&'a self, signal: &'a InteractionSignal) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::insert_signal(self, signal).await?) })
	}
}

impl CatalogStore for Db {
	fn load_recipes<'a>(
		&'a self,
		recipe_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<CandidateItem>>> {
		Box::pin(async move { Ok(queries::load_recipes(self, recipe_ids).await?) })
	}
}

impl ExclusionStore for Db {
	fn load_exclusions<'a>(
		&'a self,
		user_id: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<ExclusionRecord>>> {
		Box::pin(async move { Ok(queries::load_exclusions(self, user_id, now).await?) })
	}

	fn insert_permanent<'a>(
		&'a self,
		user_id: &'a str,
		recipe_id: Uuid,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::insert_permanent(self, user_id, recipe_id).await?) })
	}

	fn insert_cooldowns<'a>(&'a self, records: &'a [ExclusionRecord]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(queries::insert_cooldowns(self, records).await?) })
	}

	fn purge_expired<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(queries::purge_expired_cooldowns(self, now).await?) })
	}
}

impl VectorIndex for QdrantStore {
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		k: u64,
		exclude: &'a [Uuid],
	) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			let hits = self.search_nearest(vector, k, exclude).await?;

			Ok(hits.into_iter().map(|(recipe_id, score)| IndexHit { recipe_id, score }).collect())
		})
	}
}
