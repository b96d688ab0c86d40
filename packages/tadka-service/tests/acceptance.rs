mod acceptance {
	mod constraint_safety;
	mod no_repeat;
	mod pool_size;
	mod refinement;

	use std::sync::Arc;

	use time::{Duration, OffsetDateTime, macros::datetime};
	use uuid::Uuid;

	use tadka_config::Config;
	use tadka_domain::model::{CandidateItem, TagValue, Tags, TasteProfile};
	use tadka_service::{RecommendRequest, RecommendService};
	use tadka_testkit::fakes::{self, MemoryIndex, MemoryStore, ScriptedRefiner, StubEmbedding};

	pub const DIM: u32 = 4;
	pub const NOW: OffsetDateTime = datetime!(2026-08-14 19:30 UTC);

	pub struct Harness {
		pub service: RecommendService,
		pub store: Arc<MemoryStore>,
		pub index: Arc<MemoryIndex>,
		pub embedding: Arc<StubEmbedding>,
		pub refiner: Arc<ScriptedRefiner>,
	}
	impl Harness {
		/// Stores `item` and indexes it so that its cosine similarity to [`user_vector`] is
		/// `similarity`.
		pub fn add_recipe(&self, item: CandidateItem, similarity: f32) {
			self.index.insert(item.recipe_id, vector_with_similarity(similarity));
			self.store.insert_recipe(item);
		}

		pub async fn recommend(
			&self,
			user_id: &str,
			limit: u32,
		) -> tadka_service::Result<tadka_domain::model::RecommendationBatch> {
			let req = RecommendRequest { limit: Some(limit), ..RecommendRequest::for_user(user_id) };

			self.service.generate_recommendations_at(req, NOW).await
		}
	}

	pub fn harness(refiner: ScriptedRefiner) -> Harness {
		harness_with(refiner, |_| {})
	}

	pub fn harness_with(refiner: ScriptedRefiner, tweak: impl FnOnce(&mut Config)) -> Harness {
		let mut cfg =
			tadka_testkit::config::test_config("postgres://unused", DIM).expect("Failed to build config.");

		cfg.ranking.scoring_threads = 2;

		tweak(&mut cfg);

		let store = Arc::new(MemoryStore::new());
		let index = Arc::new(MemoryIndex::new());
		let embedding = Arc::new(StubEmbedding::new(user_vector()));
		let refiner = Arc::new(refiner);
		let service = RecommendService::with_providers(
			cfg,
			fakes::memory_stores(store.clone(), index.clone()),
			fakes::providers(embedding.clone(), refiner.clone()),
		)
		.expect("Failed to build service.");

		Harness { service, store, index, embedding, refiner }
	}

	pub fn user_vector() -> Vec<f32> {
		vec![1.0, 0.0, 0.0, 0.0]
	}

	pub fn vector_with_similarity(similarity: f32) -> Vec<f32> {
		vec![similarity, (1.0 - similarity * similarity).max(0.0).sqrt(), 0.0, 0.0]
	}

	pub fn profile(user_id: &str, diet_type: &str) -> TasteProfile {
		TasteProfile {
			user_id: user_id.to_string(),
			onboarding_completed: true,
			diet_type: Some(diet_type.to_string()),
			regions: vec!["north_indian".to_string()],
			taste_vector: Some(user_vector()),
			..TasteProfile::default()
		}
	}

	pub fn recipe(id: u128, title: &str, pairs: &[(&str, &str)]) -> CandidateItem {
		let tags: Tags = pairs
			.iter()
			.map(|(dimension, value)| (dimension.to_string(), TagValue::Scalar(value.to_string())))
			.collect();

		CandidateItem {
			recipe_id: Uuid::from_u128(id),
			title: title.to_string(),
			description: None,
			tags,
			total_time_minutes: Some(30),
			created_at: Some(NOW - Duration::days(10)),
		}
	}

	/// Ten distinct vegetarian dishes with similarities from 0.90 down to 0.45.
	pub fn add_veg_catalog(harness: &Harness) {
		let titles = [
			"Aloo Gobi",
			"Rajma Chawal",
			"Bhindi Fry",
			"Chana Masala",
			"Lauki Kofta",
			"Baingan Bharta",
			"Kadhi Pakora",
			"Vegetable Pulao",
			"Methi Thepla",
			"Lemon Rice",
		];

		for (offset, title) in titles.iter().enumerate() {
			harness.add_recipe(
				recipe(100 + offset as u128, title, &[("diet_type", "pure_veg")]),
				0.90 - offset as f32 * 0.05,
			);
		}
	}

	pub fn ids(batch: &tadka_domain::model::RecommendationBatch) -> Vec<Uuid> {
		batch.candidates.iter().map(|candidate| candidate.item.recipe_id).collect()
	}
}
