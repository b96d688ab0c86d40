use std::sync::Arc;

use tadka_service::{RecommendService, Stores};
use tadka_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RecommendService>,
}
impl AppState {
	/// Connects Postgres and Qdrant, bootstrapping the schema and the collection when missing.
	pub async fn new(config: tadka_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.storage.qdrant.vector_dim).await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		let service = RecommendService::new(config, Stores::postgres(db, qdrant))?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: RecommendService) -> Self {
		Self { service: Arc::new(service) }
	}
}
