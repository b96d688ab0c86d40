pub const DENSE_VECTOR_NAME: &str = "dense";

use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, Distance, Filter, PointId, PointStruct, Query,
		QueryPointsBuilder, UpsertPointsBuilder, Vector, VectorParamsBuilder, VectorsConfigBuilder,
		point_id::PointIdOptions,
	},
};
use uuid::Uuid;

use crate::{Error, Result};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &tadka_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the recipe collection with a single cosine dense vector when it does not exist.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
		);

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(vectors_config),
			)
			.await?;

		Ok(())
	}

	pub async fn upsert_recipe_vector(&self, recipe_id: Uuid, vector: Vec<f32>) -> Result<()> {
		self.check_dim(&vector)?;

		let mut payload = Payload::new();

		payload.insert("recipe_id", recipe_id.to_string());

		let vectors = HashMap::from([(DENSE_VECTOR_NAME.to_string(), Vector::from(vector))]);
		let point = PointStruct::new(recipe_id.to_string(), vectors, payload);

		self.client
			.upsert_points(
				UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true),
			)
			.await?;

		Ok(())
	}

	/// Nearest recipes to `vector`, best first. Ids in `exclude` are filtered inside the index.
	pub async fn search_nearest(
		&self,
		vector: &[f32],
		limit: u64,
		exclude: &[Uuid],
	) -> Result<Vec<(Uuid, f32)>> {
		self.check_dim(vector)?;

		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.using(DENSE_VECTOR_NAME)
			.limit(limit)
			.with_payload(false);

		if !exclude.is_empty() {
			let ids: Vec<PointId> = exclude.iter().map(|id| PointId::from(id.to_string())).collect();

			search = search.filter(Filter::must_not([Condition::has_id(ids)]));
		}

		let response = self.client.query(search).await?;

		Ok(response
			.result
			.into_iter()
			.filter_map(|point| point.id.as_ref().and_then(point_id_to_uuid).map(|id| (id, point.score)))
			.collect())
	}

	fn check_dim(&self, vector: &[f32]) -> Result<()> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Vector has {} dimensions; collection {:?} expects {}.",
				vector.len(),
				self.collection,
				self.vector_dim
			)));
		}

		Ok(())
	}
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}
