use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
		Filter, PointStruct, Query, QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, Value,
		VectorParamsBuilder,
	},
};
use serde_json::Value as JsonValue;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::Result;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}

/// One embedded chunk ready for indexing. The payload mirrors the owning
/// document's scope columns so retrieval can filter entirely inside Qdrant,
/// and carries enough provenance to trace a hit back to its source.
#[derive(Debug)]
pub struct ChunkPoint {
	pub point_id: Uuid,
	pub context_id: Uuid,
	pub scope: String,
	pub guild_id: Option<String>,
	pub user_id: Option<String>,
	pub chunk_index: i32,
	pub content: String,
	pub token_count: u32,
	pub character_count: u32,
	pub source_url: String,
	pub created_at: OffsetDateTime,
	pub vector: Vec<f32>,
}

impl QdrantStore {
	pub fn new(cfg: &lore_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
				),
			)
			.await?;

		Ok(())
	}

	pub async fn upsert_chunks(&self, points: &[ChunkPoint]) -> Result<()> {
		if points.is_empty() {
			return Ok(());
		}

		let mut qdrant_points = Vec::with_capacity(points.len());

		for point in points {
			let mut payload_map = HashMap::new();

			payload_map.insert("context_id".to_string(), Value::from(point.context_id.to_string()));
			payload_map.insert("scope".to_string(), Value::from(point.scope.clone()));
			payload_map.insert(
				"guild_id".to_string(),
				point
					.guild_id
					.as_ref()
					.map(|id| Value::from(id.clone()))
					.unwrap_or_else(|| Value::from(JsonValue::Null)),
			);
			payload_map.insert(
				"user_id".to_string(),
				point
					.user_id
					.as_ref()
					.map(|id| Value::from(id.clone()))
					.unwrap_or_else(|| Value::from(JsonValue::Null)),
			);
			payload_map.insert("chunk_index".to_string(), Value::from(point.chunk_index as i64));
			payload_map.insert("content".to_string(), Value::from(point.content.clone()));
			payload_map.insert("token_count".to_string(), Value::from(point.token_count as i64));
			payload_map.insert(
				"character_count".to_string(),
				Value::from(point.character_count as i64),
			);
			payload_map.insert("source_url".to_string(), Value::from(point.source_url.clone()));
			payload_map.insert(
				"created_at".to_string(),
				Value::from(JsonValue::String(format_timestamp(point.created_at)?)),
			);

			let payload = Payload::from(payload_map);

			qdrant_points.push(PointStruct::new(
				point.point_id.to_string(),
				point.vector.clone(),
				payload,
			));
		}

		let upsert = UpsertPointsBuilder::new(self.collection.clone(), qdrant_points).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	pub async fn search_chunks(
		&self,
		vector: Vec<f32>,
		filter: Filter,
		limit: u64,
		score_threshold: f32,
	) -> Result<Vec<ScoredPoint>> {
		let query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.filter(filter)
			.limit(limit)
			.score_threshold(score_threshold)
			.with_payload(true);
		let response = self.client.query(query).await?;

		Ok(response.result)
	}

	/// Deletes every indexed chunk belonging to `context_id`. A filter that
	/// matches zero points is a no-op on the Qdrant side.
	pub async fn delete_by_context(&self, context_id: Uuid) -> Result<()> {
		let filter = Filter::must([Condition::matches("context_id", context_id.to_string())]);
		let delete = DeletePointsBuilder::new(self.collection.clone()).points(filter).wait(true);

		self.client.delete_points(delete).await?;

		Ok(())
	}

	/// Approximate point total straight from the collection metadata. Cheap
	/// enough for a stats surface; not guaranteed exact while writes are in
	/// flight.
	pub async fn count_all(&self) -> Result<u64> {
		let info = self.client.collection_info(&self.collection).await?;

		Ok(info.result.and_then(|collection| collection.points_count).unwrap_or_default())
	}

	/// Exact number of indexed chunks for one document.
	pub async fn count_for_context(&self, context_id: Uuid) -> Result<u64> {
		let filter = Filter::must([Condition::matches("context_id", context_id.to_string())]);
		let count = CountPointsBuilder::new(self.collection.clone()).filter(filter).exact(true);
		let response = self.client.count(count).await?;

		Ok(response.result.map(|result| result.count).unwrap_or_default())
	}
}

fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
	Ok(ts.format(&Rfc3339)?)
}
