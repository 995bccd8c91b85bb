use serde::{Deserialize, Serialize};

use crate::{LoreService, Result};
use lore_storage::documents;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScopeStatsView {
	pub scope: String,
	pub document_count: i64,
	pub chunk_count: i64,
	pub usage_count: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsResponse {
	pub scopes: Vec<ScopeStatsView>,
	pub total_documents: i64,
	pub total_chunks: i64,
	pub total_usage: i64,
	/// Approximate point total reported by the index, for cross-checking
	/// against `total_chunks`.
	pub indexed_points: u64,
}

impl LoreService {
	pub async fn stats(&self) -> Result<StatsResponse> {
		let rows = documents::scope_stats(&self.db.pool).await?;
		let indexed_points = self.qdrant.count_all().await?;
		let mut response = StatsResponse {
			scopes: Vec::with_capacity(rows.len()),
			total_documents: 0,
			total_chunks: 0,
			total_usage: 0,
			indexed_points,
		};

		for row in rows {
			response.total_documents += row.document_count;
			response.total_chunks += row.chunk_count;
			response.total_usage += row.usage_count;

			response.scopes.push(ScopeStatsView {
				scope: row.scope,
				document_count: row.document_count,
				chunk_count: row.chunk_count,
				usage_count: row.usage_count,
			});
		}

		Ok(response)
	}
}
