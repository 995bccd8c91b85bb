use time::OffsetDateTime;
use uuid::Uuid;

/// A registered grounding document. `content_hash` is the blake3 digest of the
/// last successfully processed fetch; `None` means the document has never
/// completed processing.
#[derive(Debug, sqlx::FromRow)]
pub struct ContextDocument {
	pub context_id: Uuid,
	pub scope: String,
	pub guild_id: Option<String>,
	pub user_id: Option<String>,
	pub source_url: String,
	pub name: Option<String>,
	pub added_by: String,
	pub content_hash: Option<String>,
	pub character_count: i64,
	pub word_count: i64,
	pub chunk_count: i32,
	pub processing_status: String,
	pub processing_error: Option<String>,
	pub usage_count: i64,
	pub last_used_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

impl ContextDocument {
	/// True once a processing pass has completed and the indexed vectors match
	/// `content_hash`.
	pub fn is_processed(&self) -> bool {
		self.processing_status == "completed"
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct CachedContent {
	pub cache_key: String,
	pub content: String,
	pub character_count: i64,
	pub word_count: i64,
	pub source_url: String,
	pub fetched_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ScopeStats {
	pub scope: String,
	pub document_count: i64,
	pub chunk_count: i64,
	pub usage_count: i64,
}
