pub mod admin;
pub mod list;
pub mod process;
pub mod remove;
pub mod resolve;
pub mod set;
pub mod time_serde;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub use admin::{ScopeStatsView, StatsResponse};
pub use error::{Error, Result};
use lore_chunking::TokenCounter;
use lore_config::{Config, EmbeddingProviderConfig, Fetch};
use lore_domain::ContextScope;
use lore_providers::{embedding, fetcher};
use lore_storage::{db::Db, models::ContextDocument, qdrant::QdrantStore};
pub use list::{GetContextRequest, GetContextResponse, ListContextsResponse};
pub use process::{
	ProcessOutcome, ProcessReport, ProcessScopeRequest, ProcessScopeResponse,
	RefreshContextRequest, RefreshContextResponse,
};
pub use remove::{RemoveContextRequest, RemoveContextResponse};
pub use resolve::{
	ResolveContextRequest, ResolveContextResponse, ResolveRelevantContextRequest,
};
pub use set::{SetContextRequest, SetContextResponse};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Seam for the embedding backend so tests can run without a live provider.
/// The default implementation batches through `lore_providers::embedding`.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, lore_providers::Result<Vec<Vec<f32>>>>;
}

/// Seam for raw-document retrieval, mirroring [`EmbeddingProvider`].
pub trait DocumentFetcher
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		cfg: &'a Fetch,
		url: &'a str,
	) -> BoxFuture<'a, lore_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub fetcher: Arc<dyn DocumentFetcher>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, lore_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed_batched(cfg, texts))
	}
}

impl DocumentFetcher for DefaultProviders {
	fn fetch<'a>(
		&'a self,
		cfg: &'a Fetch,
		url: &'a str,
	) -> BoxFuture<'a, lore_providers::Result<String>> {
		Box::pin(fetcher::fetch(cfg, url))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, fetcher: Arc<dyn DocumentFetcher>) -> Self {
		Self { embedding, fetcher }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), fetcher: provider }
	}
}

pub struct LoreService {
	pub cfg: Config,
	pub db: Db,
	pub qdrant: QdrantStore,
	pub providers: Providers,
	pub token_counter: TokenCounter,
}

impl LoreService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore, token_counter: TokenCounter) -> Self {
		Self { cfg, db, qdrant, providers: Providers::default(), token_counter }
	}

	pub fn with_providers(
		cfg: Config,
		db: Db,
		qdrant: QdrantStore,
		token_counter: TokenCounter,
		providers: Providers,
	) -> Self {
		Self { cfg, db, qdrant, providers, token_counter }
	}
}

/// Builds the token counter the chunker runs on: the configured Hugging Face
/// tokenizer when one is set, otherwise the character-based estimate. A repo
/// that fails to load degrades to the estimate instead of blocking startup.
pub fn build_token_counter(cfg: &lore_config::Chunking) -> TokenCounter {
	match cfg.tokenizer_repo.as_deref() {
		Some(repo) => match lore_chunking::load_tokenizer(repo) {
			Ok(tokenizer) => TokenCounter::Tokenizer(tokenizer),
			Err(err) => {
				tracing::warn!(
					error = %err,
					repo,
					"Failed to load tokenizer; falling back to the character estimate."
				);

				TokenCounter::Heuristic
			},
		},
		None => TokenCounter::Heuristic,
	}
}

/// Wire shape of a context document shared by the set, remove, get, and list
/// responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentView {
	pub context_id: Uuid,
	pub scope: String,
	pub guild_id: Option<String>,
	pub user_id: Option<String>,
	pub source_url: String,
	pub name: Option<String>,
	pub added_by: String,
	pub content_hash: Option<String>,
	pub processing_status: String,
	pub processing_error: Option<String>,
	pub character_count: i64,
	pub word_count: i64,
	pub chunk_count: i32,
	pub usage_count: i64,
	#[serde(with = "time_serde::option")]
	pub last_used_at: Option<OffsetDateTime>,
	#[serde(with = "time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
}

impl From<ContextDocument> for DocumentView {
	fn from(doc: ContextDocument) -> Self {
		Self {
			context_id: doc.context_id,
			scope: doc.scope,
			guild_id: doc.guild_id,
			user_id: doc.user_id,
			source_url: doc.source_url,
			name: doc.name,
			added_by: doc.added_by,
			content_hash: doc.content_hash,
			processing_status: doc.processing_status,
			processing_error: doc.processing_error,
			character_count: doc.character_count,
			word_count: doc.word_count,
			chunk_count: doc.chunk_count,
			usage_count: doc.usage_count,
			last_used_at: doc.last_used_at,
			created_at: doc.created_at,
			updated_at: doc.updated_at,
		}
	}
}

pub(crate) fn document_scope(doc: &ContextDocument) -> Result<ContextScope> {
	ContextScope::from_columns(&doc.scope, doc.guild_id.clone(), doc.user_id.clone()).ok_or_else(
		|| Error::Storage {
			message: format!("Document {} has an inconsistent scope row.", doc.context_id),
		},
	)
}

pub(crate) fn ensure_vector_dims(vectors: &[Vec<f32>], expected: u32) -> Result<()> {
	for vector in vectors {
		if vector.len() != expected as usize {
			return Err(Error::Embedding {
				message: format!(
					"Provider returned a vector of dimension {}; the collection expects {expected}.",
					vector.len()
				),
			});
		}
	}

	Ok(())
}
