use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{DocumentView, Error, LoreService, Result};
use lore_chunking::ChunkingConfig;
use lore_domain::{ContextScope, digest::content_digest, validate};
use lore_providers::embedding;
use lore_storage::{cache, documents, qdrant::ChunkPoint};

/// Processing errors are persisted on the document row; anything longer is cut
/// so a runaway provider message cannot bloat the table.
const MAX_ERROR_CHARS: usize = 1_024;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOutcome {
	Processed,
	Unchanged,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProcessReport {
	pub processed: u32,
	pub unchanged: u32,
	pub failed: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessScopeRequest {
	#[serde(flatten)]
	pub scope: ContextScope,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessScopeResponse {
	pub outcome: ProcessOutcome,
	pub document: DocumentView,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshContextRequest {
	#[serde(flatten)]
	pub scope: ContextScope,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshContextResponse {
	pub outcome: ProcessOutcome,
	pub document: DocumentView,
}

impl LoreService {
	/// Runs the fetch, validate, chunk, embed, index pipeline for one document.
	///
	/// When the document is already processed and the fetched text hashes to the
	/// stored digest, the pipeline stops after the fetch and reports
	/// [`ProcessOutcome::Unchanged`]. Every failure is written to
	/// `processing_error` before the error is returned.
	pub async fn process_context(&self, context_id: Uuid) -> Result<ProcessOutcome> {
		let now = OffsetDateTime::now_utc();
		let doc = documents::get_document(&self.db.pool, context_id).await?.ok_or_else(|| {
			Error::NotFound { message: "No context document with this id.".to_string() }
		})?;
		let scope = crate::document_scope(&doc)?;
		let text = match self.providers.fetcher.fetch(&self.cfg.fetch, &doc.source_url).await {
			Ok(text) => text,
			Err(err) => {
				let error = Error::fetch(err);

				self.record_failure(context_id, &error).await;

				return Err(error);
			},
		};

		if let Err(reject) = validate::validate_content(&text, &self.cfg.fetch) {
			let error = Error::ContentRejected { message: reject.to_string() };

			self.record_failure(context_id, &error).await;

			return Err(error);
		}

		let digest = content_digest(&text);
		let stats = validate::content_stats(&text);

		// The digest alone is not enough: a failed pass can leave the old digest
		// on a row whose vectors are already gone.
		if doc.is_processed() && doc.content_hash.as_deref() == Some(digest.as_str()) {
			documents::mark_processed(
				&self.db.pool,
				context_id,
				&digest,
				doc.chunk_count,
				stats.character_count as i64,
				stats.word_count as i64,
				now,
			)
			.await?;

			tracing::info!(
				context_id = %context_id,
				"Source content unchanged; skipped re-embedding."
			);

			return Ok(ProcessOutcome::Unchanged);
		}

		let chunk_cfg = ChunkingConfig {
			max_tokens: self.cfg.chunking.max_tokens,
			overlap_tokens: self.cfg.chunking.overlap_tokens,
		};
		let chunks = lore_chunking::split_markdown(&text, &chunk_cfg, &self.token_counter);
		let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
		let vectors =
			match self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await {
				Ok(vectors) => vectors,
				Err(err) => {
					let error = Error::embedding(err);

					self.record_failure(context_id, &error).await;

					return Err(error);
				},
			};

		if vectors.len() != chunks.len() {
			let error = Error::Embedding {
				message: format!(
					"Provider returned {} vectors for {} chunks.",
					vectors.len(),
					chunks.len()
				),
			};

			self.record_failure(context_id, &error).await;

			return Err(error);
		}
		if let Err(error) = crate::ensure_vector_dims(&vectors, self.cfg.storage.qdrant.vector_dim)
		{
			self.record_failure(context_id, &error).await;

			return Err(error);
		}

		// Old vectors go first: the chunk count can shrink, and deterministic point
		// ids only overwrite indexes that still exist.
		if let Err(err) = self.qdrant.delete_by_context(context_id).await {
			let error = Error::from(err);

			self.record_failure(context_id, &error).await;

			return Err(error);
		}

		let points = chunks
			.iter()
			.zip(vectors)
			.map(|(chunk, vector)| ChunkPoint {
				point_id: chunk_point_id(context_id, chunk.chunk_index),
				context_id,
				scope: scope.as_str().to_string(),
				guild_id: scope.target_guild_id().map(str::to_string),
				user_id: scope.target_user_id().map(str::to_string),
				chunk_index: chunk.chunk_index,
				content: chunk.text.clone(),
				token_count: chunk.token_count,
				character_count: chunk.character_count,
				source_url: doc.source_url.clone(),
				created_at: now,
				vector,
			})
			.collect::<Vec<_>>();

		if let Err(err) = self.qdrant.upsert_chunks(&points).await {
			let error = Error::from(err);

			self.record_failure(context_id, &error).await;

			return Err(error);
		}

		// The digest lands only after the index write, so a crash between the two
		// re-embeds on the next pass instead of trusting a half-written index.
		let mut tx = self.db.pool.begin().await?;

		documents::mark_processed(
			&mut *tx,
			context_id,
			&digest,
			points.len() as i32,
			stats.character_count as i64,
			stats.word_count as i64,
			now,
		)
		.await?;
		cache::delete_cached_content(&mut *tx, &scope.cache_key()).await?;
		tx.commit().await?;

		let token_total: u64 = chunks.iter().map(|chunk| u64::from(chunk.token_count)).sum();

		tracing::info!(
			context_id = %context_id,
			chunks = points.len(),
			tokens = token_total,
			cost_usd = embedding::estimate_cost(&self.cfg.providers.embedding, token_total),
			"Indexed context document."
		);

		Ok(ProcessOutcome::Processed)
	}

	pub async fn process_scope(&self, req: ProcessScopeRequest) -> Result<ProcessScopeResponse> {
		if !req.scope.has_valid_target() {
			return Err(Error::InvalidRequest {
				message: "Scope target id must not be blank.".to_string(),
			});
		}

		let doc = documents::find_by_scope(&self.db.pool, &req.scope).await?.ok_or_else(|| {
			Error::NotFound {
				message: "No context document is registered for this scope.".to_string(),
			}
		})?;
		let outcome = self.process_context(doc.context_id).await?;
		let document = self.reload_document(doc.context_id).await?;

		Ok(ProcessScopeResponse { outcome, document })
	}

	/// Forces a full re-fetch and re-embed by dropping the stored digest before
	/// processing, bypassing the unchanged-content short circuit.
	pub async fn refresh_context(
		&self,
		req: RefreshContextRequest,
	) -> Result<RefreshContextResponse> {
		let now = OffsetDateTime::now_utc();

		if !req.scope.has_valid_target() {
			return Err(Error::InvalidRequest {
				message: "Scope target id must not be blank.".to_string(),
			});
		}

		let doc = documents::find_by_scope(&self.db.pool, &req.scope).await?.ok_or_else(|| {
			Error::NotFound {
				message: "No context document is registered for this scope.".to_string(),
			}
		})?;

		documents::clear_content_hash(&self.db.pool, doc.context_id, now).await?;

		let outcome = self.process_context(doc.context_id).await?;
		let document = self.reload_document(doc.context_id).await?;

		Ok(RefreshContextResponse { outcome, document })
	}

	/// Drops every indexed vector for a document and zeroes its chunk
	/// bookkeeping, so a row that stays behind reads as never processed. Runs
	/// as part of document removal.
	pub async fn delete_context_chunks(&self, context_id: Uuid) -> Result<()> {
		let now = OffsetDateTime::now_utc();

		self.qdrant.delete_by_context(context_id).await?;
		documents::reset_chunk_state(&self.db.pool, context_id, now).await?;

		tracing::info!(context_id = %context_id, "Deleted indexed chunks for document.");

		Ok(())
	}

	/// Sweeps every document whose last processing pass did not complete.
	/// Failures are isolated per document; the sweep continues and counts them.
	pub async fn process_all_unprocessed(&self) -> Result<ProcessReport> {
		let docs = documents::list_unprocessed(&self.db.pool).await?;
		let mut report = ProcessReport::default();

		for (index, doc) in docs.iter().enumerate() {
			if index > 0 && self.cfg.worker.inter_document_delay_ms > 0 {
				tokio::time::sleep(Duration::from_millis(self.cfg.worker.inter_document_delay_ms))
					.await;
			}

			match self.process_context(doc.context_id).await {
				Ok(ProcessOutcome::Processed) => report.processed += 1,
				Ok(ProcessOutcome::Unchanged) => report.unchanged += 1,
				Err(err) => {
					report.failed += 1;

					tracing::warn!(
						context_id = %doc.context_id,
						error = %err,
						"Processing sweep failed for document."
					);
				},
			}
		}

		Ok(report)
	}

	async fn reload_document(&self, context_id: Uuid) -> Result<DocumentView> {
		let doc = documents::get_document(&self.db.pool, context_id).await?.ok_or_else(|| {
			Error::NotFound { message: "Context document vanished during processing.".to_string() }
		})?;

		Ok(DocumentView::from(doc))
	}

	/// Best effort: losing the failure record must not mask the original error.
	async fn record_failure(&self, context_id: Uuid, error: &Error) {
		let now = OffsetDateTime::now_utc();
		let message = truncate_error(&error.to_string());

		if let Err(record_err) =
			documents::mark_processing_failed(&self.db.pool, context_id, &message, now).await
		{
			tracing::warn!(
				context_id = %context_id,
				error = %record_err,
				"Failed to record processing failure."
			);
		}
	}
}

/// Deterministic per-chunk point id, so reprocessing overwrites points instead
/// of accumulating duplicates.
pub(crate) fn chunk_point_id(context_id: Uuid, chunk_index: i32) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{context_id}:{chunk_index}").as_bytes())
}

fn truncate_error(message: &str) -> String {
	message.chars().take(MAX_ERROR_CHARS).collect()
}
