use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{DocumentView, Error, LoreService, ProcessOutcome, Result};
use lore_domain::{ContextScope, source::source_url_allowed};
use lore_storage::{cache, documents};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetContextRequest {
	#[serde(flatten)]
	pub scope: ContextScope,
	pub source_url: String,
	#[serde(default)]
	pub name: Option<String>,
	pub added_by: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetContextResponse {
	pub outcome: Option<ProcessOutcome>,
	pub document: DocumentView,
}

impl LoreService {
	/// Registers (or replaces) the grounding document for a scope, then processes it
	/// immediately. A processing failure is recorded on the row and surfaces as
	/// `outcome: None`; the registration itself still succeeds.
	pub async fn set_context(&self, req: SetContextRequest) -> Result<SetContextResponse> {
		let now = OffsetDateTime::now_utc();
		let source_url = req.source_url.trim();
		let name = req.name.as_deref().map(str::trim).filter(|name| !name.is_empty());
		let added_by = req.added_by.trim();

		if !req.scope.has_valid_target() {
			return Err(Error::InvalidRequest {
				message: "Scope target id must not be blank.".to_string(),
			});
		}
		if source_url.is_empty() {
			return Err(Error::InvalidRequest { message: "source_url is required.".to_string() });
		}
		if !source_url_allowed(&self.cfg.fetch.allowed_url_prefixes, source_url) {
			return Err(Error::InvalidRequest {
				message: "source_url is not under an allowed prefix.".to_string(),
			});
		}
		if added_by.is_empty() {
			return Err(Error::InvalidRequest { message: "added_by is required.".to_string() });
		}

		let mut tx = self.db.pool.begin().await?;
		let registered =
			documents::upsert_by_scope(&mut *tx, &req.scope, source_url, name, added_by, now)
				.await?;

		cache::delete_cached_content(&mut *tx, &req.scope.cache_key()).await?;
		tx.commit().await?;

		let outcome = match self.process_context(registered.context_id).await {
			Ok(outcome) => Some(outcome),
			Err(err) => {
				tracing::warn!(
					context_id = %registered.context_id,
					error = %err,
					"Processing failed right after registration."
				);

				None
			},
		};
		let document =
			documents::get_document(&self.db.pool, registered.context_id).await?.ok_or_else(
				|| Error::NotFound {
					message: "Context document vanished during processing.".to_string(),
				},
			)?;

		Ok(SetContextResponse { outcome, document: DocumentView::from(document) })
	}
}
