use serde::{Deserialize, Serialize};

use crate::{DocumentView, Error, LoreService, Result};
use lore_domain::ContextScope;
use lore_storage::{cache, documents};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoveContextRequest {
	#[serde(flatten)]
	pub scope: ContextScope,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoveContextResponse {
	pub document: DocumentView,
}

impl LoreService {
	/// Removes a scope's document, its indexed vectors, and its cached content.
	///
	/// Vectors are deleted before the row so a Qdrant failure leaves the row in
	/// place and the removal retryable.
	pub async fn remove_context(&self, req: RemoveContextRequest) -> Result<RemoveContextResponse> {
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

		self.delete_context_chunks(doc.context_id).await?;

		let mut tx = self.db.pool.begin().await?;
		let removed = documents::delete_by_scope(&mut *tx, &req.scope).await?;

		cache::delete_cached_content(&mut *tx, &req.scope.cache_key()).await?;
		tx.commit().await?;

		let document = removed.unwrap_or(doc);

		tracing::info!(
			context_id = %document.context_id,
			scope = %document.scope,
			"Removed context document."
		);

		Ok(RemoveContextResponse { document: DocumentView::from(document) })
	}
}
