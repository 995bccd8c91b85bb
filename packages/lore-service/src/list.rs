use serde::{Deserialize, Serialize};

use crate::{DocumentView, Error, LoreService, Result};
use lore_domain::ContextScope;
use lore_storage::documents;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetContextRequest {
	#[serde(flatten)]
	pub scope: ContextScope,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetContextResponse {
	pub document: DocumentView,
	/// Exact point count in the index. Diverging from `chunk_count` means the
	/// row and the index have drifted apart.
	pub indexed_chunks: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListContextsResponse {
	pub documents: Vec<DocumentView>,
}

impl LoreService {
	pub async fn get_context(&self, req: GetContextRequest) -> Result<GetContextResponse> {
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
		let indexed_chunks = self.qdrant.count_for_context(doc.context_id).await?;

		Ok(GetContextResponse { document: DocumentView::from(doc), indexed_chunks })
	}

	pub async fn list_contexts(&self) -> Result<ListContextsResponse> {
		let docs = documents::list_documents(&self.db.pool).await?;

		Ok(ListContextsResponse { documents: docs.into_iter().map(DocumentView::from).collect() })
	}
}
