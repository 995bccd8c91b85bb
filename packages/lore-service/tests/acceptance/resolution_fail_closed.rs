use std::sync::Arc;

use lore_domain::ContextScope;
use lore_service::{
	Providers, ResolveContextRequest, ResolveRelevantContextRequest, SetContextRequest,
};

use super::{FailingFetcher, StubEmbedding};

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn resolution_returns_empty_prompt_instead_of_failing() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping resolution_returns_empty_prompt_instead_of_failing; set LORE_PG_DSN to run \
			 this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping resolution_returns_empty_prompt_instead_of_failing; set LORE_QDRANT_URL to \
			 run this test."
		);

		return;
	};
	let providers =
		Providers::new(Arc::new(StubEmbedding { vector_dim: 4 }), Arc::new(FailingFetcher));
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await;

	// Empty corpus: nothing to ground on, so the prompt stays empty.
	let direct = service
		.resolve_context(ResolveContextRequest { guild_id: None, user_id: None })
		.await;

	assert_eq!(direct.prompt, "");

	let relevant = service
		.resolve_relevant_context(ResolveRelevantContextRequest {
			query: "what are the rules".to_string(),
			guild_id: Some("g-closed".to_string()),
			user_id: None,
		})
		.await;

	assert_eq!(relevant.prompt, "");

	// A blank query is an input error, which also resolves closed.
	let blank = service
		.resolve_relevant_context(ResolveRelevantContextRequest {
			query: "   ".to_string(),
			guild_id: None,
			user_id: None,
		})
		.await;

	assert_eq!(blank.prompt, "");

	// A registered document whose source has gone away must not surface an error
	// mid-conversation either.
	let set = service
		.set_context(SetContextRequest {
			scope: ContextScope::Global,
			source_url: "https://raw.githubusercontent.com/acme/notes/main/gone.md".to_string(),
			name: None,
			added_by: "operator-1".to_string(),
		})
		.await
		.expect("set_context failed.");

	assert_eq!(set.outcome, None, "a dead source cannot be processed");
	assert_eq!(set.document.processing_status, "failed");

	let broken = service
		.resolve_context(ResolveContextRequest { guild_id: None, user_id: None })
		.await;

	assert_eq!(broken.prompt, "");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
