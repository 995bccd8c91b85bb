use std::sync::Arc;

use lore_domain::ContextScope;
use lore_service::{Error, ProcessScopeRequest, Providers, SetContextRequest};

use super::{StubEmbedding, StubFetcher};

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn rejected_content_is_recorded_on_the_row() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping rejected_content_is_recorded_on_the_row; set LORE_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping rejected_content_is_recorded_on_the_row; set LORE_QDRANT_URL to run this \
			 test."
		);

		return;
	};
	let providers = Providers::new(
		Arc::new(StubEmbedding { vector_dim: 4 }),
		Arc::new(StubFetcher { content: "tiny".to_string() }),
	);
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await;
	let scope = ContextScope::Guild { guild_id: "g-reject".to_string() };
	let set = service
		.set_context(SetContextRequest {
			scope: scope.clone(),
			source_url: "https://raw.githubusercontent.com/acme/notes/main/stub.md".to_string(),
			name: None,
			added_by: "mod-1".to_string(),
		})
		.await
		.expect("set_context failed.");

	assert_eq!(set.outcome, None);
	assert_eq!(set.document.processing_status, "failed");

	let error = set.document.processing_error.expect("Expected a recorded processing error.");

	assert!(error.contains("tokens"), "unexpected error text: {error}");

	let rejected = service
		.process_scope(ProcessScopeRequest { scope })
		.await
		.expect_err("Expected reprocessing to reject the content again.");

	assert!(matches!(rejected, Error::ContentRejected { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn oversized_content_is_rejected_before_chunking() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping oversized_content_is_rejected_before_chunking; set LORE_PG_DSN to run this \
			 test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping oversized_content_is_rejected_before_chunking; set LORE_QDRANT_URL to run \
			 this test."
		);

		return;
	};
	let providers = Providers::new(
		Arc::new(StubEmbedding { vector_dim: 4 }),
		Arc::new(StubFetcher { content: "filler words ".repeat(64) }),
	);
	let collection = test_db.collection_name("lore_acceptance");
	let mut cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);

	cfg.fetch.max_document_bytes = 256;

	let service = super::build_service(cfg, providers).await;
	let set = service
		.set_context(SetContextRequest {
			scope: ContextScope::Global,
			source_url: "https://raw.githubusercontent.com/acme/notes/main/big.md".to_string(),
			name: None,
			added_by: "mod-1".to_string(),
		})
		.await
		.expect("set_context failed.");

	assert_eq!(set.outcome, None);
	assert_eq!(set.document.processing_status, "failed");

	let error = set.document.processing_error.expect("Expected a recorded processing error.");

	assert!(error.contains("bytes"), "unexpected error text: {error}");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
