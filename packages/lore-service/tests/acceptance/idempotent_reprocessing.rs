use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use lore_domain::ContextScope;
use lore_service::{ProcessOutcome, ProcessScopeRequest, Providers, SetContextRequest};

use super::{SpyEmbedding, StubFetcher};

const DOC: &str = "\
# Guild rules

Be kind to each other and keep support questions in the help channel.
Moderators rotate weekly; escalations go to whoever holds the on-call badge.";

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn unchanged_content_skips_reembedding() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping unchanged_content_skips_reembedding; set LORE_PG_DSN to run this test.");

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping unchanged_content_skips_reembedding; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let calls = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(SpyEmbedding { vector_dim: 4, calls: calls.clone() }),
		Arc::new(StubFetcher { content: DOC.to_string() }),
	);
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await;
	let scope = ContextScope::Guild { guild_id: "g-idem".to_string() };
	let set = service
		.set_context(SetContextRequest {
			scope: scope.clone(),
			source_url: "https://raw.githubusercontent.com/acme/notes/main/rules.md".to_string(),
			name: Some("Guild rules".to_string()),
			added_by: "mod-7".to_string(),
		})
		.await
		.expect("set_context failed.");

	assert_eq!(set.outcome, Some(ProcessOutcome::Processed));
	assert_eq!(set.document.processing_status, "completed");
	assert!(set.document.content_hash.is_some());
	assert!(set.document.chunk_count > 0);
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	let again = service
		.process_scope(ProcessScopeRequest { scope })
		.await
		.expect("process_scope failed.");

	assert_eq!(again.outcome, ProcessOutcome::Unchanged);
	assert_eq!(again.document.processing_status, "completed");
	assert_eq!(again.document.content_hash, set.document.content_hash);
	assert_eq!(calls.load(Ordering::SeqCst), 1, "unchanged content must not re-embed");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
