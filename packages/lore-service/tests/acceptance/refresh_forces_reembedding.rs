use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use lore_domain::ContextScope;
use lore_service::{ProcessOutcome, Providers, RefreshContextRequest, SetContextRequest};

use super::{SpyEmbedding, StubFetcher};

const DOC: &str = "\
# Deployment runbook

Roll new builds out region by region and watch the error budget dashboard.
Freeze deploys during the weekly maintenance window unless on-call approves.";

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn refresh_reembeds_unchanged_content() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping refresh_reembeds_unchanged_content; set LORE_PG_DSN to run this test.");

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping refresh_reembeds_unchanged_content; set LORE_QDRANT_URL to run this test."
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
	let scope = ContextScope::User { user_id: "u-refresh".to_string() };
	let set = service
		.set_context(SetContextRequest {
			scope: scope.clone(),
			source_url: "https://raw.githubusercontent.com/acme/notes/main/runbook.md".to_string(),
			name: None,
			added_by: "u-refresh".to_string(),
		})
		.await
		.expect("set_context failed.");

	assert_eq!(set.outcome, Some(ProcessOutcome::Processed));
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	let refreshed = service
		.refresh_context(RefreshContextRequest { scope })
		.await
		.expect("refresh_context failed.");

	assert_eq!(refreshed.outcome, ProcessOutcome::Processed, "refresh must bypass the digest");
	assert_eq!(refreshed.document.processing_status, "completed");
	assert_eq!(refreshed.document.content_hash, set.document.content_hash);
	assert_eq!(calls.load(Ordering::SeqCst), 2, "refresh must re-embed");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
