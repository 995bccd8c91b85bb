use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use lore_domain::{ContextScope, prompt::REFUSAL_MESSAGE};
use lore_service::{
	LoreService, ProcessOutcome, Providers, RefreshContextRequest, ResolveContextRequest,
	SetContextRequest,
};

use super::{CountingFetcher, StubEmbedding};

const DOC: &str = "\
# Community facts

The weekly game night starts at 19:00 UTC on Thursdays in the main voice room.
Patch notes are posted by the bot within an hour of each release.";

async fn resolve_global(service: &LoreService) -> String {
	service
		.resolve_context(ResolveContextRequest { guild_id: None, user_id: None })
		.await
		.prompt
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn cached_content_is_reused_until_invalidated() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping cached_content_is_reused_until_invalidated; set LORE_PG_DSN to run this \
			 test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping cached_content_is_reused_until_invalidated; set LORE_QDRANT_URL to run this \
			 test."
		);

		return;
	};
	let fetches = Arc::new(AtomicUsize::new(0));
	let providers = Providers::new(
		Arc::new(StubEmbedding { vector_dim: 4 }),
		Arc::new(CountingFetcher { content: DOC.to_string(), calls: fetches.clone() }),
	);
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await;
	let set = service
		.set_context(SetContextRequest {
			scope: ContextScope::Global,
			source_url: "https://raw.githubusercontent.com/acme/notes/main/facts.md".to_string(),
			name: None,
			added_by: "operator-1".to_string(),
		})
		.await
		.expect("set_context failed.");

	assert_eq!(set.outcome, Some(ProcessOutcome::Processed));
	assert_eq!(fetches.load(Ordering::SeqCst), 1, "processing fetches once");

	let prompt = resolve_global(&service).await;

	assert!(prompt.contains("[Global context]"));
	assert!(prompt.contains("game night"));
	assert!(prompt.contains(REFUSAL_MESSAGE));
	assert_eq!(fetches.load(Ordering::SeqCst), 2, "first resolution misses the cache");

	resolve_global(&service).await;

	assert_eq!(fetches.load(Ordering::SeqCst), 2, "second resolution must hit the cache");

	// Usage bumps are fire-and-forget; poll until the counter lands.
	let mut usage = 0_i64;

	for _ in 0..40 {
		usage = sqlx::query_scalar::<_, i64>(
			"SELECT usage_count FROM context_documents WHERE scope = 'global'",
		)
		.fetch_one(&service.db.pool)
		.await
		.expect("usage query failed.");

		if usage > 0 {
			break;
		}

		tokio::time::sleep(Duration::from_millis(50)).await;
	}

	assert!(usage > 0, "resolution must record document usage");

	// Re-setting the scope drops the cache even when the content is unchanged.
	let replaced = service
		.set_context(SetContextRequest {
			scope: ContextScope::Global,
			source_url: "https://raw.githubusercontent.com/acme/notes/main/facts-v2.md".to_string(),
			name: None,
			added_by: "operator-1".to_string(),
		})
		.await
		.expect("set_context replacement failed.");

	assert_eq!(replaced.outcome, Some(ProcessOutcome::Unchanged));
	assert_eq!(fetches.load(Ordering::SeqCst), 3, "reprocessing fetches to compare digests");

	resolve_global(&service).await;

	assert_eq!(fetches.load(Ordering::SeqCst), 4, "set_context must invalidate the cache");

	// Refresh re-embeds and also drops the cache.
	service
		.refresh_context(RefreshContextRequest { scope: ContextScope::Global })
		.await
		.expect("refresh_context failed.");

	assert_eq!(fetches.load(Ordering::SeqCst), 5);

	resolve_global(&service).await;
	resolve_global(&service).await;

	assert_eq!(fetches.load(Ordering::SeqCst), 6, "refresh must invalidate the cache once");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
