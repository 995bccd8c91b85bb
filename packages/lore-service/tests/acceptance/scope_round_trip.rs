use std::sync::Arc;

use lore_domain::ContextScope;
use lore_service::{Error, GetContextRequest, Providers, RemoveContextRequest, SetContextRequest};

use super::{StubEmbedding, StubFetcher};

const DOC: &str = "\
# Shared notes

Standing facts about this community that the assistant should ground on.
Edit the source document and re-set the context to publish a new revision.";

fn url(name: &str) -> String {
	format!("https://raw.githubusercontent.com/acme/notes/main/{name}.md")
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn documents_round_trip_across_scopes() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping documents_round_trip_across_scopes; set LORE_PG_DSN to run this test.");

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping documents_round_trip_across_scopes; set LORE_QDRANT_URL to run this test."
		);

		return;
	};
	let providers = Providers::new(
		Arc::new(StubEmbedding { vector_dim: 4 }),
		Arc::new(StubFetcher { content: DOC.to_string() }),
	);
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await;
	let guild = ContextScope::Guild { guild_id: "g-trip".to_string() };

	for (scope, name) in [
		(ContextScope::Global, "global"),
		(guild.clone(), "guild"),
		(ContextScope::User { user_id: "u-trip".to_string() }, "user"),
	] {
		service
			.set_context(SetContextRequest {
				scope,
				source_url: url(name),
				name: None,
				added_by: "operator-1".to_string(),
			})
			.await
			.expect("set_context failed.");
	}

	let listed = service.list_contexts().await.expect("list_contexts failed.");

	assert_eq!(listed.documents.len(), 3);
	assert_eq!(listed.documents[0].scope, "global");
	assert_eq!(listed.documents[1].scope, "guild");
	assert_eq!(listed.documents[2].scope, "user");

	let fetched = service
		.get_context(GetContextRequest { scope: guild.clone() })
		.await
		.expect("get_context failed.");

	assert_eq!(fetched.document.source_url, url("guild"));
	assert_eq!(fetched.document.added_by, "operator-1");
	assert!(fetched.indexed_chunks > 0, "Processing must leave indexed chunks behind.");
	assert_eq!(fetched.indexed_chunks, fetched.document.chunk_count as u64);

	// Setting the same scope again swaps the URL on the existing row.
	let replaced = service
		.set_context(SetContextRequest {
			scope: guild.clone(),
			source_url: url("guild-v2"),
			name: Some("Guild handbook".to_string()),
			added_by: "operator-2".to_string(),
		})
		.await
		.expect("set_context replacement failed.");

	assert_eq!(replaced.document.context_id, fetched.document.context_id);
	assert_eq!(replaced.document.source_url, url("guild-v2"));
	assert_eq!(replaced.document.name.as_deref(), Some("Guild handbook"));
	assert_eq!(replaced.document.added_by, "operator-2");
	assert_eq!(service.list_contexts().await.expect("list failed.").documents.len(), 3);

	let removed = service
		.remove_context(RemoveContextRequest { scope: guild.clone() })
		.await
		.expect("remove_context failed.");

	assert_eq!(removed.document.context_id, fetched.document.context_id);

	let missing = service
		.get_context(GetContextRequest { scope: guild.clone() })
		.await
		.expect_err("Expected the removed scope to be gone.");

	assert!(matches!(missing, Error::NotFound { .. }));

	let missing = service
		.remove_context(RemoveContextRequest { scope: guild })
		.await
		.expect_err("Expected a second removal to fail.");

	assert!(matches!(missing, Error::NotFound { .. }));

	let blank = service
		.get_context(GetContextRequest {
			scope: ContextScope::Guild { guild_id: "  ".to_string() },
		})
		.await
		.expect_err("Expected a blank target to be rejected.");

	assert!(matches!(blank, Error::InvalidRequest { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
