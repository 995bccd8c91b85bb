use std::sync::Arc;

use lore_domain::ContextScope;
use lore_service::{
	BoxFuture, DocumentFetcher, EmbeddingProvider, ProcessOutcome, Providers,
	ResolveRelevantContextRequest, SetContextRequest,
};

use super::axis_vector;

const GLOBAL_DOC: &str = "\
# Release history

alpha milestones: the project shipped its first public build in March.
Every release since has been announced in the town square channel.";

const USER_DOC: &str = "\
# Personal preferences

beta settings: this member prefers short answers with source links.
They opted into release pings and the weekly digest messages.";

const OTHER_GUILD_DOC: &str = "\
# Another community

gamma archive: a different guild keeps its own release history here.
Nothing in this document should ever reach our caller.";

/// Embeds by content marker so similarities are known up front. The query leans
/// toward the global document's axis; scope weighting must still win.
struct MarkerEmbedding {
	vector_dim: u32,
}

impl EmbeddingProvider for MarkerEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a lore_config::EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, lore_providers::Result<Vec<Vec<f32>>>> {
		let vectors = texts.iter().map(|text| marker_vector(self.vector_dim, text)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

fn marker_vector(vector_dim: u32, text: &str) -> Vec<f32> {
	if text.starts_with("ranking query") {
		let mut vector = vec![0.0; vector_dim as usize];

		vector[0] = 0.8;
		vector[1] = 0.6;

		return vector;
	}
	if text.contains("alpha") || text.contains("gamma") {
		return axis_vector(vector_dim, 0);
	}
	if text.contains("beta") {
		return axis_vector(vector_dim, 1);
	}

	axis_vector(vector_dim, 2)
}

struct MappedFetcher;

impl DocumentFetcher for MappedFetcher {
	fn fetch<'a>(
		&'a self,
		_cfg: &'a lore_config::Fetch,
		url: &'a str,
	) -> BoxFuture<'a, lore_providers::Result<String>> {
		let content = if url.ends_with("global.md") {
			GLOBAL_DOC
		} else if url.ends_with("user.md") {
			USER_DOC
		} else {
			OTHER_GUILD_DOC
		}
		.to_string();

		Box::pin(async move { Ok(content) })
	}
}

fn url(name: &str) -> String {
	format!("https://raw.githubusercontent.com/acme/notes/main/{name}.md")
}

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set LORE_PG_DSN and LORE_QDRANT_URL to run."]
async fn personal_scope_outranks_more_similar_global_chunks() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping personal_scope_outranks_more_similar_global_chunks; set LORE_PG_DSN to run \
			 this test."
		);

		return;
	};
	let Some(qdrant_url) = super::test_qdrant_url() else {
		eprintln!(
			"Skipping personal_scope_outranks_more_similar_global_chunks; set LORE_QDRANT_URL to \
			 run this test."
		);

		return;
	};
	let providers =
		Providers::new(Arc::new(MarkerEmbedding { vector_dim: 4 }), Arc::new(MappedFetcher));
	let collection = test_db.collection_name("lore_acceptance");
	let cfg = super::test_config(test_db.dsn().to_string(), qdrant_url, 4, collection);
	let service = super::build_service(cfg, providers).await;

	for (scope, name) in [
		(ContextScope::Global, "global"),
		(ContextScope::User { user_id: "u-rank".to_string() }, "user"),
		(ContextScope::Guild { guild_id: "g-other".to_string() }, "other"),
	] {
		let set = service
			.set_context(SetContextRequest {
				scope,
				source_url: url(name),
				name: None,
				added_by: "operator-1".to_string(),
			})
			.await
			.expect("set_context failed.");

		assert_eq!(set.outcome, Some(ProcessOutcome::Processed));
	}

	let resolved = service
		.resolve_relevant_context(ResolveRelevantContextRequest {
			query: "ranking query about recent releases".to_string(),
			guild_id: None,
			user_id: Some("u-rank".to_string()),
		})
		.await;

	assert!(!resolved.prompt.is_empty(), "expected grounded context for the caller");

	let personal = resolved
		.prompt
		.find("[Personal context (highest priority)]")
		.expect("personal section missing");
	let global = resolved.prompt.find("[Global context]").expect("global section missing");

	assert!(personal < global, "the personal tier must outrank the more similar global chunks");
	assert!(resolved.prompt.contains("beta settings"));
	assert!(resolved.prompt.contains("alpha milestones"));
	assert!(
		!resolved.prompt.contains("gamma"),
		"another guild's document must never reach this caller"
	);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
