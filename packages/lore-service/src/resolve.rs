use std::collections::HashMap;

use ahash::AHashMap;
use qdrant_client::qdrant::{Condition, Filter, MinShould, ScoredPoint, Value, value::Kind};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, LoreService, Result};
use lore_domain::{ContextScope, prompt, validate};
use lore_storage::{cache, documents};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolveContextRequest {
	pub guild_id: Option<String>,
	pub user_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolveRelevantContextRequest {
	pub query: String,
	pub guild_id: Option<String>,
	pub user_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolveContextResponse {
	pub prompt: String,
}

#[derive(Debug)]
struct RankedChunk {
	context_id: Uuid,
	scope: ContextScope,
	chunk_index: i32,
	content: String,
	similarity: f32,
}

impl RankedChunk {
	/// Scope weight dominates and similarity only breaks ties inside a tier: any
	/// personal hit outranks any server hit, which outranks any global hit.
	fn priority(&self) -> f64 {
		f64::from(self.scope.retrieval_weight()) * 1_000. + f64::from(self.similarity)
	}
}

impl LoreService {
	/// Assembles the full grounding prompt for a caller from the tiers that apply
	/// to them.
	///
	/// Fail-closed: any internal failure resolves to an empty prompt, which the
	/// caller turns into the canned refusal instead of answering from model
	/// memory.
	pub async fn resolve_context(&self, req: ResolveContextRequest) -> ResolveContextResponse {
		match self.try_resolve_context(&req).await {
			Ok(prompt) => ResolveContextResponse { prompt },
			Err(err) => {
				tracing::warn!(error = %err, "Context resolution failed; returning empty prompt.");

				ResolveContextResponse { prompt: String::new() }
			},
		}
	}

	/// Like [`resolve_context`](Self::resolve_context), but retrieves only the
	/// indexed chunks most similar to `query` instead of whole documents.
	pub async fn resolve_relevant_context(
		&self,
		req: ResolveRelevantContextRequest,
	) -> ResolveContextResponse {
		match self.try_resolve_relevant(&req).await {
			Ok(prompt) => ResolveContextResponse { prompt },
			Err(err) => {
				tracing::warn!(error = %err, "Relevance retrieval failed; returning empty prompt.");

				ResolveContextResponse { prompt: String::new() }
			},
		}
	}

	async fn try_resolve_context(&self, req: &ResolveContextRequest) -> Result<String> {
		let scopes = scope_chain(req.guild_id.as_deref(), req.user_id.as_deref());
		let mut sections = Vec::with_capacity(scopes.len());
		let mut used = Vec::with_capacity(scopes.len());

		for scope in &scopes {
			if let Some((context_id, content)) = self.scope_section(scope).await? {
				sections.push(format!("[{}]\n{}", scope.tier_label(), content.trim()));
				used.push(context_id);
			}
		}

		self.spawn_usage_bump(used);

		Ok(prompt::render_grounding_prompt(&sections.join("\n\n")))
	}

	/// One tier's content: the cache row when present, otherwise a fresh fetch
	/// that repopulates the cache. Scopes with no registered document contribute
	/// nothing.
	async fn scope_section(&self, scope: &ContextScope) -> Result<Option<(Uuid, String)>> {
		let Some(doc) = documents::find_by_scope(&self.db.pool, scope).await? else {
			return Ok(None);
		};
		let key = scope.cache_key();

		if let Some(hit) = cache::get_cached_content(&self.db.pool, &key).await? {
			return Ok(Some((doc.context_id, hit.content)));
		}

		let text = self
			.providers
			.fetcher
			.fetch(&self.cfg.fetch, &doc.source_url)
			.await
			.map_err(Error::fetch)?;
		let stats = validate::content_stats(&text);
		let now = OffsetDateTime::now_utc();

		cache::upsert_cached_content(
			&self.db.pool,
			&key,
			&text,
			i64::from(stats.character_count),
			i64::from(stats.word_count),
			&doc.source_url,
			now,
		)
		.await?;

		Ok(Some((doc.context_id, text)))
	}

	async fn try_resolve_relevant(&self, req: &ResolveRelevantContextRequest) -> Result<String> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "query is required.".to_string() });
		}

		let scopes = scope_chain(req.guild_id.as_deref(), req.user_id.as_deref());
		let texts = vec![query.to_string()];
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &texts)
			.await
			.map_err(Error::embedding)?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::Embedding {
				message: "Provider returned no vector for the query.".to_string(),
			});
		};

		crate::ensure_vector_dims(
			std::slice::from_ref(&vector),
			self.cfg.storage.qdrant.vector_dim,
		)?;

		// Oversample so a tier-weighted reorder of the top hits still fills the
		// final limit.
		let candidate_limit = u64::from(self.cfg.retrieval.limit) * 2;
		let hits = self
			.qdrant
			.search_chunks(
				vector,
				scope_filter(&scopes),
				candidate_limit,
				self.cfg.retrieval.score_threshold,
			)
			.await?;
		let mut candidates = Vec::with_capacity(hits.len());

		for point in &hits {
			match parse_point(point) {
				Some(chunk) => candidates.push(chunk),
				None => tracing::warn!("Dropping indexed point with a malformed payload."),
			}
		}

		let ranked = rank_chunks(candidates, self.cfg.retrieval.limit as usize);
		let (context, used) = assemble_sections(ranked);

		self.spawn_usage_bump(used);

		Ok(prompt::render_grounding_prompt(&context))
	}

	/// Usage counters are advisory; resolution never waits on them or fails with
	/// them.
	fn spawn_usage_bump(&self, context_ids: Vec<Uuid>) {
		if context_ids.is_empty() {
			return;
		}

		let pool = self.db.pool.clone();

		tokio::spawn(async move {
			let now = OffsetDateTime::now_utc();

			if let Err(err) = documents::record_usage(&pool, &context_ids, now).await {
				tracing::warn!(error = %err, "Failed to record context usage.");
			}
		});
	}
}

/// Tiers that apply to a caller, in assembly order. Blank ids are treated as
/// absent.
fn scope_chain(guild_id: Option<&str>, user_id: Option<&str>) -> Vec<ContextScope> {
	let mut scopes = vec![ContextScope::Global];

	if let Some(guild_id) = guild_id.map(str::trim).filter(|id| !id.is_empty()) {
		scopes.push(ContextScope::Guild { guild_id: guild_id.to_string() });
	}
	if let Some(user_id) = user_id.map(str::trim).filter(|id| !id.is_empty()) {
		scopes.push(ContextScope::User { user_id: user_id.to_string() });
	}

	scopes
}

/// Disjunction over the caller's tiers. Guild and user arms pin the target id so
/// one guild's chunks never match another's.
fn scope_filter(scopes: &[ContextScope]) -> Filter {
	let mut conditions = Vec::with_capacity(scopes.len());

	for scope in scopes {
		let condition = match scope {
			ContextScope::Global => Condition::matches("scope", "global".to_string()),
			ContextScope::Guild { guild_id } => Condition::from(Filter::all([
				Condition::matches("scope", "guild".to_string()),
				Condition::matches("guild_id", guild_id.clone()),
			])),
			ContextScope::User { user_id } => Condition::from(Filter::all([
				Condition::matches("scope", "user".to_string()),
				Condition::matches("user_id", user_id.clone()),
			])),
		};

		conditions.push(condition);
	}

	Filter {
		must: Vec::new(),
		should: Vec::new(),
		must_not: Vec::new(),
		min_should: Some(MinShould { conditions, min_count: 1 }),
	}
}

fn parse_point(point: &ScoredPoint) -> Option<RankedChunk> {
	let payload = &point.payload;
	let context_id = payload_uuid(payload, "context_id")?;
	let scope_label = payload_string(payload, "scope")?;
	let guild_id = payload_string(payload, "guild_id");
	let user_id = payload_string(payload, "user_id");
	let scope = ContextScope::from_columns(&scope_label, guild_id, user_id)?;
	let chunk_index = payload_i32(payload, "chunk_index")?;
	let content = payload_string(payload, "content")?;

	Some(RankedChunk { context_id, scope, chunk_index, content, similarity: point.score })
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

fn payload_uuid(payload: &HashMap<String, Value>, key: &str) -> Option<Uuid> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Uuid::parse_str(text).ok(),
		_ => None,
	}
}

fn payload_i32(payload: &HashMap<String, Value>, key: &str) -> Option<i32> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => i32::try_from(*value).ok(),
		_ => None,
	}
}

fn rank_chunks(mut chunks: Vec<RankedChunk>, limit: usize) -> Vec<RankedChunk> {
	chunks.sort_by(|a, b| b.priority().total_cmp(&a.priority()));
	chunks.truncate(limit);

	chunks
}

/// Groups ranked chunks into one labeled section per document. Documents appear
/// in the order their best chunk ranked; inside a section, chunks return to
/// reading order.
fn assemble_sections(chunks: Vec<RankedChunk>) -> (String, Vec<Uuid>) {
	let mut order: Vec<Uuid> = Vec::new();
	let mut groups: AHashMap<Uuid, Vec<RankedChunk>> = AHashMap::new();

	for chunk in chunks {
		if !groups.contains_key(&chunk.context_id) {
			order.push(chunk.context_id);
		}

		groups.entry(chunk.context_id).or_default().push(chunk);
	}

	let mut sections = Vec::with_capacity(order.len());

	for context_id in &order {
		let mut group = groups.remove(context_id).unwrap_or_default();

		group.sort_by_key(|chunk| chunk.chunk_index);

		let Some(first) = group.first() else {
			continue;
		};
		let label = first.scope.tier_label();
		let body =
			group.iter().map(|chunk| chunk.content.as_str()).collect::<Vec<_>>().join("\n\n");

		sections.push(format!("[{label}]\n{body}"));
	}

	(sections.join("\n\n"), order)
}
