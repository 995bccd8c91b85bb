use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use lore_domain::ContextScope;

use crate::{Result, models::{ContextDocument, ScopeStats}};

/// Registers `source_url` for a scope, replacing the URL, display name, and
/// uploader in place when the scope already has a document.
///
/// The existing row keeps its `context_id`, `content_hash`, and processing
/// state: previously indexed vectors stay addressable, and the next processing
/// pass decides whether the new source actually changed anything.
pub async fn upsert_by_scope<'e, E>(
	executor: E,
	scope: &ContextScope,
	source_url: &str,
	name: Option<&str>,
	added_by: &str,
	now: OffsetDateTime,
) -> Result<ContextDocument>
where
	E: PgExecutor<'e>,
{
	let conflict_target = match scope {
		ContextScope::Global => "(scope) WHERE scope = 'global'",
		ContextScope::Guild { .. } => "(scope, guild_id) WHERE scope = 'guild'",
		ContextScope::User { .. } => "(scope, user_id) WHERE scope = 'user'",
	};
	let sql = format!(
		"\
INSERT INTO context_documents (
\tcontext_id,
\tscope,
\tguild_id,
\tuser_id,
\tsource_url,
\tname,
\tadded_by,
\tcreated_at,
\tupdated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
ON CONFLICT {conflict_target} DO UPDATE
SET
\tsource_url = EXCLUDED.source_url,
\tname = EXCLUDED.name,
\tadded_by = EXCLUDED.added_by,
\tupdated_at = EXCLUDED.updated_at
RETURNING
\tcontext_id,
\tscope,
\tguild_id,
\tuser_id,
\tsource_url,
\tname,
\tadded_by,
\tcontent_hash,
\tcharacter_count,
\tword_count,
\tchunk_count,
\tprocessing_status,
\tprocessing_error,
\tusage_count,
\tlast_used_at,
\tcreated_at,
\tupdated_at"
	);
	let row = sqlx::query_as::<_, ContextDocument>(&sql)
		.bind(Uuid::new_v4())
		.bind(scope.as_str())
		.bind(scope.target_guild_id())
		.bind(scope.target_user_id())
		.bind(source_url)
		.bind(name)
		.bind(added_by)
		.bind(now)
		.fetch_one(executor)
		.await?;

	Ok(row)
}

pub async fn get_document<'e, E>(executor: E, context_id: Uuid) -> Result<Option<ContextDocument>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ContextDocument>(
		"\
SELECT
\tcontext_id,
\tscope,
\tguild_id,
\tuser_id,
\tsource_url,
\tname,
\tadded_by,
\tcontent_hash,
\tcharacter_count,
\tword_count,
\tchunk_count,
\tprocessing_status,
\tprocessing_error,
\tusage_count,
\tlast_used_at,
\tcreated_at,
\tupdated_at
FROM context_documents
WHERE context_id = $1
LIMIT 1",
	)
	.bind(context_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn find_by_scope<'e, E>(
	executor: E,
	scope: &ContextScope,
) -> Result<Option<ContextDocument>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ContextDocument>(
		"\
SELECT
\tcontext_id,
\tscope,
\tguild_id,
\tuser_id,
\tsource_url,
\tname,
\tadded_by,
\tcontent_hash,
\tcharacter_count,
\tword_count,
\tchunk_count,
\tprocessing_status,
\tprocessing_error,
\tusage_count,
\tlast_used_at,
\tcreated_at,
\tupdated_at
FROM context_documents
WHERE scope = $1
\tAND guild_id IS NOT DISTINCT FROM $2
\tAND user_id IS NOT DISTINCT FROM $3
LIMIT 1",
	)
	.bind(scope.as_str())
	.bind(scope.target_guild_id())
	.bind(scope.target_user_id())
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn list_documents<'e, E>(executor: E) -> Result<Vec<ContextDocument>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ContextDocument>(
		"\
SELECT
\tcontext_id,
\tscope,
\tguild_id,
\tuser_id,
\tsource_url,
\tname,
\tadded_by,
\tcontent_hash,
\tcharacter_count,
\tword_count,
\tchunk_count,
\tprocessing_status,
\tprocessing_error,
\tusage_count,
\tlast_used_at,
\tcreated_at,
\tupdated_at
FROM context_documents
ORDER BY scope ASC, created_at ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_unprocessed<'e, E>(executor: E) -> Result<Vec<ContextDocument>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ContextDocument>(
		"\
SELECT
\tcontext_id,
\tscope,
\tguild_id,
\tuser_id,
\tsource_url,
\tname,
\tadded_by,
\tcontent_hash,
\tcharacter_count,
\tword_count,
\tchunk_count,
\tprocessing_status,
\tprocessing_error,
\tusage_count,
\tlast_used_at,
\tcreated_at,
\tupdated_at
FROM context_documents
WHERE processing_status <> 'completed'
ORDER BY updated_at ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn mark_processed<'e, E>(
	executor: E,
	context_id: Uuid,
	content_hash: &str,
	chunk_count: i32,
	character_count: i64,
	word_count: i64,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE context_documents
SET processing_status = 'completed',
\tprocessing_error = NULL,
\tcontent_hash = $1,
\tchunk_count = $2,
\tcharacter_count = $3,
\tword_count = $4,
\tupdated_at = $5
WHERE context_id = $6",
	)
	.bind(content_hash)
	.bind(chunk_count)
	.bind(character_count)
	.bind(word_count)
	.bind(now)
	.bind(context_id)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn mark_processing_failed<'e, E>(
	executor: E,
	context_id: Uuid,
	error_text: &str,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE context_documents
SET processing_status = 'failed',
\tprocessing_error = $1,
\tupdated_at = $2
WHERE context_id = $3",
	)
	.bind(error_text)
	.bind(now)
	.bind(context_id)
	.execute(executor)
	.await?;

	Ok(())
}

/// Drops the stored digest so the next processing pass re-fetches, re-chunks,
/// and re-embeds even when the source bytes have not changed.
pub async fn clear_content_hash<'e, E>(
	executor: E,
	context_id: Uuid,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE context_documents
SET content_hash = NULL,
\tprocessing_status = 'pending',
\tprocessing_error = NULL,
\tupdated_at = $1
WHERE context_id = $2",
	)
	.bind(now)
	.bind(context_id)
	.execute(executor)
	.await?;

	Ok(())
}

/// Returns the row to its never-processed shape after its vectors have been
/// deleted: no chunks, no digest, status back to `pending`.
pub async fn reset_chunk_state<'e, E>(
	executor: E,
	context_id: Uuid,
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE context_documents
SET chunk_count = 0,
\tcontent_hash = NULL,
\tprocessing_status = 'pending',
\tprocessing_error = NULL,
\tupdated_at = $1
WHERE context_id = $2",
	)
	.bind(now)
	.bind(context_id)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn record_usage<'e, E>(
	executor: E,
	context_ids: &[Uuid],
	now: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	if context_ids.is_empty() {
		return Ok(());
	}

	sqlx::query(
		"\
UPDATE context_documents
SET usage_count = usage_count + 1,
\tlast_used_at = $1
WHERE context_id = ANY($2)",
	)
	.bind(now)
	.bind(context_ids)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn delete_by_scope<'e, E>(
	executor: E,
	scope: &ContextScope,
) -> Result<Option<ContextDocument>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, ContextDocument>(
		"\
DELETE FROM context_documents
WHERE scope = $1
\tAND guild_id IS NOT DISTINCT FROM $2
\tAND user_id IS NOT DISTINCT FROM $3
RETURNING
\tcontext_id,
\tscope,
\tguild_id,
\tuser_id,
\tsource_url,
\tname,
\tadded_by,
\tcontent_hash,
\tcharacter_count,
\tword_count,
\tchunk_count,
\tprocessing_status,
\tprocessing_error,
\tusage_count,
\tlast_used_at,
\tcreated_at,
\tupdated_at",
	)
	.bind(scope.as_str())
	.bind(scope.target_guild_id())
	.bind(scope.target_user_id())
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn scope_stats<'e, E>(executor: E) -> Result<Vec<ScopeStats>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ScopeStats>(
		"\
SELECT
\tscope,
\tCOUNT(*) AS document_count,
\tCOALESCE(SUM(chunk_count), 0)::BIGINT AS chunk_count,
\tCOALESCE(SUM(usage_count), 0)::BIGINT AS usage_count
FROM context_documents
GROUP BY scope
ORDER BY scope ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
