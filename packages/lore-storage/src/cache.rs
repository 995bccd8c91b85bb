use sqlx::PgExecutor;
use time::OffsetDateTime;

use crate::{Result, models::CachedContent};

pub async fn get_cached_content<'e, E>(
	executor: E,
	cache_key: &str,
) -> Result<Option<CachedContent>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, CachedContent>(
		"\
SELECT
\tcache_key,
\tcontent,
\tcharacter_count,
\tword_count,
\tsource_url,
\tfetched_at
FROM context_cache
WHERE cache_key = $1
LIMIT 1",
	)
	.bind(cache_key)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn upsert_cached_content<'e, E>(
	executor: E,
	cache_key: &str,
	content: &str,
	character_count: i64,
	word_count: i64,
	source_url: &str,
	fetched_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO context_cache (cache_key, content, character_count, word_count, source_url, fetched_at)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (cache_key) DO UPDATE
SET
\tcontent = EXCLUDED.content,
\tcharacter_count = EXCLUDED.character_count,
\tword_count = EXCLUDED.word_count,
\tsource_url = EXCLUDED.source_url,
\tfetched_at = EXCLUDED.fetched_at",
	)
	.bind(cache_key)
	.bind(content)
	.bind(character_count)
	.bind(word_count)
	.bind(source_url)
	.bind(fetched_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn delete_cached_content<'e, E>(executor: E, cache_key: &str) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM context_cache WHERE cache_key = $1")
		.bind(cache_key)
		.execute(executor)
		.await?;

	Ok(())
}
