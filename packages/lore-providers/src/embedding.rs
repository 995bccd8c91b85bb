use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

pub async fn embed(
	cfg: &lore_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json)
}

/// Embeds `texts` in request-sized groups, pausing between groups so large
/// documents do not hammer the provider.
///
/// Vectors come back in input order across all groups.
pub async fn embed_batched(
	cfg: &lore_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let mut vectors = Vec::with_capacity(texts.len());

	for (group_index, group) in texts.chunks(cfg.batch_max_inputs as usize).enumerate() {
		if group_index > 0 && cfg.batch_delay_ms > 0 {
			tokio::time::sleep(Duration::from_millis(cfg.batch_delay_ms)).await;
		}

		tracing::debug!(
			provider = %cfg.provider_id,
			group = group_index + 1,
			inputs = group.len(),
			"Embedding input group."
		);

		let mut group_vectors = embed(cfg, group).await?;

		vectors.append(&mut group_vectors);
	}

	Ok(vectors)
}

pub fn estimate_cost(cfg: &lore_config::EmbeddingProviderConfig, token_count: u64) -> f64 {
	token_count as f64 / 1_000_000. * cfg.price_per_million_tokens
}

fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".into() }
	})?;

	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse { message: "Embedding item missing embedding array.".into() }
		})?;
		let mut vec = Vec::with_capacity(embedding.len());
		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".into(),
			})?;
			vec.push(number as f32);
		}
		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}
