mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, EmbeddingProviderConfig, Fetch, Postgres, Providers, Qdrant, Retrieval,
	Service, Storage, Worker,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.admin_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.admin_bind must be non-empty.".to_string(),
		});
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.model must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.batch_max_inputs == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.batch_max_inputs must be greater than zero.".to_string(),
		});
	}
	if !cfg.providers.embedding.price_per_million_tokens.is_finite() {
		return Err(Error::Validation {
			message: "providers.embedding.price_per_million_tokens must be a finite number."
				.to_string(),
		});
	}
	if cfg.providers.embedding.price_per_million_tokens < 0.0 {
		return Err(Error::Validation {
			message: "providers.embedding.price_per_million_tokens must be zero or greater."
				.to_string(),
		});
	}
	if cfg.fetch.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "fetch.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.fetch.max_document_bytes == 0 {
		return Err(Error::Validation {
			message: "fetch.max_document_bytes must be greater than zero.".to_string(),
		});
	}
	if cfg.fetch.min_content_tokens == 0 {
		return Err(Error::Validation {
			message: "fetch.min_content_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.fetch.allowed_url_prefixes.is_empty() {
		return Err(Error::Validation {
			message: "fetch.allowed_url_prefixes must be non-empty.".to_string(),
		});
	}

	for prefix in &cfg.fetch.allowed_url_prefixes {
		if !prefix.starts_with("https://") {
			return Err(Error::Validation {
				message: "fetch.allowed_url_prefixes entries must start with https://.".to_string(),
			});
		}
	}

	if cfg.chunking.max_tokens == 0 {
		return Err(Error::Validation {
			message: "chunking.max_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.overlap_tokens >= cfg.chunking.max_tokens {
		return Err(Error::Validation {
			message: "chunking.overlap_tokens must be less than chunking.max_tokens.".to_string(),
		});
	}
	if cfg.retrieval.limit == 0 {
		return Err(Error::Validation {
			message: "retrieval.limit must be greater than zero.".to_string(),
		});
	}
	if !cfg.retrieval.score_threshold.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.score_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.retrieval.score_threshold) {
		return Err(Error::Validation {
			message: "retrieval.score_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.chunking.tokenizer_repo.as_deref().map(|repo| repo.trim().is_empty()).unwrap_or(false) {
		cfg.chunking.tokenizer_repo = None;
	}

	for prefix in &mut cfg.fetch.allowed_url_prefixes {
		let trimmed = prefix.trim();

		if trimmed.len() != prefix.len() {
			*prefix = trimmed.to_string();
		}
	}
}
