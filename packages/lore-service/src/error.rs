pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Content rejected: {message}")]
	ContentRejected { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Fetch error: {message}")]
	Fetch { message: String },
	#[error("Embedding error: {message}")]
	Embedding { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}

impl Error {
	pub(crate) fn fetch(err: lore_providers::Error) -> Self {
		Self::Fetch { message: err.to_string() }
	}

	pub(crate) fn embedding(err: lore_providers::Error) -> Self {
		Self::Embedding { message: err.to_string() }
	}
}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<lore_storage::Error> for Error {
	fn from(err: lore_storage::Error) -> Self {
		match err {
			lore_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			lore_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
			lore_storage::Error::TimeFormat(inner) => Self::Storage { message: inner.to_string() },
		}
	}
}
