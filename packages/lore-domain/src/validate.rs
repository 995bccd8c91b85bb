use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentReject {
	RejectEmpty,
	RejectTooShort { tokens: u32, min_tokens: u32 },
	RejectTooLarge { bytes: u64, max_bytes: u64 },
}

impl fmt::Display for ContentReject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::RejectEmpty => write!(f, "Document content is empty."),
			Self::RejectTooShort { tokens, min_tokens } => {
				write!(f, "Document content has {tokens} tokens; at least {min_tokens} required.")
			},
			Self::RejectTooLarge { bytes, max_bytes } => {
				write!(f, "Document content is {bytes} bytes; the limit is {max_bytes} bytes.")
			},
		}
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContentStats {
	pub character_count: u32,
	pub word_count: u32,
}

/// Character-based token estimate, roughly four characters per token. Used wherever no
/// provider tokenizer is configured, and always for the pre-chunking content gate.
pub fn estimate_tokens(text: &str) -> u32 {
	text.chars().count().div_ceil(4) as u32
}

pub fn content_stats(text: &str) -> ContentStats {
	ContentStats {
		character_count: text.chars().count() as u32,
		word_count: text.unicode_words().count() as u32,
	}
}

/// Gate run before chunking. Size is checked before the token estimate so oversized
/// documents are rejected without scanning their full text.
pub fn validate_content(text: &str, cfg: &lore_config::Fetch) -> Result<(), ContentReject> {
	if text.trim().is_empty() {
		return Err(ContentReject::RejectEmpty);
	}

	let bytes = text.len() as u64;

	if bytes > cfg.max_document_bytes {
		return Err(ContentReject::RejectTooLarge { bytes, max_bytes: cfg.max_document_bytes });
	}

	let tokens = estimate_tokens(text);

	if tokens < cfg.min_content_tokens {
		return Err(ContentReject::RejectTooShort { tokens, min_tokens: cfg.min_content_tokens });
	}

	Ok(())
}
