pub use tokenizers::Tokenizer;

pub type TokenizerError = tokenizers::Error;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub max_tokens: u32,
	pub overlap_tokens: u32,
}

/// One embeddable slice of a source document. `text` carries any injected header prefix;
/// `header_path` is the nearest-ancestor markdown header chain open at the chunk's end.
#[derive(Clone, Debug)]
pub struct DocumentChunk {
	pub chunk_index: i32,
	pub text: String,
	pub token_count: u32,
	pub character_count: u32,
	pub header_path: Vec<String>,
}

/// Token counting seam: an exact provider tokenizer when one is configured, otherwise a
/// four-characters-per-token estimate. Counting is per line; chunk counts are line sums.
pub enum TokenCounter {
	Tokenizer(Tokenizer),
	Heuristic,
}

impl TokenCounter {
	pub fn count(&self, text: &str) -> u32 {
		match self {
			Self::Tokenizer(tokenizer) => match tokenizer.encode(text, false) {
				Ok(encoding) => encoding.len() as u32,
				Err(err) => {
					tracing::error!(
						error = %err,
						"Tokenizer failed to encode text; using character estimate."
					);

					lore_domain::validate::estimate_tokens(text)
				},
			},
			Self::Heuristic => lore_domain::validate::estimate_tokens(text),
		}
	}
}

pub fn load_tokenizer(repo: &str) -> Result<Tokenizer, TokenizerError> {
	Tokenizer::from_pretrained(repo, None)
}

/// Splits a markdown document into token-bounded chunks.
///
/// Lines are atomic: a chunk closes when the next line would push it over `max_tokens`,
/// and a single line larger than the budget becomes an over-budget chunk on its own.
/// Each closed chunk is prefixed with any open headers its body does not already contain,
/// and the next chunk is seeded with whole lines pulled from the closed chunk's tail until
/// `overlap_tokens` would be exceeded.
pub fn split_markdown(
	text: &str,
	cfg: &ChunkingConfig,
	counter: &TokenCounter,
) -> Vec<DocumentChunk> {
	let mut chunks = Vec::new();
	let mut headers: Vec<(u8, String)> = Vec::new();
	let mut pending: Vec<String> = Vec::new();
	let mut pending_tokens = 0_u32;
	let mut chunk_index = 0_i32;

	for line in text.lines() {
		let line_tokens = counter.count(line);

		if !pending.is_empty() && pending_tokens + line_tokens > cfg.max_tokens {
			chunks.push(close_chunk(&mut chunk_index, &pending, pending_tokens, &headers, counter));

			let (seed, seed_tokens) = overlap_tail(&pending, cfg.overlap_tokens, counter);

			pending = seed;
			pending_tokens = seed_tokens;
		}

		if let Some(level) = header_level(line) {
			while headers.last().map(|(open, _)| *open >= level).unwrap_or(false) {
				headers.pop();
			}

			headers.push((level, line.to_string()));
		}

		pending.push(line.to_string());

		pending_tokens += line_tokens;
	}

	if !pending.is_empty() {
		chunks.push(close_chunk(&mut chunk_index, &pending, pending_tokens, &headers, counter));
	}

	chunks
}

fn close_chunk(
	chunk_index: &mut i32,
	lines: &[String],
	body_tokens: u32,
	headers: &[(u8, String)],
	counter: &TokenCounter,
) -> DocumentChunk {
	let body = lines.join("\n");
	let mut prefix = String::new();
	let mut prefix_tokens = 0_u32;

	for (_, header) in headers {
		if !body.contains(header.as_str()) {
			prefix.push_str(header);
			prefix.push('\n');

			prefix_tokens += counter.count(header);
		}
	}

	let text = format!("{prefix}{body}");
	let chunk = DocumentChunk {
		chunk_index: *chunk_index,
		character_count: text.chars().count() as u32,
		token_count: body_tokens + prefix_tokens,
		header_path: headers.iter().map(|(_, header)| header.clone()).collect(),
		text,
	};

	*chunk_index += 1;

	chunk
}

fn overlap_tail(
	lines: &[String],
	overlap_tokens: u32,
	counter: &TokenCounter,
) -> (Vec<String>, u32) {
	if overlap_tokens == 0 {
		return (Vec::new(), 0);
	}

	let mut seed = Vec::new();
	let mut total = 0_u32;

	for line in lines.iter().rev() {
		let line_tokens = counter.count(line);

		if total + line_tokens > overlap_tokens {
			break;
		}

		seed.push(line.clone());

		total += line_tokens;
	}

	seed.reverse();

	(seed, total)
}

fn header_level(line: &str) -> Option<u8> {
	let trimmed = line.trim_start();
	let hashes = trimmed.chars().take_while(|c| *c == '#').count();

	if hashes == 0 || hashes > 6 {
		return None;
	}

	match trimmed.as_bytes().get(hashes) {
		None | Some(b' ') | Some(b'\t') => Some(hashes as u8),
		_ => None,
	}
}
