/// Digest of a document's fetched text. Processing compares this against the stored hash
/// to decide whether re-embedding is necessary.
pub fn content_digest(text: &str) -> String {
	blake3::hash(text.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn digest_is_stable_and_content_sensitive() {
		let a = content_digest("the same text");
		let b = content_digest("the same text");
		let c = content_digest("different text");

		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_eq!(a.len(), 64);
	}
}
