/// Checks a source URL against the configured allow-list of raw-content host prefixes.
/// Runs before any fetch so arbitrary endpoints are never contacted.
pub fn source_url_allowed(prefixes: &[String], url: &str) -> bool {
	let url = url.trim();

	if url.is_empty() {
		return false;
	}

	prefixes.iter().any(|prefix| url.starts_with(prefix.as_str()))
}
