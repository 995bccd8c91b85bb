use std::time::Duration;

use reqwest::Client;

use crate::{Error, Result};

/// Downloads the raw document body from `url`.
///
/// Timeouts and non-success statuses map to dedicated error variants so the
/// caller can record a precise failure reason against the document.
pub async fn fetch(cfg: &lore_config::Fetch, url: &str) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client
		.get(url)
		.send()
		.await
		.map_err(|err| classify_transport(url, cfg.timeout_ms, err))?;
	let res = res.error_for_status().map_err(|err| match err.status() {
		Some(status) => Error::FetchStatus { url: url.to_owned(), status: status.as_u16() },
		None => Error::Reqwest(err),
	})?;

	res.text().await.map_err(|err| classify_transport(url, cfg.timeout_ms, err))
}

fn classify_transport(url: &str, timeout_ms: u64, err: reqwest::Error) -> Error {
	if err.is_timeout() {
		Error::FetchTimeout { url: url.to_owned(), timeout_ms }
	} else {
		Error::Reqwest(err)
	}
}
