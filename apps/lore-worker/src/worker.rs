use std::time::Duration;

use color_eyre::Result;

use lore_service::LoreService;

/// Retry loop for documents whose processing never completed: registration
/// survives a failed fetch or embed, so the sweep picks the row up again on the
/// next pass. Pacing between documents lives in the sweep itself.
pub async fn run_worker(service: LoreService) -> Result<()> {
	let poll_interval = Duration::from_millis(service.cfg.worker.poll_interval_ms);

	tracing::info!(
		poll_interval_ms = service.cfg.worker.poll_interval_ms,
		"Context worker started."
	);

	loop {
		match service.process_all_unprocessed().await {
			Ok(report) =>
				if report.processed + report.unchanged + report.failed > 0 {
					tracing::info!(
						processed = report.processed,
						unchanged = report.unchanged,
						failed = report.failed,
						"Processing sweep finished."
					);
				},
			Err(err) => {
				tracing::error!(error = %err, "Processing sweep failed.");
			},
		}

		tokio::time::sleep(poll_interval).await;
	}
}
