use std::sync::Arc;

use lore_service::LoreService;
use lore_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<LoreService>,
}
impl AppState {
	pub async fn new(config: lore_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		qdrant.ensure_collection().await?;

		let token_counter = lore_service::build_token_counter(&config.chunking);
		let service = LoreService::new(config, db, qdrant, token_counter);

		Ok(Self { service: Arc::new(service) })
	}
}
