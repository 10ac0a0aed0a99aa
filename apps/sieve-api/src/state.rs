use std::sync::Arc;

use sieve_service::{Pipeline, Providers};
use sieve_storage::qdrant::QdrantStore;

#[derive(Clone)]
pub struct AppState {
	pub pipeline: Arc<Pipeline>,
}
impl AppState {
	pub fn new(config: sieve_config::Config) -> color_eyre::Result<Self> {
		let index = Arc::new(QdrantStore::new(&config.storage.qdrant)?);
		let pipeline = Pipeline::new(config, index, Providers::http()?)?;

		Ok(Self::from_pipeline(pipeline))
	}

	pub fn from_pipeline(pipeline: Pipeline) -> Self {
		Self { pipeline: Arc::new(pipeline) }
	}
}
