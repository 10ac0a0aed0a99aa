//! In-memory collaborators and configuration builders for pipeline tests.

mod index;
mod providers;

pub use index::{FailingIndex, MemoryIndex, Passage, matches_filter};
pub use providers::{PromptKind, StubEmbedding, StubGenerator, StubRerank};

use std::sync::Arc;

use serde_json::Map;

use sieve_config::{
	Cache, Config, EmbeddingProviderConfig, LlmProviderConfig, Pipeline, ProviderConfig,
	Providers as ProviderSection, Qdrant, Service, Storage, Vocabulary,
};
use sieve_service::Providers;

pub const TEST_DIMENSIONS: u32 = 4;

/// Valid configuration at the highest feature level over three bank categories.
pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection: "sieve_test".to_string(),
				vector_dim: TEST_DIMENSIONS,
				dense_vector: "dense".to_string(),
				bm25_vector: "bm25".to_string(),
				bm25_model: "qdrant/bm25".to_string(),
			},
		},
		providers: ProviderSection {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: TEST_DIMENSIONS,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			rerank: Some(ProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/rerank".to_string(),
				model: "test-rerank".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			}),
			llm: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "test-llm".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		pipeline: Pipeline::default(),
		vocabulary: Vocabulary {
			categories: vec![
				"Halyk Bank".to_string(),
				"Kaspi Bank".to_string(),
				"ForteBank".to_string(),
			],
			category_noun: "bank".to_string(),
			year_min: 2020,
			year_max: 2029,
		},
		cache: Cache { enabled: true, max_entries: 16 },
	}
}

/// `test_config()` with the given feature level.
pub fn config_at_level(level: u8) -> Config {
	let mut cfg = test_config();

	cfg.pipeline.feature_level = level;

	cfg
}

pub fn stub_providers(rerank: StubRerank, generation: StubGenerator) -> Providers {
	Providers::new(Arc::new(StubEmbedding::new()), Arc::new(rerank), Arc::new(generation))
}
