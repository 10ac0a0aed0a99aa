pub mod cache;
pub mod candidate;
pub mod compress;
pub mod fusion;
pub mod generate;
pub mod index;
pub mod outcome;
pub mod pipeline;
pub mod rerank;
pub mod retrieve;
pub mod text;

mod error;

pub use candidate::{Candidate, IdentityKey, Provenance};
pub use error::{Error, Result};
pub use outcome::{Outcome, Stage, StageIssue};
pub use pipeline::{FeatureLevel, Pipeline, PipelineResult, QueryRequest, StageTimings};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::Client;

use sieve_config::{EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use sieve_providers::{embedding, generation, rerank as rerank_client};
use sieve_storage::models::{FieldFilter, LexicalHit, VectorHit};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	/// Returns one relevance score per document, in document order.
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		max_tokens: u32,
		temperature: f32,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Passage index answering both nearest-neighbor and lexical queries.
pub trait SearchIndex
where
	Self: Send + Sync,
{
	fn vector_search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u32,
		filter: Option<&'a FieldFilter>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<VectorHit>>>;

	fn lexical_search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<LexicalHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, rerank, generation }
	}

	/// HTTP clients for OpenAI-compatible endpoints, sharing one connection pool.
	pub fn http() -> color_eyre::Result<Self> {
		let provider = Arc::new(HttpProviders { client: sieve_providers::http_client()? });

		Ok(Self { embedding: provider.clone(), rerank: provider.clone(), generation: provider })
	}
}

struct HttpProviders {
	client: Client,
}

impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(&self.client, cfg, texts))
	}
}

impl RerankProvider for HttpProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(rerank_client::rerank(&self.client, cfg, query, docs))
	}
}

impl GenerationProvider for HttpProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		max_tokens: u32,
		temperature: f32,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate(&self.client, cfg, prompt, max_tokens, temperature))
	}
}
