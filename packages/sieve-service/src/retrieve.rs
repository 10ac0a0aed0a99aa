use std::sync::Arc;

use color_eyre::eyre;

use sieve_config::EmbeddingProviderConfig;
use sieve_domain::QueryMetadata;
use sieve_storage::models::{CATEGORY_FIELD, FieldClause, FieldFilter, PERIOD_FIELD, YEAR_FIELD};

use crate::{
	EmbeddingProvider, Outcome, SearchIndex,
	cache::{self, EmbeddingCache},
	candidate::Candidate,
};

/// Nearest-neighbor retrieval over query embeddings, optionally restricted by metadata.
pub struct DenseRetriever {
	index: Arc<dyn SearchIndex>,
	embedding: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
	cache: EmbeddingCache,
}
impl DenseRetriever {
	pub fn new(
		index: Arc<dyn SearchIndex>,
		embedding: Arc<dyn EmbeddingProvider>,
		cfg: EmbeddingProviderConfig,
		cache: EmbeddingCache,
	) -> Self {
		Self { index, embedding, cfg, cache }
	}

	pub fn cache(&self) -> &EmbeddingCache {
		&self.cache
	}

	pub async fn retrieve(
		&self,
		query: &str,
		limit: u32,
		metadata: Option<&QueryMetadata>,
	) -> Outcome<Vec<Candidate>> {
		let vector = match self.embed_query(query).await {
			Ok(vector) => vector,
			Err(err) => {
				tracing::warn!(error = %err, "Query embedding failed.");

				return Outcome::failed(err);
			},
		};
		let filter = metadata.and_then(build_field_filter);

		match self.index.vector_search(vector, limit, filter.as_ref()).await {
			Ok(hits) => {
				tracing::debug!(
					limit,
					hits = hits.len(),
					filtered = filter.is_some(),
					"Dense retrieval finished."
				);

				Outcome::from_items(hits.into_iter().map(Candidate::from_vector_hit).collect())
			},
			Err(err) => {
				tracing::warn!(error = %err, limit, "Dense retrieval failed.");

				Outcome::failed(err)
			},
		}
	}

	async fn embed_query(&self, query: &str) -> color_eyre::Result<Vec<f32>> {
		let cache_key = if self.cache.is_enabled() {
			match cache::build_embedding_cache_key(&self.cfg, query) {
				Ok(key) => Some(key),
				Err(err) => {
					tracing::warn!(error = %err, "Embedding cache key build failed.");

					None
				},
			}
		} else {
			None
		};

		if let Some(key) = cache_key.as_deref() {
			if let Some(vector) = self.cache.get(key) {
				tracing::debug!(
					cache_key_prefix = cache::cache_key_prefix(key),
					hit = true,
					"Embedding cache hit."
				);

				return Ok(vector);
			}
		}

		let texts = vec![query.to_string()];
		let mut vectors = self.embedding.embed(&self.cfg, &texts).await?;

		if vectors.len() != 1 {
			return Err(eyre::eyre!(
				"Embedding provider returned {} vectors for one query.",
				vectors.len()
			));
		}

		let vector = vectors.swap_remove(0);

		if vector.len() != self.cfg.dimensions as usize {
			return Err(eyre::eyre!(
				"Embedding has {} dimensions, expected {}.",
				vector.len(),
				self.cfg.dimensions
			));
		}

		if let Some(key) = cache_key {
			self.cache.insert(key, vector.clone());
		}

		Ok(vector)
	}
}

/// Lexical retrieval. Metadata filters are never applied here.
pub struct SparseRetriever {
	index: Arc<dyn SearchIndex>,
}
impl SparseRetriever {
	pub fn new(index: Arc<dyn SearchIndex>) -> Self {
		Self { index }
	}

	pub async fn retrieve(&self, query: &str, limit: u32) -> Outcome<Vec<Candidate>> {
		match self.index.lexical_search(query, limit).await {
			Ok(hits) => {
				tracing::debug!(limit, hits = hits.len(), "Sparse retrieval finished.");

				Outcome::from_items(hits.into_iter().map(Candidate::from_lexical_hit).collect())
			},
			Err(err) => {
				tracing::warn!(error = %err, limit, "Sparse retrieval failed.");

				Outcome::failed(err)
			},
		}
	}
}

/// One clause per constrained field. Returns `None` when nothing is constrained.
pub fn build_field_filter(metadata: &QueryMetadata) -> Option<FieldFilter> {
	let mut filter = FieldFilter::default();

	filter.push(FieldClause::Keyword {
		field: CATEGORY_FIELD.to_string(),
		any_of: metadata.categories.clone(),
	});
	filter.push(FieldClause::Keyword {
		field: PERIOD_FIELD.to_string(),
		any_of: metadata.periods.clone(),
	});
	filter.push(FieldClause::Integer {
		field: YEAR_FIELD.to_string(),
		any_of: metadata.years.iter().map(|year| i64::from(*year)).collect(),
	});

	if filter.is_empty() { None } else { Some(filter) }
}
