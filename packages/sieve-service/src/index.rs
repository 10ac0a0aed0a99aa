use sieve_storage::{
	models::{FieldFilter, LexicalHit, VectorHit},
	qdrant::QdrantStore,
};

use crate::{BoxFuture, SearchIndex};

impl SearchIndex for QdrantStore {
	fn vector_search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u32,
		filter: Option<&'a FieldFilter>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<VectorHit>>> {
		Box::pin(async move { Ok(self.search_dense(vector, limit, filter).await?) })
	}

	fn lexical_search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<LexicalHit>>> {
		Box::pin(async move { Ok(self.search_bm25(query, limit).await?) })
	}
}
