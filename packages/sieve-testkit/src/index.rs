use std::sync::Mutex;

use color_eyre::eyre;

use sieve_service::{BoxFuture, SearchIndex};
use sieve_storage::models::{
	CATEGORY_FIELD, DOC_TYPE_FIELD, FieldClause, FieldFilter, IndexRecord, LexicalHit,
	PERIOD_FIELD, VectorHit, YEAR_FIELD,
};

/// One stored passage with fixed retrieval scores.
#[derive(Debug, Clone)]
pub struct Passage {
	pub record: IndexRecord,
	pub similarity: f32,
	/// `None` keeps the passage out of lexical results.
	pub relevance: Option<f32>,
}
impl Passage {
	pub fn new(category: &str, period: &str, year: i64, doc_type: &str, content: &str) -> Self {
		Self {
			record: IndexRecord {
				category: Some(category.to_string()),
				period: Some(period.to_string()),
				year: Some(year),
				doc_type: Some(doc_type.to_string()),
				content: Some(content.to_string()),
			},
			similarity: 0.5,
			relevance: None,
		}
	}

	pub fn with_similarity(mut self, similarity: f32) -> Self {
		self.similarity = similarity;

		self
	}

	pub fn with_relevance(mut self, relevance: f32) -> Self {
		self.relevance = Some(relevance);

		self
	}
}

/// Index over a fixed passage list. Scores ignore the query text; filters and limits apply.
#[derive(Default)]
pub struct MemoryIndex {
	passages: Vec<Passage>,
	vector_calls: Mutex<Vec<(u32, Option<FieldFilter>)>>,
	lexical_calls: Mutex<Vec<(String, u32)>>,
}
impl MemoryIndex {
	pub fn new(passages: Vec<Passage>) -> Self {
		Self { passages, ..Self::default() }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	/// `(limit, filter)` of every vector search, in call order.
	pub fn vector_calls(&self) -> Vec<(u32, Option<FieldFilter>)> {
		self.vector_calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// `(query, limit)` of every lexical search, in call order.
	pub fn lexical_calls(&self) -> Vec<(String, u32)> {
		self.lexical_calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl SearchIndex for MemoryIndex {
	fn vector_search<'a>(
		&'a self,
		_vector: Vec<f32>,
		limit: u32,
		filter: Option<&'a FieldFilter>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<VectorHit>>> {
		self.vector_calls
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push((limit, filter.cloned()));

		let mut matched: Vec<&Passage> = self
			.passages
			.iter()
			.filter(|passage| filter.is_none_or(|filter| matches_filter(&passage.record, filter)))
			.collect();

		matched.sort_by(|left, right| right.similarity.total_cmp(&left.similarity));

		let hits = matched
			.into_iter()
			.take(limit as usize)
			.map(|passage| VectorHit {
				record: passage.record.clone(),
				distance: 1.0 - passage.similarity,
			})
			.collect();

		Box::pin(async move { Ok(hits) })
	}

	fn lexical_search<'a>(
		&'a self,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<LexicalHit>>> {
		self.lexical_calls
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push((query.to_string(), limit));

		let mut matched: Vec<(&Passage, f32)> = self
			.passages
			.iter()
			.filter_map(|passage| passage.relevance.map(|relevance| (passage, relevance)))
			.collect();

		matched.sort_by(|left, right| right.1.total_cmp(&left.1));

		let hits = matched
			.into_iter()
			.take(limit as usize)
			.map(|(passage, relevance)| LexicalHit { record: passage.record.clone(), relevance })
			.collect();

		Box::pin(async move { Ok(hits) })
	}
}

/// Index whose every call fails.
pub struct FailingIndex;
impl SearchIndex for FailingIndex {
	fn vector_search<'a>(
		&'a self,
		_vector: Vec<f32>,
		_limit: u32,
		_filter: Option<&'a FieldFilter>,
	) -> BoxFuture<'a, color_eyre::Result<Vec<VectorHit>>> {
		Box::pin(async move { Err(eyre::eyre!("Vector index is unavailable.")) })
	}

	fn lexical_search<'a>(
		&'a self,
		_query: &'a str,
		_limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<LexicalHit>>> {
		Box::pin(async move { Err(eyre::eyre!("Lexical index is unavailable.")) })
	}
}

/// Every clause must hold; a clause holds when the field equals any of its values.
pub fn matches_filter(record: &IndexRecord, filter: &FieldFilter) -> bool {
	filter.all_of.iter().all(|clause| match clause {
		FieldClause::Keyword { field, any_of } => {
			let value = match field.as_str() {
				CATEGORY_FIELD => record.category.as_deref(),
				PERIOD_FIELD => record.period.as_deref(),
				DOC_TYPE_FIELD => record.doc_type.as_deref(),
				_ => None,
			};

			value.is_some_and(|value| any_of.iter().any(|wanted| wanted == value))
		},
		FieldClause::Integer { field, any_of } => {
			field == YEAR_FIELD && record.year.is_some_and(|year| any_of.contains(&year))
		},
	})
}
