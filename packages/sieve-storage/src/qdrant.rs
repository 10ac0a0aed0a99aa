use std::collections::HashMap;

use qdrant_client::qdrant::{
	Condition, Document, Filter, Query, QueryPointsBuilder, ScoredPoint, Value, value::Kind,
};

use crate::{
	Error, Result,
	models::{
		CATEGORY_FIELD, CONTENT_FIELD, DOC_TYPE_FIELD, FieldClause, FieldFilter, IndexRecord,
		LexicalHit, PERIOD_FIELD, VectorHit, YEAR_FIELD,
	},
};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	pub dense_vector: String,
	pub bm25_vector: String,
	pub bm25_model: String,
}
impl QdrantStore {
	pub fn new(cfg: &sieve_config::Qdrant) -> Result<Self> {
		if cfg.collection.trim().is_empty() {
			return Err(Error::InvalidArgument("Qdrant collection must be non-empty.".to_string()));
		}

		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			dense_vector: cfg.dense_vector.clone(),
			bm25_vector: cfg.bm25_vector.clone(),
			bm25_model: cfg.bm25_model.clone(),
		})
	}

	pub async fn search_dense(
		&self,
		vector: Vec<f32>,
		limit: u32,
		filter: Option<&FieldFilter>,
	) -> Result<Vec<VectorHit>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions, collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.using(self.dense_vector.as_str())
			.with_payload(true)
			.limit(limit as u64);

		if let Some(filter) = filter.and_then(to_qdrant_filter) {
			search = search.filter(filter);
		}

		let response = self.client.query(search).await?;

		// Cosine collections report similarity as the point score.
		Ok(response
			.result
			.iter()
			.map(|point| VectorHit { record: decode_record(point), distance: 1.0 - point.score })
			.collect())
	}

	pub async fn search_bm25(&self, text: &str, limit: u32) -> Result<Vec<LexicalHit>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(Document::new(text.to_string(), self.bm25_model.as_str())))
			.using(self.bm25_vector.as_str())
			.with_payload(true)
			.limit(limit as u64);
		let response = self.client.query(search).await?;

		Ok(response
			.result
			.iter()
			.map(|point| LexicalHit { record: decode_record(point), relevance: point.score })
			.collect())
	}
}

pub fn to_qdrant_filter(filter: &FieldFilter) -> Option<Filter> {
	let conditions: Vec<Condition> = filter
		.all_of
		.iter()
		.filter(|clause| !clause.is_empty())
		.map(|clause| match clause {
			FieldClause::Keyword { field, any_of } => {
				Condition::matches(field.as_str(), any_of.clone())
			},
			FieldClause::Integer { field, any_of } => {
				Condition::matches(field.as_str(), any_of.clone())
			},
		})
		.collect();

	if conditions.is_empty() { None } else { Some(Filter::all(conditions)) }
}

pub fn decode_record(point: &ScoredPoint) -> IndexRecord {
	decode_payload(&point.payload)
}

pub fn decode_payload(payload: &HashMap<String, Value>) -> IndexRecord {
	IndexRecord {
		category: payload_string(payload, CATEGORY_FIELD),
		period: payload_string(payload, PERIOD_FIELD),
		year: payload_i64(payload, YEAR_FIELD),
		doc_type: payload_string(payload, DOC_TYPE_FIELD),
		content: payload_string(payload, CONTENT_FIELD),
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match payload.get(key)?.kind.as_ref()? {
		Kind::StringValue(value) if !value.trim().is_empty() => Some(value.clone()),
		_ => None,
	}
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	match payload.get(key)?.kind.as_ref()? {
		Kind::IntegerValue(value) => Some(*value),
		Kind::DoubleValue(value) if value.fract() == 0.0 => Some(*value as i64),
		Kind::StringValue(value) => value.trim().parse().ok(),
		_ => None,
	}
}
