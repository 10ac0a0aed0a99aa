use serde::{Deserialize, Serialize};

use sieve_storage::models::{IndexRecord, LexicalHit, VectorHit};

/// Stand-in for a missing text field inside an identity key.
pub const UNKNOWN_FIELD: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
	Dense,
	Sparse,
	Hybrid,
}

/// Passage identity used for deduplication. Two candidates with equal keys are the same passage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
	pub category: String,
	pub period: String,
	pub year: i64,
	pub doc_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub category: Option<String>,
	pub period: Option<String>,
	pub year: Option<i64>,
	pub doc_type: Option<String>,
	pub content: String,
	/// Similarity for dense hits, lexical relevance for sparse hits.
	pub raw_score: f32,
	pub normalized_score: Option<f32>,
	pub hybrid_score: Option<f32>,
	pub rerank_score: Option<f32>,
	pub provenance: Provenance,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub original_content: Option<String>,
}
impl Candidate {
	pub fn from_vector_hit(hit: VectorHit) -> Self {
		Self::from_record(hit.record, 1.0 - hit.distance, Provenance::Dense)
	}

	pub fn from_lexical_hit(hit: LexicalHit) -> Self {
		Self::from_record(hit.record, hit.relevance, Provenance::Sparse)
	}

	fn from_record(record: IndexRecord, raw_score: f32, provenance: Provenance) -> Self {
		Self {
			category: record.category,
			period: record.period,
			year: record.year,
			doc_type: record.doc_type,
			content: record.content.unwrap_or_default(),
			raw_score,
			normalized_score: None,
			hybrid_score: None,
			rerank_score: None,
			provenance,
			original_content: None,
		}
	}

	pub fn identity_key(&self) -> IdentityKey {
		IdentityKey {
			category: text_or_unknown(self.category.as_deref()),
			period: text_or_unknown(self.period.as_deref()),
			year: self.year.unwrap_or(0),
			doc_type: text_or_unknown(self.doc_type.as_deref()),
		}
	}

	pub fn is_compressed(&self) -> bool {
		self.original_content.is_some()
	}

	/// `<category> - <period> <year> - <type>`, as shown to the answer model.
	pub fn source_label(&self) -> String {
		let year = self.year.map(|year| year.to_string()).unwrap_or_else(|| UNKNOWN_FIELD.into());

		format!(
			"{} - {} {} - {}",
			text_or_unknown(self.category.as_deref()),
			text_or_unknown(self.period.as_deref()),
			year,
			text_or_unknown(self.doc_type.as_deref()),
		)
	}
}

fn text_or_unknown(value: Option<&str>) -> String {
	value.unwrap_or(UNKNOWN_FIELD).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(category: Option<&str>, year: Option<i64>) -> IndexRecord {
		IndexRecord {
			category: category.map(str::to_string),
			period: Some("Q2".to_string()),
			year,
			doc_type: Some("press_release".to_string()),
			content: Some("Loan book grew 12%.".to_string()),
		}
	}

	#[test]
	fn distance_converts_to_similarity() {
		let hit = VectorHit { record: record(Some("Kaspi Bank"), Some(2024)), distance: 0.25 };
		let candidate = Candidate::from_vector_hit(hit);

		assert_eq!(candidate.raw_score, 0.75);
		assert_eq!(candidate.provenance, Provenance::Dense);
		assert_eq!(candidate.content, "Loan book grew 12%.");
	}

	#[test]
	fn missing_fields_use_sentinels_in_identity() {
		let hit = LexicalHit { record: record(None, None), relevance: 3.5 };
		let key = Candidate::from_lexical_hit(hit).identity_key();

		assert_eq!(key.category, UNKNOWN_FIELD);
		assert_eq!(key.year, 0);
		assert_eq!(key.period, "Q2");
	}

	#[test]
	fn dense_and_sparse_hits_of_one_passage_share_a_key() {
		let dense = Candidate::from_vector_hit(VectorHit {
			record: record(Some("Halyk Bank"), Some(2023)),
			distance: 0.1,
		});
		let sparse = Candidate::from_lexical_hit(LexicalHit {
			record: record(Some("Halyk Bank"), Some(2023)),
			relevance: 7.0,
		});

		assert_eq!(dense.identity_key(), sparse.identity_key());
	}

	#[test]
	fn source_label_lists_every_field() {
		let candidate = Candidate::from_vector_hit(VectorHit {
			record: record(Some("ForteBank"), None),
			distance: 0.0,
		});

		assert_eq!(candidate.source_label(), "ForteBank - Q2 unknown - press_release");
	}
}
