use serde::{Deserialize, Serialize};

pub const CATEGORY_FIELD: &str = "category";
pub const PERIOD_FIELD: &str = "period";
pub const YEAR_FIELD: &str = "year";
pub const DOC_TYPE_FIELD: &str = "doc_type";
pub const CONTENT_FIELD: &str = "content";

/// Stored passage fields. Every field may be absent on malformed points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
	pub category: Option<String>,
	pub period: Option<String>,
	pub year: Option<i64>,
	pub doc_type: Option<String>,
	pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
	pub record: IndexRecord,
	/// Cosine distance, `1 - similarity`.
	pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexicalHit {
	pub record: IndexRecord,
	pub relevance: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldClause {
	Keyword { field: String, any_of: Vec<String> },
	Integer { field: String, any_of: Vec<i64> },
}
impl FieldClause {
	pub fn field(&self) -> &str {
		match self {
			Self::Keyword { field, .. } | Self::Integer { field, .. } => field,
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			Self::Keyword { any_of, .. } => any_of.is_empty(),
			Self::Integer { any_of, .. } => any_of.is_empty(),
		}
	}
}

/// Conjunction of clauses; each clause matches any of its values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFilter {
	pub all_of: Vec<FieldClause>,
}
impl FieldFilter {
	pub fn push(&mut self, clause: FieldClause) {
		if !clause.is_empty() {
			self.all_of.push(clause);
		}
	}

	pub fn is_empty(&self) -> bool {
		self.all_of.is_empty()
	}
}
