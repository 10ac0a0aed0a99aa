use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::{MetadataExtractor, QueryMetadata, Result, Vocabulary};

const COMPARISON_KEYWORDS: [&str; 5] = ["compare", "comparison", "versus", "vs", "between"];
const TREND_KEYWORDS: [&str; 5] = ["trend", "change", "evolve", "growth", "over time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
	Simple,
	Comparison,
	Trend,
}
impl QueryKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Simple => "simple",
			Self::Comparison => "comparison",
			Self::Trend => "trend",
		}
	}
}

/// Sub-queries derived from one incoming query. Never holds zero sub-queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
	pub kind: QueryKind,
	pub sub_queries: Vec<String>,
	pub metadata: QueryMetadata,
}
impl Decomposition {
	pub fn identity(query: &str) -> Self {
		Self {
			kind: QueryKind::Simple,
			sub_queries: vec![query.to_string()],
			metadata: QueryMetadata::default(),
		}
	}
}

pub struct QueryDecomposer {
	extractor: MetadataExtractor,
	compare_word: Regex,
	plural_reference: Regex,
}
impl QueryDecomposer {
	pub fn new(vocabulary: Vocabulary) -> Result<Self> {
		let noun = regex::escape(vocabulary.category_noun());
		let plural_reference =
			Regex::new(&format!(r"(?i)\b(?:all\s+)?(?:all|both|two|three)\s+{noun}s?\b"))?;

		Ok(Self {
			extractor: MetadataExtractor::new(vocabulary)?,
			compare_word: Regex::new(r"(?i)\bcompare\b")?,
			plural_reference,
		})
	}

	pub fn extractor(&self) -> &MetadataExtractor {
		&self.extractor
	}

	/// Comparison keywords win over trend keywords.
	pub fn classify(&self, query: &str) -> QueryKind {
		let query_lower = query.to_lowercase();

		if COMPARISON_KEYWORDS.iter().any(|keyword| query_lower.contains(keyword)) {
			QueryKind::Comparison
		} else if TREND_KEYWORDS.iter().any(|keyword| query_lower.contains(keyword)) {
			QueryKind::Trend
		} else {
			QueryKind::Simple
		}
	}

	pub fn decompose(&self, query: &str) -> Decomposition {
		let metadata = self.extractor.extract(query);
		let kind = self.classify(query);
		let sub_queries = match kind {
			QueryKind::Comparison if metadata.categories.len() >= 2 => metadata
				.categories
				.iter()
				.map(|category| self.rewrite_for(query, category))
				.collect(),
			// Trend queries keep the extracted metadata as is. Without a period filter the
			// retrieval spans every period.
			QueryKind::Comparison | QueryKind::Trend | QueryKind::Simple => {
				vec![query.to_string()]
			},
		};

		Decomposition { kind, sub_queries, metadata }
	}

	pub fn rewrite_for(&self, query: &str, category: &str) -> String {
		let lead = format!("What is {category}'s");
		let rewritten = self.compare_word.replace_all(query, NoExpand(&lead));

		self.plural_reference.replace_all(&rewritten, NoExpand(category)).into_owned()
	}
}
