use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Result, Vocabulary};

const PERIOD_WORDS: [(&str, &str); 4] =
	[("first", "Q1"), ("second", "Q2"), ("third", "Q3"), ("fourth", "Q4")];

/// Structured filter extracted from a query. Empty lists mean unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetadata {
	pub categories: Vec<String>,
	pub periods: Vec<String>,
	pub years: Vec<u16>,
}
impl QueryMetadata {
	pub fn is_unconstrained(&self) -> bool {
		self.categories.is_empty() && self.periods.is_empty() && self.years.is_empty()
	}
}

pub struct MetadataExtractor {
	vocabulary: Vocabulary,
	period_code: Regex,
	period_word: Regex,
	year: Regex,
}
impl MetadataExtractor {
	pub fn new(vocabulary: Vocabulary) -> Result<Self> {
		Ok(Self {
			vocabulary,
			period_code: Regex::new(r"(?i)\bQ[1-4]\b")?,
			period_word: Regex::new(r"(?i)\b(first|second|third|fourth)\s+quarter\b")?,
			year: Regex::new(r"\b\d{4}\b")?,
		})
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	/// Never fails. A field without matches stays empty.
	pub fn extract(&self, query: &str) -> QueryMetadata {
		let query_lower = query.to_lowercase();
		let mut metadata = QueryMetadata::default();

		for category in self.vocabulary.categories() {
			if query_lower.contains(&category.to_lowercase()) {
				push_unique(&mut metadata.categories, category.clone());
			}
		}

		for found in self.period_code.find_iter(query) {
			push_unique(&mut metadata.periods, found.as_str().to_uppercase());
		}
		for captures in self.period_word.captures_iter(query) {
			let Some(word) = captures.get(1) else {
				continue;
			};
			let word = word.as_str().to_lowercase();

			if let Some((_, code)) = PERIOD_WORDS.iter().find(|(name, _)| *name == word) {
				push_unique(&mut metadata.periods, (*code).to_string());
			}
		}

		for found in self.year.find_iter(query) {
			let Ok(year) = found.as_str().parse::<u16>() else {
				continue;
			};

			if self.vocabulary.accepts_year(year) {
				push_unique(&mut metadata.years, year);
			}
		}

		metadata
	}
}

fn push_unique<T>(out: &mut Vec<T>, value: T)
where
	T: PartialEq,
{
	if !out.contains(&value) {
		out.push(value);
	}
}
