use std::ops::RangeInclusive;

use crate::{Error, Result};

/// Matching vocabulary for metadata extraction and comparison rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
	categories: Vec<String>,
	category_noun: String,
	years: RangeInclusive<u16>,
}
impl Vocabulary {
	pub fn new(
		categories: Vec<String>,
		category_noun: impl Into<String>,
		years: RangeInclusive<u16>,
	) -> Result<Self> {
		let category_noun = category_noun.into().trim().to_lowercase();

		if categories.iter().any(|category| category.trim().is_empty()) {
			return Err(Error::InvalidVocabulary {
				message: "Category labels must be non-empty.".to_string(),
			});
		}
		if category_noun.is_empty() || category_noun.chars().any(char::is_whitespace) {
			return Err(Error::InvalidVocabulary {
				message: "Category noun must be a single word.".to_string(),
			});
		}
		if years.start() > years.end() {
			return Err(Error::InvalidVocabulary {
				message: "Year range must not be empty.".to_string(),
			});
		}

		Ok(Self { categories, category_noun, years })
	}

	pub fn from_config(cfg: &sieve_config::Vocabulary) -> Result<Self> {
		Self::new(cfg.categories.clone(), cfg.category_noun.as_str(), cfg.year_min..=cfg.year_max)
	}

	pub fn categories(&self) -> &[String] {
		&self.categories
	}

	pub fn category_noun(&self) -> &str {
		&self.category_noun
	}

	pub fn accepts_year(&self, year: u16) -> bool {
		self.years.contains(&year)
	}
}
