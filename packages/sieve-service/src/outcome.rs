use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Result of one collaborator call inside the pipeline. Failures are values, not errors, so that a
/// degraded stage never aborts the request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
	Success(T),
	Empty,
	Failed { message: String },
}
impl<T> Outcome<T> {
	pub fn failed(err: impl Display) -> Self {
		Self::Failed { message: err.to_string() }
	}

	pub fn is_failed(&self) -> bool {
		matches!(self, Self::Failed { .. })
	}

	pub fn error(&self) -> Option<&str> {
		match self {
			Self::Failed { message } => Some(message),
			Self::Success(_) | Self::Empty => None,
		}
	}

	pub fn success(self) -> Option<T> {
		match self {
			Self::Success(value) => Some(value),
			Self::Empty | Self::Failed { .. } => None,
		}
	}
}
impl<T> Outcome<Vec<T>> {
	pub fn from_items(items: Vec<T>) -> Self {
		if items.is_empty() { Self::Empty } else { Self::Success(items) }
	}

	/// Collapses `Empty` and `Failed` to the neutral empty list.
	pub fn into_items(self) -> Vec<T> {
		self.success().unwrap_or_default()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	Expansion,
	DenseRetrieval,
	SparseRetrieval,
	Rerank,
	Compression,
	Generation,
}
impl Stage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Expansion => "expansion",
			Self::DenseRetrieval => "dense_retrieval",
			Self::SparseRetrieval => "sparse_retrieval",
			Self::Rerank => "rerank",
			Self::Compression => "compression",
			Self::Generation => "generation",
		}
	}
}

/// A stage that ran degraded during one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageIssue {
	pub stage: Stage,
	pub message: String,
}
impl StageIssue {
	pub fn new(stage: Stage, message: impl Into<String>) -> Self {
		Self { stage, message: message.into() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_lists_become_empty_outcomes() {
		assert_eq!(Outcome::<Vec<u8>>::from_items(Vec::new()), Outcome::Empty);
		assert_eq!(Outcome::from_items(vec![1]), Outcome::Success(vec![1]));
	}

	#[test]
	fn failures_collapse_to_neutral_items() {
		let outcome: Outcome<Vec<u8>> = Outcome::failed("connection refused");

		assert!(outcome.is_failed());
		assert_eq!(outcome.error(), Some("connection refused"));
		assert!(outcome.into_items().is_empty());
	}

	#[test]
	fn stage_names_match_serialized_form() {
		let json = serde_json::to_value(Stage::SparseRetrieval).expect("Serialize failed.");

		assert_eq!(json, Stage::SparseRetrieval.as_str());
	}
}
