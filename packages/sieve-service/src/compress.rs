use std::{mem, sync::Arc};

use sieve_config::LlmProviderConfig;

use crate::{GenerationProvider, Outcome, Stage, StageIssue, candidate::Candidate, text};

/// Sentinel the extraction model returns when a passage has nothing relevant.
pub const NO_RELEVANT_INFO: &str = "NO_RELEVANT_INFO";

const COMPRESSION_MAX_TOKENS: u32 = 400;
const COMPRESSION_TEMPERATURE: f32 = 0.0;

/// Replaces each passage with the part relevant to the query. Count and order never change.
pub struct Compressor {
	generation: Arc<dyn GenerationProvider>,
	cfg: LlmProviderConfig,
	max_chars: usize,
	min_chars: usize,
}
impl Compressor {
	pub fn new(
		generation: Arc<dyn GenerationProvider>,
		cfg: LlmProviderConfig,
		max_chars: u32,
		min_chars: u32,
	) -> Self {
		Self { generation, cfg, max_chars: max_chars as usize, min_chars: min_chars as usize }
	}

	pub async fn compress(
		&self,
		query: &str,
		candidates: Vec<Candidate>,
		issues: &mut Vec<StageIssue>,
	) -> Vec<Candidate> {
		let mut compressed = Vec::with_capacity(candidates.len());

		for mut candidate in candidates {
			match self.extract(query, &candidate.content).await {
				Outcome::Success(extract) => {
					candidate.original_content = Some(mem::replace(&mut candidate.content, extract));
				},
				Outcome::Empty => {},
				Outcome::Failed { message } => {
					tracing::warn!(
						error = %message,
						category = candidate.category.as_deref().unwrap_or_default(),
						"Compression failed. Keeping the original passage."
					);

					issues.push(StageIssue::new(Stage::Compression, message));
				},
			}

			compressed.push(candidate);
		}

		compressed
	}

	async fn extract(&self, query: &str, content: &str) -> Outcome<String> {
		let prompt =
			build_compression_prompt(query, text::truncate_graphemes(content, self.max_chars));

		match self
			.generation
			.generate(&self.cfg, &prompt, COMPRESSION_MAX_TOKENS, COMPRESSION_TEMPERATURE)
			.await
		{
			Ok(response) => accept_extract(&response, self.min_chars)
				.map(Outcome::Success)
				.unwrap_or(Outcome::Empty),
			Err(err) => Outcome::failed(err),
		}
	}
}

pub fn build_compression_prompt(query: &str, content: &str) -> String {
	format!(
		"Extract only the information relevant to this query from the document below.\n\n\
		 Query: {query}\n\n\
		 Document Content:\n{content}\n\n\
		 Instructions:\n\
		 1. Extract only facts and figures directly relevant to the query\n\
		 2. Keep specific numbers, percentages and metrics\n\
		 3. Remove introductory text, disclaimers and unrelated information\n\
		 4. Keep the response concise (max 300 words)\n\
		 5. If nothing is relevant, return \"{NO_RELEVANT_INFO}\"\n\n\
		 Relevant Information:"
	)
}

/// `None` keeps the original passage.
pub fn accept_extract(response: &str, min_chars: usize) -> Option<String> {
	let extract = response.trim();

	if extract == NO_RELEVANT_INFO || text::grapheme_len(extract) <= min_chars {
		return None;
	}

	Some(extract.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sentinel_and_short_responses_are_rejected() {
		assert_eq!(accept_extract(" NO_RELEVANT_INFO \n", 20), None);
		assert_eq!(accept_extract("Net profit: 5", 20), None);
		assert_eq!(accept_extract("exactly twenty chars", 20), None);
	}

	#[test]
	fn long_responses_are_trimmed_and_kept() {
		let extract = accept_extract("  Net profit rose to 150.2 billion KZT in Q3 2024.  ", 20);

		assert_eq!(extract.as_deref(), Some("Net profit rose to 150.2 billion KZT in Q3 2024."));
	}

	#[test]
	fn prompt_carries_query_and_content() {
		let prompt = build_compression_prompt("ROE in 2024?", "ROE reached 31%.");

		assert!(prompt.contains("Query: ROE in 2024?"));
		assert!(prompt.contains("Document Content:\nROE reached 31%."));
		assert!(prompt.contains("return \"NO_RELEVANT_INFO\""));
	}
}
