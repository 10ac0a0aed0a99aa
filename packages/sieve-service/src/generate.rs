use std::sync::Arc;

use sieve_config::LlmProviderConfig;

use crate::{GenerationProvider, Outcome, candidate::Candidate};

pub const EXPANSION_MAX_TOKENS: u32 = 200;
pub const EXPANSION_TEMPERATURE: f32 = 0.3;
pub const ANSWER_MAX_TOKENS: u32 = 1_500;
pub const ANSWER_TEMPERATURE: f32 = 0.1;

const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Query rephrasing and grounded answer synthesis over one generation endpoint.
pub struct Generator {
	generation: Arc<dyn GenerationProvider>,
	cfg: LlmProviderConfig,
}
impl Generator {
	pub fn new(generation: Arc<dyn GenerationProvider>, cfg: LlmProviderConfig) -> Self {
		Self { generation, cfg }
	}

	pub fn model(&self) -> &str {
		&self.cfg.model
	}

	pub async fn expand(&self, query: &str) -> Outcome<String> {
		let prompt = build_expansion_prompt(query);

		self.complete(&prompt, EXPANSION_MAX_TOKENS, EXPANSION_TEMPERATURE).await
	}

	pub async fn answer(&self, query: &str, context: &str) -> Outcome<String> {
		let prompt = build_answer_prompt(query, context);

		self.complete(&prompt, ANSWER_MAX_TOKENS, ANSWER_TEMPERATURE).await
	}

	async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Outcome<String> {
		match self.generation.generate(&self.cfg, prompt, max_tokens, temperature).await {
			Ok(text) if text.trim().is_empty() => Outcome::Empty,
			Ok(text) => Outcome::Success(text.trim().to_string()),
			Err(err) => Outcome::failed(err),
		}
	}
}

/// Numbered source blocks, one per candidate, in ranking order.
pub fn build_context(candidates: &[Candidate]) -> String {
	candidates
		.iter()
		.enumerate()
		.map(|(idx, candidate)| {
			format!("Document {} ({}):\n{}\n", idx + 1, candidate.source_label(), candidate.content)
		})
		.collect::<Vec<_>>()
		.join(CONTEXT_SEPARATOR)
}

pub fn build_expansion_prompt(query: &str) -> String {
	format!(
		"You are an expert in financial analysis and information retrieval.\n\
		 The user asked: \"{query}\"\n\n\
		 Rephrase this question to be more detailed and specific, suitable for searching a \
		 database of financial reports. Include relevant terminology and clarify which metrics \
		 or facts the user is looking for.\n\
		 Return only the rephrased query, without any additional explanation."
	)
}

pub fn build_answer_prompt(query: &str, context: &str) -> String {
	format!(
		"You are an analyst assistant. Answer questions about the indexed reports based ONLY on \
		 the provided context.\n\n\
		 Context (Retrieved Reports):\n{context}\n\n\
		 User Question: {query}\n\n\
		 Instructions:\n\
		 1. Answer using ONLY information from the provided documents\n\
		 2. When numbers or metrics are asked for, give exact values with units\n\
		 3. When comparing entities, present the data in a clear, structured format\n\
		 4. Cite the source (category, period, report type) for each piece of information\n\
		 5. If the information is not in the provided documents, say \"The provided documents do \
		 not contain this information\"\n\
		 6. Be concise but comprehensive\n\n\
		 Answer:"
	)
}
