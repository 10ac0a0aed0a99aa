use std::sync::Arc;

use sieve_config::ProviderConfig;

use crate::{Outcome, RerankProvider, Stage, StageIssue, candidate::Candidate, fusion, text};

/// Cross-encoder re-scoring of fused candidates.
pub struct Reranker {
	provider: Arc<dyn RerankProvider>,
	cfg: Option<ProviderConfig>,
	max_chars: usize,
}
impl Reranker {
	pub fn new(
		provider: Arc<dyn RerankProvider>,
		cfg: Option<ProviderConfig>,
		max_chars: u32,
	) -> Self {
		Self { provider, cfg, max_chars: max_chars as usize }
	}

	/// False when no rerank endpoint is configured.
	pub fn is_available(&self) -> bool {
		self.cfg.is_some()
	}

	pub async fn score(&self, query: &str, candidates: &[Candidate]) -> Outcome<Vec<f32>> {
		let Some(cfg) = self.cfg.as_ref() else {
			return Outcome::failed("No rerank provider is configured.");
		};

		if candidates.is_empty() {
			return Outcome::Empty;
		}

		let docs: Vec<String> = candidates
			.iter()
			.map(|candidate| {
				text::truncate_graphemes(&candidate.content, self.max_chars).to_string()
			})
			.collect();

		match self.provider.rerank(cfg, query, &docs).await {
			Ok(scores) if scores.len() == docs.len() => Outcome::Success(scores),
			Ok(scores) => Outcome::failed(format!(
				"Rerank provider returned {} scores for {} documents.",
				scores.len(),
				docs.len()
			)),
			Err(err) => Outcome::failed(err),
		}
	}

	/// Falls back to the incoming order, truncated, when scoring fails.
	pub async fn rerank(
		&self,
		query: &str,
		mut candidates: Vec<Candidate>,
		top_k: usize,
		issues: &mut Vec<StageIssue>,
	) -> Vec<Candidate> {
		match self.score(query, &candidates).await {
			Outcome::Success(scores) => apply_scores(candidates, &scores, top_k),
			Outcome::Empty => candidates,
			Outcome::Failed { message } => {
				tracing::warn!(error = %message, candidates = candidates.len(), "Rerank failed.");

				issues.push(StageIssue::new(Stage::Rerank, message));
				candidates.truncate(top_k);

				candidates
			},
		}
	}
}

/// Stores each score on its candidate, then sorts descending. Equal scores keep input order.
pub fn apply_scores(
	mut candidates: Vec<Candidate>,
	scores: &[f32],
	top_k: usize,
) -> Vec<Candidate> {
	for (candidate, score) in candidates.iter_mut().zip(scores) {
		candidate.rerank_score = Some(*score);
	}

	candidates.sort_by(|left, right| {
		fusion::cmp_f32_desc(left.rerank_score.unwrap_or(0.0), right.rerank_score.unwrap_or(0.0))
	});
	candidates.truncate(top_k);

	candidates
}
