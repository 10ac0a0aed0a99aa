use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sieve_config::Config;
use sieve_domain::{Decomposition, QueryDecomposer, QueryKind, QueryMetadata, Vocabulary};

use crate::{
	Error, Providers, Result, SearchIndex, Stage, StageIssue,
	cache::EmbeddingCache,
	candidate::Candidate,
	compress::Compressor,
	fusion,
	generate::{self, Generator},
	outcome::Outcome,
	rerank::Reranker,
	retrieve::{DenseRetriever, SparseRetriever},
};

/// Cumulative stage switches. Each level enables everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureLevel {
	/// Dense retrieval only.
	Baseline,
	Hybrid,
	Rerank,
	Decomposition,
	Compression,
}
impl FeatureLevel {
	pub fn from_level(level: u8) -> Option<Self> {
		match level {
			0 => Some(Self::Baseline),
			1 => Some(Self::Hybrid),
			2 => Some(Self::Rerank),
			3 => Some(Self::Decomposition),
			4 => Some(Self::Compression),
			_ => None,
		}
	}

	pub fn as_u8(self) -> u8 {
		match self {
			Self::Baseline => 0,
			Self::Hybrid => 1,
			Self::Rerank => 2,
			Self::Decomposition => 3,
			Self::Compression => 4,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
	pub query: String,
	/// Expansion runs unless the caller opts out.
	#[serde(default = "default_expand")]
	pub expand: bool,
	#[serde(default)]
	pub top_k: Option<u32>,
}

/// Wall-clock milliseconds spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTimings {
	pub expansion_ms: f64,
	pub decomposition_ms: f64,
	pub retrieval_ms: f64,
	pub rerank_ms: f64,
	pub compression_ms: f64,
	pub generation_ms: f64,
	pub total_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
	pub query_id: Uuid,
	pub answer: String,
	pub sources: Vec<Candidate>,
	pub num_sources: usize,
	pub context_length: usize,
	pub model: String,
	pub original_query: String,
	pub expanded_query: String,
	pub sub_queries: Vec<String>,
	pub query_kind: QueryKind,
	pub metadata: QueryMetadata,
	pub feature_level: FeatureLevel,
	pub timings: StageTimings,
	pub issues: Vec<StageIssue>,
}

pub struct Pipeline {
	cfg: Config,
	level: FeatureLevel,
	decomposer: QueryDecomposer,
	dense: DenseRetriever,
	sparse: SparseRetriever,
	reranker: Reranker,
	compressor: Compressor,
	generator: Generator,
}
impl Pipeline {
	pub fn new(cfg: Config, index: Arc<dyn SearchIndex>, providers: Providers) -> Result<Self> {
		sieve_config::validate(&cfg)?;

		let level = FeatureLevel::from_level(cfg.pipeline.feature_level).ok_or_else(|| {
			Error::Config {
				message: format!("Unsupported feature level {}.", cfg.pipeline.feature_level),
			}
		})?;
		let decomposer = QueryDecomposer::new(Vocabulary::from_config(&cfg.vocabulary)?)?;
		let dense = DenseRetriever::new(
			index.clone(),
			providers.embedding.clone(),
			cfg.providers.embedding.clone(),
			EmbeddingCache::new(&cfg.cache),
		);
		let sparse = SparseRetriever::new(index);
		let reranker = Reranker::new(
			providers.rerank.clone(),
			cfg.providers.rerank.clone(),
			cfg.pipeline.rerank_max_chars,
		);
		let compressor = Compressor::new(
			providers.generation.clone(),
			cfg.providers.llm.clone(),
			cfg.pipeline.compression_max_chars,
			cfg.pipeline.compression_min_chars,
		);
		let generator = Generator::new(providers.generation, cfg.providers.llm.clone());

		Ok(Self { cfg, level, decomposer, dense, sparse, reranker, compressor, generator })
	}

	pub fn config(&self) -> &Config {
		&self.cfg
	}

	pub fn feature_level(&self) -> FeatureLevel {
		self.level
	}

	pub fn hybrid_enabled(&self) -> bool {
		self.level >= FeatureLevel::Hybrid
	}

	pub fn rerank_enabled(&self) -> bool {
		self.level >= FeatureLevel::Rerank
			&& self.cfg.pipeline.rerank_enabled
			&& self.reranker.is_available()
	}

	pub fn decomposition_enabled(&self) -> bool {
		self.level >= FeatureLevel::Decomposition
	}

	pub fn compression_enabled(&self) -> bool {
		self.level >= FeatureLevel::Compression && self.cfg.pipeline.compression_enabled
	}

	/// Runs every enabled stage in order. Only a blank query is an error; degraded stages are
	/// reported through `PipelineResult::issues`.
	pub async fn query(&self, req: QueryRequest) -> Result<PipelineResult> {
		let original_query = req.query.trim().to_string();

		if original_query.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let started = Instant::now();
		let query_id = Uuid::new_v4();
		let top_k = req
			.top_k
			.unwrap_or(self.cfg.pipeline.default_top_k)
			.min(self.cfg.pipeline.max_top_k)
			.max(1);
		let stage_cap = top_k.saturating_mul(2);
		let mut timings = StageTimings::default();
		let mut issues = Vec::new();

		let stage_started = Instant::now();
		let expanded_query = if req.expand {
			self.expand(&original_query, &mut issues).await
		} else {
			original_query.clone()
		};

		timings.expansion_ms = elapsed_ms(stage_started);

		let stage_started = Instant::now();
		let decomposition = if self.decomposition_enabled() {
			self.decomposer.decompose(&expanded_query)
		} else {
			Decomposition::identity(&expanded_query)
		};

		timings.decomposition_ms = elapsed_ms(stage_started);

		let stage_started = Instant::now();
		let metadata_filter = (self.decomposition_enabled()
			&& !decomposition.metadata.is_unconstrained())
		.then_some(&decomposition.metadata);
		let mut gathered = Vec::new();

		for sub_query in &decomposition.sub_queries {
			let candidates =
				self.retrieve_sub_query(sub_query, stage_cap, metadata_filter, &mut issues).await;

			gathered.extend(candidates);
		}

		let unique = fusion::dedup_by_identity(gathered);

		timings.retrieval_ms = elapsed_ms(stage_started);

		let stage_started = Instant::now();
		let mut ranked = if self.rerank_enabled() {
			self.reranker.rerank(&expanded_query, unique, stage_cap as usize, &mut issues).await
		} else {
			let mut unique = unique;

			unique.truncate(stage_cap as usize);

			unique
		};

		ranked.truncate(top_k as usize);

		timings.rerank_ms = elapsed_ms(stage_started);

		let stage_started = Instant::now();
		let sources = if self.compression_enabled() {
			self.compressor.compress(&expanded_query, ranked, &mut issues).await
		} else {
			ranked
		};

		timings.compression_ms = elapsed_ms(stage_started);

		let stage_started = Instant::now();
		let context = generate::build_context(&sources);
		let answer = match self.generator.answer(&original_query, &context).await {
			Outcome::Success(answer) => answer,
			Outcome::Empty => {
				let message = "Generation returned no text.".to_string();

				issues.push(StageIssue::new(Stage::Generation, message.clone()));

				format!("Error generating answer: {message}")
			},
			Outcome::Failed { message } => {
				tracing::warn!(error = %message, %query_id, "Answer generation failed.");

				issues.push(StageIssue::new(Stage::Generation, message.clone()));

				format!("Error generating answer: {message}")
			},
		};

		timings.generation_ms = elapsed_ms(stage_started);
		timings.total_ms = elapsed_ms(started);

		tracing::info!(
			%query_id,
			feature_level = self.level.as_u8(),
			query_kind = decomposition.kind.as_str(),
			sub_queries = decomposition.sub_queries.len(),
			num_sources = sources.len(),
			issues = issues.len(),
			total_ms = timings.total_ms,
			"Query answered."
		);

		Ok(PipelineResult {
			query_id,
			answer,
			num_sources: sources.len(),
			context_length: context.chars().count(),
			sources,
			model: self.generator.model().to_string(),
			original_query,
			expanded_query,
			sub_queries: decomposition.sub_queries,
			query_kind: decomposition.kind,
			metadata: decomposition.metadata,
			feature_level: self.level,
			timings,
			issues,
		})
	}

	async fn expand(&self, query: &str, issues: &mut Vec<StageIssue>) -> String {
		match self.generator.expand(query).await {
			Outcome::Success(expanded) => expanded,
			Outcome::Empty => query.to_string(),
			Outcome::Failed { message } => {
				tracing::warn!(
					error = %message,
					"Query expansion failed. Using the original query."
				);

				issues.push(StageIssue::new(Stage::Expansion, message));

				query.to_string()
			},
		}
	}

	/// Dense only at the baseline level, otherwise dense and lexical results fused to `cap`.
	async fn retrieve_sub_query(
		&self,
		sub_query: &str,
		cap: u32,
		metadata: Option<&QueryMetadata>,
		issues: &mut Vec<StageIssue>,
	) -> Vec<Candidate> {
		if !self.hybrid_enabled() {
			let mut dense = record_issue(
				self.dense.retrieve(sub_query, cap, metadata).await,
				Stage::DenseRetrieval,
				issues,
			);

			dense.truncate(cap as usize);

			return dense;
		}

		let fetch = cap.saturating_mul(2);
		let dense = record_issue(
			self.dense.retrieve(sub_query, fetch, metadata).await,
			Stage::DenseRetrieval,
			issues,
		);
		let sparse = record_issue(
			self.sparse.retrieve(sub_query, fetch).await,
			Stage::SparseRetrieval,
			issues,
		);

		fusion::fuse(dense, sparse, self.cfg.pipeline.alpha, cap as usize)
	}
}

fn record_issue(
	outcome: Outcome<Vec<Candidate>>,
	stage: Stage,
	issues: &mut Vec<StageIssue>,
) -> Vec<Candidate> {
	if let Outcome::Failed { message } = &outcome {
		issues.push(StageIssue::new(stage, message.clone()));
	}

	outcome.into_items()
}

fn default_expand() -> bool {
	true
}

fn elapsed_ms(started: Instant) -> f64 {
	started.elapsed().as_secs_f64() * 1_000.0
}
