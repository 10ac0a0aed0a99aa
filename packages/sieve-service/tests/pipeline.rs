use std::{collections::HashSet, sync::Arc};

use sieve_config::Config;
use sieve_service::{
	Error, Pipeline, Provenance, Providers, QueryRequest, SearchIndex, Stage, candidate::Candidate,
};
use sieve_storage::models::{CATEGORY_FIELD, FieldClause};
use sieve_testkit::{
	FailingIndex, MemoryIndex, Passage, PromptKind, StubEmbedding, StubGenerator, StubRerank,
	config_at_level, test_config,
};

const ANSWER: &str = "Kaspi Bank reported the higher net profit.";

fn bank_passages() -> Vec<Passage> {
	vec![
		Passage::new(
			"Kaspi Bank",
			"Q4",
			2024,
			"financial_statement",
			"Kaspi Bank Q4 2024 net profit was 150 billion KZT.",
		)
		.with_similarity(0.9)
		.with_relevance(8.0),
		Passage::new(
			"Halyk Bank",
			"Q4",
			2024,
			"financial_statement",
			"Halyk Bank Q4 2024 net profit was 120 billion KZT.",
		)
		.with_similarity(0.8)
		.with_relevance(6.0),
		Passage::new("ForteBank", "Q4", 2024, "press_release", "ForteBank opened new branches.")
			.with_similarity(0.95)
			.with_relevance(9.0),
		Passage::new(
			"Kaspi Bank",
			"Q3",
			2024,
			"financial_statement",
			"Kaspi Bank Q3 2024 net profit was 140 billion KZT.",
		)
		.with_similarity(0.7)
		.with_relevance(2.0),
	]
}

fn build(
	cfg: Config,
	index: Arc<dyn SearchIndex>,
	rerank: Arc<StubRerank>,
	generator: Arc<StubGenerator>,
) -> Pipeline {
	let providers = Providers::new(Arc::new(StubEmbedding::new()), rerank, generator);

	Pipeline::new(cfg, index, providers).expect("Pipeline must build.")
}

fn request(query: &str, top_k: u32) -> QueryRequest {
	QueryRequest { query: query.to_string(), expand: false, top_k: Some(top_k) }
}

fn assert_unique_keys(sources: &[Candidate]) {
	let keys: HashSet<_> = sources.iter().map(Candidate::identity_key).collect();

	assert_eq!(keys.len(), sources.len(), "Sources must not repeat a passage.");
}

#[tokio::test]
async fn comparison_query_retrieves_per_category_with_metadata_filter() {
	let index = Arc::new(MemoryIndex::new(bank_passages()));
	let pipeline = build(
		test_config(),
		index.clone(),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = pipeline
		.query(request("Compare Kaspi Bank and Halyk Bank for period Q4 2024", 3))
		.await
		.expect("Query must succeed.");

	assert_eq!(result.sub_queries.len(), 2);
	assert_eq!(result.metadata.categories, vec!["Halyk Bank", "Kaspi Bank"]);
	assert_eq!(result.metadata.periods, vec!["Q4"]);
	assert_eq!(result.metadata.years, vec![2024]);
	assert_eq!(result.answer, ANSWER);
	assert_eq!(result.num_sources, 3);
	assert_eq!(result.sources.len(), result.num_sources);
	assert!(result.issues.is_empty(), "{:?}", result.issues);
	assert_unique_keys(&result.sources);

	let vector_calls = index.vector_calls();

	assert_eq!(vector_calls.len(), 2);

	for (limit, filter) in vector_calls {
		let filter = filter.expect("Dense retrieval must be filtered.");

		assert_eq!(limit, 12);
		assert_eq!(
			filter.all_of[0],
			FieldClause::Keyword {
				field: CATEGORY_FIELD.to_string(),
				any_of: vec!["Halyk Bank".to_string(), "Kaspi Bank".to_string()],
			}
		);
	}

	let lexical_calls = index.lexical_calls();

	assert_eq!(lexical_calls.len(), 2);
	assert!(lexical_calls.iter().all(|(_, limit)| *limit == 12));
}

#[tokio::test]
async fn sparse_retrieval_ignores_the_metadata_filter() {
	let index = Arc::new(MemoryIndex::new(bank_passages()));
	let pipeline = build(
		config_at_level(3),
		index,
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = pipeline
		.query(request("What was Kaspi Bank's net profit in Q4 2024?", 5))
		.await
		.expect("Query must succeed.");
	let categories: HashSet<_> =
		result.sources.iter().filter_map(|source| source.category.as_deref()).collect();

	assert_eq!(result.num_sources, 4);
	assert!(categories.contains("ForteBank"));

	let kaspi_q4 = result
		.sources
		.iter()
		.find(|source| {
			source.category.as_deref() == Some("Kaspi Bank") && source.period.as_deref() == Some("Q4")
		})
		.expect("Filtered dense hit must survive.");

	assert_eq!(kaspi_q4.provenance, Provenance::Hybrid);
	assert!(
		result
			.sources
			.iter()
			.filter(|source| source.category.as_deref() != Some("Kaspi Bank"))
			.all(|source| source.provenance == Provenance::Sparse)
	);
}

#[tokio::test]
async fn empty_index_returns_no_sources_and_still_answers() {
	let generator = Arc::new(StubGenerator::answering(ANSWER));
	let pipeline = build(
		test_config(),
		Arc::new(MemoryIndex::empty()),
		Arc::new(StubRerank::content_length()),
		generator.clone(),
	);
	let result = pipeline
		.query(request("What was ForteBank's ROE in 2023?", 5))
		.await
		.expect("Query must succeed.");

	assert_eq!(result.num_sources, 0);
	assert_eq!(result.context_length, 0);
	assert_eq!(result.answer, ANSWER);
	assert!(result.issues.is_empty());
	assert_eq!(generator.count(PromptKind::Answer), 1);
	assert_eq!(generator.count(PromptKind::Compression), 0);
}

#[tokio::test]
async fn unavailable_index_degrades_to_an_empty_envelope() {
	let pipeline = build(
		test_config(),
		Arc::new(FailingIndex),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result =
		pipeline.query(request("Halyk Bank assets", 5)).await.expect("Query must succeed.");
	let stages: Vec<Stage> = result.issues.iter().map(|issue| issue.stage).collect();

	assert_eq!(result.num_sources, 0);
	assert_eq!(result.answer, ANSWER);
	assert!(stages.contains(&Stage::DenseRetrieval));
	assert!(stages.contains(&Stage::SparseRetrieval));
}

#[tokio::test]
async fn rerank_orders_sources_by_stub_score() {
	let passages = vec![
		Passage::new("Kaspi Bank", "Q1", 2024, "report", "short").with_similarity(0.9),
		Passage::new("Kaspi Bank", "Q2", 2024, "report", "a considerably longer passage text")
			.with_similarity(0.8),
		Passage::new("Kaspi Bank", "Q3", 2024, "report", "medium length one").with_similarity(0.7),
	];
	let pipeline = build(
		config_at_level(2),
		Arc::new(MemoryIndex::new(passages)),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = pipeline.query(request("Kaspi Bank", 3)).await.expect("Query must succeed.");
	let lengths: Vec<usize> =
		result.sources.iter().map(|source| source.content.chars().count()).collect();

	assert_eq!(lengths, vec![34, 17, 5]);
	assert!(result.sources.iter().all(|source| source.rerank_score.is_some()));
}

#[tokio::test]
async fn rerank_failure_falls_back_to_fused_order() {
	let pipeline = build(
		config_at_level(2),
		Arc::new(MemoryIndex::new(bank_passages())),
		Arc::new(StubRerank::failing("rerank endpoint timed out")),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = pipeline.query(request("net profit", 2)).await.expect("Query must succeed.");

	assert_eq!(result.num_sources, 2);
	assert_eq!(result.sources[0].category.as_deref(), Some("ForteBank"));
	assert!(result.sources.iter().all(|source| source.rerank_score.is_none()));
	assert_eq!(result.issues.len(), 1);
	assert_eq!(result.issues[0].stage, Stage::Rerank);
	assert!(result.issues[0].message.contains("timed out"));
}

#[tokio::test]
async fn rerank_score_count_mismatch_is_a_failure() {
	let pipeline = build(
		config_at_level(2),
		Arc::new(MemoryIndex::new(bank_passages())),
		Arc::new(StubRerank::missing_scores()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = pipeline.query(request("net profit", 2)).await.expect("Query must succeed.");

	assert_eq!(result.num_sources, 2);
	assert!(result.issues.iter().any(|issue| issue.stage == Stage::Rerank));
}

#[tokio::test]
async fn missing_rerank_provider_passes_candidates_through() {
	let mut cfg = config_at_level(2);

	cfg.providers.rerank = None;

	let rerank = Arc::new(StubRerank::content_length());
	let pipeline = build(
		cfg,
		Arc::new(MemoryIndex::new(bank_passages())),
		rerank.clone(),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = pipeline.query(request("net profit", 2)).await.expect("Query must succeed.");

	assert!(!pipeline.rerank_enabled());
	assert_eq!(rerank.calls(), 0);
	assert_eq!(result.num_sources, 2);
	assert!(result.issues.is_empty());
}

#[tokio::test]
async fn baseline_level_uses_dense_retrieval_only() {
	let index = Arc::new(MemoryIndex::new(bank_passages()));
	let rerank = Arc::new(StubRerank::content_length());
	let pipeline = build(
		config_at_level(0),
		index.clone(),
		rerank.clone(),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = pipeline
		.query(request("What was Kaspi Bank's net profit in Q4 2024?", 2))
		.await
		.expect("Query must succeed.");

	assert_eq!(index.vector_calls(), vec![(4, None)]);
	assert!(index.lexical_calls().is_empty());
	assert_eq!(rerank.calls(), 0);
	assert_eq!(result.num_sources, 2);
	assert_eq!(result.sources[0].category.as_deref(), Some("ForteBank"));
	assert!(result.sources.iter().all(|source| source.provenance == Provenance::Dense));
	assert!(result.sources.iter().all(|source| source.hybrid_score.is_none()));
	assert!(result.metadata.is_unconstrained());
}

#[tokio::test]
async fn hybrid_level_fetches_twice_the_stage_cap_without_filter() {
	let index = Arc::new(MemoryIndex::new(bank_passages()));
	let pipeline = build(
		config_at_level(1),
		index.clone(),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let query = "What was Kaspi Bank's net profit in Q4 2024?";
	let result = pipeline.query(request(query, 2)).await.expect("Query must succeed.");

	assert_eq!(index.vector_calls(), vec![(8, None)]);
	assert_eq!(index.lexical_calls(), vec![(query.to_string(), 8)]);
	assert_eq!(result.sub_queries, vec![query.to_string()]);
	assert!(result.sources.iter().all(|source| source.hybrid_score.is_some()));
}

#[tokio::test]
async fn compression_replaces_content_and_keeps_count() {
	let extract = "Net profit was 150 billion KZT in Q4 2024.";
	let generator = Arc::new(StubGenerator::new(move |kind, _| match kind {
		PromptKind::Compression => Ok(extract.to_string()),
		PromptKind::Answer | PromptKind::Expansion => Ok(ANSWER.to_string()),
	}));
	let pipeline = build(
		test_config(),
		Arc::new(MemoryIndex::new(bank_passages())),
		Arc::new(StubRerank::content_length()),
		generator.clone(),
	);
	let result = pipeline.query(request("net profit", 3)).await.expect("Query must succeed.");

	assert_eq!(result.num_sources, 3);
	assert_eq!(generator.count(PromptKind::Compression), 3);

	for source in &result.sources {
		assert_eq!(source.content, extract);
		assert!(source.original_content.as_deref().is_some_and(|original| original != extract));
	}
}

#[tokio::test]
async fn failed_compression_keeps_candidates_and_reports_generation_error() {
	let pipeline = build(
		test_config(),
		Arc::new(MemoryIndex::new(bank_passages())),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::failing("model overloaded")),
	);
	let result = pipeline.query(request("net profit", 3)).await.expect("Query must succeed.");

	assert_eq!(result.num_sources, 3);
	assert!(result.sources.iter().all(|source| !source.is_compressed()));
	assert_eq!(result.answer, "Error generating answer: model overloaded");
	assert_eq!(
		result.issues.iter().filter(|issue| issue.stage == Stage::Compression).count(),
		3
	);
	assert!(result.issues.iter().any(|issue| issue.stage == Stage::Generation));
}

#[tokio::test]
async fn passages_without_relevant_extract_keep_full_content() {
	let generator = Arc::new(StubGenerator::answering(ANSWER));
	let pipeline = build(
		test_config(),
		Arc::new(MemoryIndex::new(bank_passages())),
		Arc::new(StubRerank::content_length()),
		generator.clone(),
	);
	let result = pipeline.query(request("net profit", 3)).await.expect("Query must succeed.");
	let stored: HashSet<String> =
		bank_passages().into_iter().filter_map(|passage| passage.record.content).collect();

	assert_eq!(result.num_sources, 3);
	assert_eq!(generator.count(PromptKind::Compression), 3);
	assert!(result.issues.is_empty(), "{:?}", result.issues);

	for source in &result.sources {
		assert!(stored.contains(&source.content), "{} must be untouched", source.content);
		assert_eq!(source.original_content, None);
		assert!(!source.is_compressed());
	}
}

#[tokio::test]
async fn expansion_rewrites_the_search_query_only() {
	let expanded = "Kaspi Bank net profit, net income and earnings for Q4 2024";
	let generator = Arc::new(StubGenerator::new(move |kind, _| match kind {
		PromptKind::Expansion => Ok(format!("  {expanded}\n")),
		PromptKind::Compression => Ok("NO_RELEVANT_INFO".to_string()),
		PromptKind::Answer => Ok(ANSWER.to_string()),
	}));
	let index = Arc::new(MemoryIndex::new(bank_passages()));
	let pipeline = build(
		config_at_level(1),
		index.clone(),
		Arc::new(StubRerank::content_length()),
		generator.clone(),
	);
	let result = pipeline
		.query(QueryRequest {
			query: "Kaspi profit Q4?".to_string(),
			expand: true,
			top_k: Some(2),
		})
		.await
		.expect("Query must succeed.");

	assert_eq!(result.original_query, "Kaspi profit Q4?");
	assert_eq!(result.expanded_query, expanded);
	assert_eq!(index.lexical_calls()[0].0, expanded);

	let prompts = generator.prompts();
	let (_, answer_prompt) = prompts
		.iter()
		.find(|(kind, _)| *kind == PromptKind::Answer)
		.expect("Answer prompt expected.");

	assert!(answer_prompt.contains("User Question: Kaspi profit Q4?"));
}

#[tokio::test]
async fn failed_expansion_keeps_the_original_query() {
	let generator = Arc::new(StubGenerator::new(|kind, _| match kind {
		PromptKind::Expansion => Err(color_eyre::eyre::eyre!("expansion unavailable")),
		PromptKind::Compression | PromptKind::Answer => Ok(ANSWER.to_string()),
	}));
	let pipeline = build(
		config_at_level(1),
		Arc::new(MemoryIndex::new(bank_passages())),
		Arc::new(StubRerank::content_length()),
		generator,
	);
	let result = pipeline
		.query(QueryRequest { query: "ROE 2024".to_string(), expand: true, top_k: None })
		.await
		.expect("Query must succeed.");

	assert_eq!(result.expanded_query, "ROE 2024");
	assert_eq!(result.issues.len(), 1);
	assert_eq!(result.issues[0].stage, Stage::Expansion);
}

#[tokio::test]
async fn blank_query_is_rejected() {
	let pipeline = build(
		test_config(),
		Arc::new(MemoryIndex::empty()),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let err = pipeline.query(request("  \n\t", 3)).await.expect_err("Blank query must fail.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn top_k_defaults_and_clamps() {
	let pipeline = build(
		config_at_level(1),
		Arc::new(MemoryIndex::new(bank_passages())),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let clamped = pipeline.query(request("net profit", 0)).await.expect("Query must succeed.");

	assert_eq!(clamped.num_sources, 1);

	let defaulted = pipeline
		.query(QueryRequest { query: "net profit".to_string(), expand: false, top_k: None })
		.await
		.expect("Query must succeed.");

	assert_eq!(defaulted.num_sources, 4);
}

#[tokio::test]
async fn oversized_top_k_is_capped_before_retrieval() {
	let mut cfg = config_at_level(1);

	cfg.pipeline.default_top_k = 2;
	cfg.pipeline.max_top_k = 3;

	let index = Arc::new(MemoryIndex::new(bank_passages()));
	let pipeline = build(
		cfg,
		index.clone(),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = pipeline.query(request("net profit", u32::MAX)).await.expect("Query must succeed.");

	assert_eq!(result.num_sources, 3);
	assert_eq!(index.vector_calls(), vec![(12, None)]);
	assert_eq!(index.lexical_calls(), vec![("net profit".to_string(), 12)]);
}

#[tokio::test]
async fn repeated_queries_reuse_cached_embeddings() {
	let embedding = Arc::new(StubEmbedding::new());
	let providers = Providers::new(
		embedding.clone(),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let pipeline =
		Pipeline::new(config_at_level(1), Arc::new(MemoryIndex::new(bank_passages())), providers)
			.expect("Pipeline must build.");

	for _ in 0..3 {
		pipeline.query(request("Halyk Bank deposits", 2)).await.expect("Query must succeed.");
	}

	assert_eq!(embedding.calls(), 1);
}

#[test]
fn invalid_configuration_is_rejected() {
	let mut cfg = test_config();

	cfg.pipeline.alpha = 1.5;

	let providers = Providers::new(
		Arc::new(StubEmbedding::new()),
		Arc::new(StubRerank::content_length()),
		Arc::new(StubGenerator::answering(ANSWER)),
	);
	let result = Pipeline::new(cfg, Arc::new(MemoryIndex::empty()), providers);

	assert!(matches!(result, Err(Error::Config { .. })));
}
