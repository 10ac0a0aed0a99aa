use std::sync::{
	Mutex,
	atomic::{AtomicUsize, Ordering},
};

use color_eyre::{Result, eyre};

use sieve_config::{EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use sieve_service::{
	BoxFuture, EmbeddingProvider, GenerationProvider, RerankProvider, compress::NO_RELEVANT_INFO,
};

type Respond = dyn Fn(PromptKind, &str) -> Result<String> + Send + Sync;

/// Constant vectors of the configured width.
#[derive(Default)]
pub struct StubEmbedding {
	calls: AtomicUsize,
}
impl StubEmbedding {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of texts embedded so far.
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for StubEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(texts.len(), Ordering::SeqCst);

		let dim = (cfg.dimensions as usize).max(1);
		let vec = vec![0.1; dim];

		Box::pin(async move { Ok(vec![vec; texts.len()]) })
	}
}

enum RerankMode {
	ContentLength,
	MissingScores,
	Fail(String),
}

pub struct StubRerank {
	mode: RerankMode,
	calls: AtomicUsize,
}
impl StubRerank {
	/// Scores each document by its length in characters.
	pub fn content_length() -> Self {
		Self { mode: RerankMode::ContentLength, calls: AtomicUsize::new(0) }
	}

	/// Returns one score fewer than the number of documents.
	pub fn missing_scores() -> Self {
		Self { mode: RerankMode::MissingScores, calls: AtomicUsize::new(0) }
	}

	pub fn failing(message: &str) -> Self {
		Self { mode: RerankMode::Fail(message.to_string()), calls: AtomicUsize::new(0) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl RerankProvider for StubRerank {
	fn rerank<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let result = match &self.mode {
			RerankMode::ContentLength => {
				Ok(docs.iter().map(|doc| doc.chars().count() as f32).collect())
			},
			RerankMode::MissingScores => Ok(vec![1.0; docs.len().saturating_sub(1)]),
			RerankMode::Fail(message) => Err(eyre::eyre!("{message}")),
		};

		Box::pin(async move { result })
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
	Expansion,
	Compression,
	Answer,
}
impl PromptKind {
	pub fn detect(prompt: &str) -> Self {
		if prompt.contains("Relevant Information:") {
			Self::Compression
		} else if prompt.contains("The user asked:") {
			Self::Expansion
		} else {
			Self::Answer
		}
	}
}

/// Scripted generation model. Every prompt is recorded with its detected kind.
pub struct StubGenerator {
	respond: Box<Respond>,
	prompts: Mutex<Vec<(PromptKind, String)>>,
}
impl StubGenerator {
	pub fn new<F>(respond: F) -> Self
	where
		F: Fn(PromptKind, &str) -> Result<String> + Send + Sync + 'static,
	{
		Self { respond: Box::new(respond), prompts: Mutex::new(Vec::new()) }
	}

	/// Answers with `answer`, finds nothing to compress and leaves queries unexpanded.
	pub fn answering(answer: &str) -> Self {
		let answer = answer.to_string();

		Self::new(move |kind, _| match kind {
			PromptKind::Answer => Ok(answer.clone()),
			PromptKind::Compression => Ok(NO_RELEVANT_INFO.to_string()),
			PromptKind::Expansion => Ok(String::new()),
		})
	}

	pub fn failing(message: &str) -> Self {
		let message = message.to_string();

		Self::new(move |_, _| Err(eyre::eyre!("{message}")))
	}

	pub fn prompts(&self) -> Vec<(PromptKind, String)> {
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn count(&self, kind: PromptKind) -> usize {
		self.prompts().iter().filter(|(recorded, _)| *recorded == kind).count()
	}
}
impl GenerationProvider for StubGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		_max_tokens: u32,
		_temperature: f32,
	) -> BoxFuture<'a, Result<String>> {
		let kind = PromptKind::detect(prompt);

		self.prompts
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.push((kind, prompt.to_string()));

		let result = (self.respond)(kind, prompt);

		Box::pin(async move { result })
	}
}
