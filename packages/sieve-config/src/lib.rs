mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, EmbeddingProviderConfig, LlmProviderConfig, Pipeline, ProviderConfig,
	Providers, Qdrant, Service, Storage, Vocabulary,
};

use std::{fs, path::Path};

pub const MAX_FEATURE_LEVEL: u8 = 4;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.pipeline.feature_level > MAX_FEATURE_LEVEL {
		return Err(Error::Validation {
			message: format!("pipeline.feature_level must be in the range 0-{MAX_FEATURE_LEVEL}."),
		});
	}
	if !cfg.pipeline.alpha.is_finite() {
		return Err(Error::Validation {
			message: "pipeline.alpha must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.pipeline.alpha) {
		return Err(Error::Validation {
			message: "pipeline.alpha must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.pipeline.default_top_k == 0 {
		return Err(Error::Validation {
			message: "pipeline.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.pipeline.max_top_k == 0 {
		return Err(Error::Validation {
			message: "pipeline.max_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.pipeline.default_top_k > cfg.pipeline.max_top_k {
		return Err(Error::Validation {
			message: "pipeline.default_top_k must not exceed pipeline.max_top_k.".to_string(),
		});
	}
	if cfg.pipeline.rerank_max_chars == 0 {
		return Err(Error::Validation {
			message: "pipeline.rerank_max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.pipeline.compression_max_chars == 0 {
		return Err(Error::Validation {
			message: "pipeline.compression_max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.vocabulary.categories.is_empty() {
		return Err(Error::Validation {
			message: "vocabulary.categories must be non-empty.".to_string(),
		});
	}
	if cfg.vocabulary.categories.iter().any(|category| category.trim().is_empty()) {
		return Err(Error::Validation {
			message: "vocabulary.categories must not contain blank labels.".to_string(),
		});
	}
	if cfg.vocabulary.category_noun.trim().is_empty() {
		return Err(Error::Validation {
			message: "vocabulary.category_noun must be non-empty.".to_string(),
		});
	}
	if cfg.vocabulary.year_min > cfg.vocabulary.year_max {
		return Err(Error::Validation {
			message: "vocabulary.year_min must be less than or equal to vocabulary.year_max."
				.to_string(),
		});
	}
	if !(1_000..=9_999).contains(&cfg.vocabulary.year_min)
		|| !(1_000..=9_999).contains(&cfg.vocabulary.year_max)
	{
		return Err(Error::Validation {
			message: "vocabulary year bounds must be four-digit years.".to_string(),
		});
	}
	if cfg.cache.enabled && cfg.cache.max_entries == 0 {
		return Err(Error::Validation {
			message: "cache.max_entries must be greater than zero when enabled.".to_string(),
		});
	}

	let mut keys = vec![
		("embedding", &cfg.providers.embedding.api_key),
		("llm", &cfg.providers.llm.api_key),
	];

	if let Some(rerank) = cfg.providers.rerank.as_ref() {
		keys.push(("rerank", &rerank.api_key));
	}

	for (label, key) in keys {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.providers
		.rerank
		.as_ref()
		.map(|rerank| rerank.api_base.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.providers.rerank = None;
	}

	for category in &mut cfg.vocabulary.categories {
		let trimmed = category.trim();

		if trimmed.len() != category.len() {
			*category = trimmed.to_string();
		}
	}

	let mut seen = Vec::<String>::new();

	cfg.vocabulary.categories.retain(|category| {
		let key = category.to_lowercase();

		if seen.contains(&key) {
			return false;
		}

		seen.push(key);

		true
	});
	cfg.vocabulary.category_noun = cfg.vocabulary.category_noun.trim().to_lowercase();
}
