use std::{
	collections::{HashMap, VecDeque},
	sync::Mutex,
};

use sieve_config::EmbeddingProviderConfig;

use crate::{Error, Result};

const EMBEDDING_CACHE_SCHEMA_VERSION: i32 = 1;

/// Bounded in-memory store of query embeddings with first-in first-out eviction.
pub struct EmbeddingCache {
	enabled: bool,
	max_entries: usize,
	entries: Mutex<CacheEntries>,
}
impl EmbeddingCache {
	pub fn new(cfg: &sieve_config::Cache) -> Self {
		Self {
			enabled: cfg.enabled && cfg.max_entries > 0,
			max_entries: cfg.max_entries as usize,
			entries: Mutex::new(CacheEntries::default()),
		}
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	pub fn get(&self, key: &str) -> Option<Vec<f32>> {
		if !self.enabled {
			return None;
		}

		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.vectors.get(key).cloned()
	}

	pub fn insert(&self, key: String, vector: Vec<f32>) {
		if !self.enabled {
			return;
		}

		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		if entries.vectors.insert(key.clone(), vector).is_some() {
			return;
		}

		entries.order.push_back(key);

		while entries.order.len() > self.max_entries {
			let Some(evicted) = entries.order.pop_front() else {
				break;
			};

			entries.vectors.remove(&evicted);
		}
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).vectors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Default)]
struct CacheEntries {
	vectors: HashMap<String, Vec<f32>>,
	order: VecDeque<String>,
}

pub fn build_embedding_cache_key(cfg: &EmbeddingProviderConfig, text: &str) -> Result<String> {
	let payload = serde_json::json!({
		"kind": "query_embedding",
		"schema_version": EMBEDDING_CACHE_SCHEMA_VERSION,
		"provider_id": cfg.provider_id,
		"model": cfg.model,
		"dimensions": cfg.dimensions,
		"text": text,
	});
	let raw = serde_json::to_vec(&payload).map_err(|err| Error::Provider {
		message: format!("Failed to encode embedding cache key payload: {err}"),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

pub fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}
