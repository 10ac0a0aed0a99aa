use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub pipeline: Pipeline,
	pub vocabulary: Vocabulary,
	#[serde(default)]
	pub cache: Cache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	#[serde(default = "default_dense_vector")]
	pub dense_vector: String,
	#[serde(default = "default_bm25_vector")]
	pub bm25_vector: String,
	#[serde(default = "default_bm25_model")]
	pub bm25_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	/// Optional. Without it the re-rank stage passes candidates through.
	pub rerank: Option<ProviderConfig>,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Generation endpoint shared by query expansion, compression and answer synthesis. Token limits
/// and temperatures are chosen per call.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pipeline {
	/// 0 dense only, 1 hybrid, 2 re-rank, 3 decomposition, 4 compression.
	pub feature_level: u8,
	/// Weight of the dense signal in the hybrid score.
	pub alpha: f32,
	pub default_top_k: u32,
	/// Upper bound for a per-request `top_k`.
	pub max_top_k: u32,
	pub rerank_enabled: bool,
	pub compression_enabled: bool,
	pub rerank_max_chars: u32,
	pub compression_max_chars: u32,
	pub compression_min_chars: u32,
}
impl Default for Pipeline {
	fn default() -> Self {
		Self {
			feature_level: 4,
			alpha: 0.5,
			default_top_k: 5,
			max_top_k: 50,
			rerank_enabled: true,
			compression_enabled: true,
			rerank_max_chars: 512,
			compression_max_chars: 1_500,
			compression_min_chars: 20,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vocabulary {
	/// Known category labels, matched case-insensitively inside queries.
	pub categories: Vec<String>,
	/// Singular noun used in plural references such as "all three banks".
	#[serde(default = "default_category_noun")]
	pub category_noun: String,
	#[serde(default = "default_year_min")]
	pub year_min: u16,
	#[serde(default = "default_year_max")]
	pub year_max: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub enabled: bool,
	pub max_entries: u32,
}
impl Default for Cache {
	fn default() -> Self {
		Self { enabled: true, max_entries: 256 }
	}
}

fn default_dense_vector() -> String {
	"dense".to_string()
}

fn default_bm25_vector() -> String {
	"bm25".to_string()
}

fn default_bm25_model() -> String {
	"qdrant/bm25".to_string()
}

fn default_category_noun() -> String {
	"category".to_string()
}

fn default_year_min() -> u16 {
	2020
}

fn default_year_max() -> u16 {
	2029
}
