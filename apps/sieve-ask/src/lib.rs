use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sieve_service::{Pipeline, Providers, QueryRequest};
use sieve_storage::qdrant::QdrantStore;

/// Answers one question against the configured index and prints the result as JSON.
#[derive(Debug, Parser)]
#[command(
	version = sieve_cli::VERSION,
	rename_all = "kebab",
	styles = sieve_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'q', value_name = "TEXT")]
	pub query: String,
	/// Rephrase the question before retrieval.
	#[arg(long)]
	pub expand: bool,
	/// Number of sources passed to answer generation. Defaults to `pipeline.default_top_k`.
	#[arg(long, value_name = "N")]
	pub top_k: Option<u32>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = sieve_config::load(&args.config)?;

	init_tracing(&config);

	let index = Arc::new(QdrantStore::new(&config.storage.qdrant)?);
	let pipeline = Pipeline::new(config, index, Providers::http()?)?;
	let result = pipeline
		.query(QueryRequest { query: args.query, expand: args.expand, top_k: args.top_k })
		.await?;

	for issue in &result.issues {
		tracing::warn!(stage = issue.stage.as_str(), error = %issue.message, "Stage degraded.");
	}

	println!("{}", serde_json::to_string_pretty(&result)?);

	Ok(())
}

/// Logs go to stderr so stdout carries only the JSON result.
fn init_tracing(config: &sieve_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_query_flags() {
		let args = Args::try_parse_from([
			"sieve-ask",
			"--config",
			"sieve.toml",
			"--query",
			"Compare Kaspi Bank and Halyk Bank",
			"--expand",
			"--top-k",
			"3",
		])
		.expect("Arguments must parse.");

		assert_eq!(args.config, PathBuf::from("sieve.toml"));
		assert!(args.expand);
		assert_eq!(args.top_k, Some(3));
	}

	#[test]
	fn query_is_required() {
		assert!(Args::try_parse_from(["sieve-ask", "--config", "sieve.toml"]).is_err());
	}
}
