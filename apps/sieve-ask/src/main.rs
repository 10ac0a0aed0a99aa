use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = sieve_ask::Args::parse();

	sieve_ask::run(args).await
}
