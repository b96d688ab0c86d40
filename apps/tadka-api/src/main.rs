use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = tadka_api::Args::parse();

	tadka_api::run(args).await
}
