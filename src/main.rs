use anyhow::Result;
use clap::Parser;
use quotebot::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    quotebot::run(args).await
}
