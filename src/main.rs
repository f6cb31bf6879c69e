use tourlens::cli;
use tourlens::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cli::Cli::run().await
}
