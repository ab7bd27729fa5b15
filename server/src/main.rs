use chipledger_server::{logging, serve, ServerConfig};
use clap::Parser;

/// Chip ledger room server.
#[derive(Parser, Debug)]
#[command(name = "chipledger-server", version, about)]
struct Cli {
    #[command(flatten)]
    server: ServerConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    serve(cli.server).await
}
