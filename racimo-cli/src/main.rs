//! RACiMo CLI - resolve station observations from the live API or the historical snapshot.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "racimo-cli",
    version,
    about = "RACiMo station observation toolkit"
)]
struct Cli {
    #[command(flatten)]
    settings: racimo_cmd::Settings,

    #[command(subcommand)]
    command: racimo_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    racimo_cmd::run(cli.settings, cli.command).await
}
