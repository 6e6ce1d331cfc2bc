use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use habitpet::cli::{self, Commands};

#[derive(Parser)]
#[command(name = "habitpet")]
#[command(about = "Keep a virtual pet alive by keeping up your daily habits")]
#[command(version)]
struct Cli {
    /// Directory holding config.json and state.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("habitpet=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let data_dir = args.data_dir;

    match args.command {
        Commands::Status => cli::handle_status(data_dir).await,
        Commands::Tasks => cli::handle_tasks(data_dir).await,
        Commands::Complete {
            task,
            force,
            evidence,
        } => cli::handle_complete(task, force, evidence, data_dir).await,
        Commands::Shop => cli::handle_shop(data_dir).await,
        Commands::Buy { item } => cli::handle_buy(item, data_dir).await,
        Commands::Inventory => cli::handle_inventory(data_dir).await,
        Commands::Equip { item } => cli::handle_equip(item, data_dir).await,
        Commands::Unequip { item } => cli::handle_unequip(item, data_dir).await,
        Commands::Objective { claim } => cli::handle_objective(claim, data_dir).await,
        Commands::Reset => cli::handle_reset(data_dir).await,
        Commands::Run => cli::handle_run(data_dir).await,
    }
}
