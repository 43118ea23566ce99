use clap::{Parser, Subcommand};
mod commands;

#[derive(Parser)]
#[command(name = "amm-ledger")]
#[command(about = "Replay and quote constant-product pool operations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a TOML script of mints and pool operations
    Replay(commands::replay::ReplayArgs),
    /// Quote a swap against explicit reserves
    Quote(commands::quote::QuoteArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => commands::replay::exec(args)?,
        Commands::Quote(args) => commands::quote::exec(args)?,
    }

    Ok(())
}
