use clap::Args;
use colored::Colorize;
use simple_amm::engine;

#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Reserve of the asset being sold
    #[arg(long)]
    pub reserve_in: i128,

    /// Reserve of the asset being bought
    #[arg(long)]
    pub reserve_out: i128,

    /// Amount sold
    #[arg(long)]
    pub amount_in: i128,
}

pub fn exec(args: QuoteArgs) -> anyhow::Result<()> {
    match engine::get_amount_out(args.amount_in, args.reserve_in, args.reserve_out) {
        Ok(amount_out) => {
            println!("{}", amount_out);
            Ok(())
        }
        Err(kind) => {
            eprintln!("{} quote rejected: {:?}", "✗".red(), kind);
            std::process::exit(1);
        }
    }
}
