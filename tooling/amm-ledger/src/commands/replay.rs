use std::path::PathBuf;

use amm_ledger::{Report, Script};
use clap::Args;
use colored::*;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the replay script (TOML)
    pub script: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn exec(args: ReplayArgs) -> anyhow::Result<()> {
    let script = Script::load(&args.script)?;
    let report = script.run()?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&script, &report);
    }
    Ok(())
}

fn print_text(script: &Script, report: &Report) {
    println!(
        "{} Replaying {} operations on {}/{}",
        "▶".blue(),
        report.outcomes.len(),
        script.pool.asset_a,
        script.pool.asset_b
    );

    for outcome in &report.outcomes {
        match (&outcome.error, outcome.value) {
            (None, Some(value)) => println!(
                "   {} #{} {} -> {}",
                "✓".green(),
                outcome.index,
                outcome.op,
                value
            ),
            (Some(error), _) => println!(
                "   {} #{} {} rejected: {}",
                "✗".red(),
                outcome.index,
                outcome.op,
                error.yellow()
            ),
            (None, None) => {}
        }
    }

    println!("\n{}", "Pool".bold());
    println!("   reserve {}: {}", script.pool.asset_a, report.pool.reserve_a);
    println!("   reserve {}: {}", script.pool.asset_b, report.pool.reserve_b);
    println!("   total liquidity: {}", report.pool.total_liquidity);
    for (holder, shares) in &report.holders {
        println!("   {} {}: {}", "->".cyan(), holder, shares);
    }
    println!("\n{} Invariants hold.", "✓".green());
}
