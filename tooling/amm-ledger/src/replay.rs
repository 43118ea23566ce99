//! Scripted replays: build a pool from a TOML script, run its operations in
//! order and collect per-operation outcomes.
//!
//! ```toml
//! [pool]
//! asset_a = "USDC"
//! asset_b = "XLM"
//!
//! [[mint]]
//! account = "alice"
//! asset = "USDC"
//! amount = 1000
//!
//! [[op]]
//! kind = "deposit"
//! caller = "alice"
//! amount_a = 100
//! amount_b = 200
//! ```
//!
//! Every minted account grants the pool an allowance equal to its minted
//! amount. TOML integers are 64-bit, so script amounts are `i64`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetId, MemoryAssets};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::journal::LedgerEvent;
use crate::ledger::{AmmLedger, PoolSnapshot};

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub pool: LedgerConfig,
    #[serde(default)]
    pub mint: Vec<Mint>,
    #[serde(default)]
    pub op: Vec<ScriptOp>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mint {
    pub account: String,
    pub asset: AssetId,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptOp {
    Deposit {
        caller: String,
        amount_a: i64,
        amount_b: i64,
    },
    Redeem {
        caller: String,
        amount_a: i64,
        amount_b: i64,
    },
    Swap {
        caller: String,
        asset_in: AssetId,
        amount_in: i64,
        #[serde(default)]
        min_amount_out: i64,
    },
}

impl ScriptOp {
    fn name(&self) -> &'static str {
        match self {
            ScriptOp::Deposit { .. } => "deposit",
            ScriptOp::Redeem { .. } => "redeem",
            ScriptOp::Swap { .. } => "swap",
        }
    }
}

/// Result of one scripted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub index: usize,
    pub op: &'static str,
    /// Shares minted, shares burned, or amount paid out.
    pub value: Option<i128>,
    pub error: Option<String>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
    pub pool: PoolSnapshot,
    pub holders: Vec<(String, i128)>,
    pub events: Vec<LedgerEvent>,
}

impl Script {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let script: Script = toml::from_str(input)?;
        script.pool.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let input = fs::read_to_string(path).map_err(|source| LedgerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Runs the script against a fresh in-memory pool. Rejected operations
    /// are reported in the outcomes and do not stop the replay; a broken
    /// invariant afterwards does.
    pub fn run(&self) -> Result<Report> {
        let assets = MemoryAssets::new([self.pool.asset_a.clone(), self.pool.asset_b.clone()]);
        for mint in &self.mint {
            let amount = i128::from(mint.amount);
            assets
                .mint(&mint.asset, &mint.account, amount)
                .and_then(|_| assets.approve(&mint.asset, &mint.account, &self.pool.account, amount))
                .map_err(|e| LedgerError::transfer(&mint.asset, e))?;
        }
        let ledger = AmmLedger::new(self.pool.clone(), assets)?;

        let outcomes = self
            .op
            .iter()
            .enumerate()
            .map(|(index, op)| {
                let result = apply(&ledger, op);
                Outcome {
                    index,
                    op: op.name(),
                    value: result.as_ref().ok().copied(),
                    error: result.err().map(|e| describe(&e)),
                }
            })
            .collect();

        ledger.check_invariants()?;
        Ok(Report {
            outcomes,
            pool: ledger.snapshot()?,
            holders: ledger.holders()?,
            events: ledger.drain_events()?,
        })
    }
}

fn apply(ledger: &AmmLedger<MemoryAssets>, op: &ScriptOp) -> Result<i128> {
    match op {
        ScriptOp::Deposit {
            caller,
            amount_a,
            amount_b,
        } => ledger.deposit(caller, i128::from(*amount_a), i128::from(*amount_b)),
        ScriptOp::Redeem {
            caller,
            amount_a,
            amount_b,
        } => ledger.redeem(caller, i128::from(*amount_a), i128::from(*amount_b)),
        ScriptOp::Swap {
            caller,
            asset_in,
            amount_in,
            min_amount_out,
        } => ledger.swap(
            caller,
            asset_in,
            i128::from(*amount_in),
            i128::from(*min_amount_out),
        ),
    }
}

/// Short error label: the pool error kind when there is one.
fn describe(err: &LedgerError) -> String {
    match err.kind() {
        Some(kind) => format!("{kind:?}"),
        None => err.to_string(),
    }
}
