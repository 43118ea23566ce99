//! Off-chain constant-product pool ledger.
//!
//! [`AmmLedger`] runs the same pure planning functions as the `simple-amm`
//! contract (`simple_amm::engine`) against any [`AssetTransfer`] service,
//! serialising callers behind a single lock. [`Script`] replays a TOML
//! description of accounts and operations against an in-memory service.

pub mod asset;
pub mod config;
pub mod error;
pub mod journal;
pub mod ledger;
pub mod replay;

pub use asset::{AssetId, AssetTransfer, MemoryAssets, Movement};
pub use config::LedgerConfig;
pub use error::{BatchError, LedgerError, TransferError};
pub use journal::LedgerEvent;
pub use ledger::{AmmLedger, PoolSnapshot};
pub use replay::{Outcome, Report, Script, ScriptOp};
pub use simple_amm::Error as PoolError;
