use simple_amm::Error;
use thiserror::Error as ThisError;

use crate::asset::AssetId;

/// Failure reported by an [`AssetTransfer`](crate::AssetTransfer) service.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum TransferError {
    #[error("unknown asset `{0}`")]
    UnknownAsset(AssetId),
    #[error("negative amount {0}")]
    NegativeAmount(i128),
    #[error("`{holder}` holds {available}, needs {required}")]
    InsufficientBalance {
        holder: String,
        available: i128,
        required: i128,
    },
    #[error("`{spender}` may spend {available} of `{owner}`'s balance, needs {required}")]
    InsufficientAllowance {
        owner: String,
        spender: String,
        available: i128,
        required: i128,
    },
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// A [`settle`](crate::AssetTransfer::settle) batch that was not applied,
/// naming the asset of the movement that failed.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("batch rejected at {asset}: {source}")]
pub struct BatchError {
    pub asset: AssetId,
    #[source]
    pub source: TransferError,
}

#[derive(Debug, ThisError)]
pub enum LedgerError {
    #[error("pool rejected the operation: {0:?}")]
    Pool(Error),

    #[error("transfer of {asset} failed: {source}")]
    Transfer {
        asset: AssetId,
        #[source]
        source: TransferError,
    },

    #[error("`{0}` holds the pool reserves and cannot trade against the pool")]
    PoolAccountCaller(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("ledger lock poisoned")]
    Poisoned,
}

impl From<Error> for LedgerError {
    fn from(err: Error) -> Self {
        LedgerError::Pool(err)
    }
}

impl LedgerError {
    /// The pool error kind this failure surfaces as, if it came from a pool
    /// operation.
    pub fn kind(&self) -> Option<Error> {
        match self {
            LedgerError::Pool(err) => Some(*err),
            LedgerError::Transfer { .. } => Some(Error::TransferFailed),
            _ => None,
        }
    }

    pub(crate) fn transfer(asset: &AssetId, source: TransferError) -> Self {
        LedgerError::Transfer {
            asset: asset.clone(),
            source,
        }
    }
}

impl From<BatchError> for LedgerError {
    fn from(err: BatchError) -> Self {
        LedgerError::Transfer {
            asset: err.asset,
            source: err.source,
        }
    }
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
