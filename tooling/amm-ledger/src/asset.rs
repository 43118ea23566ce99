//! Asset-transfer seam between the ledger and whatever holds the balances.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{BatchError, TransferError};

/// Identifier of a fungible asset known to the transfer service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        AssetId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        AssetId::new(id)
    }
}

/// One transfer inside a [`settle`](AssetTransfer::settle) batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement<'a> {
    pub asset: &'a AssetId,
    /// Account whose allowance over `from` pays for the move. `None` means
    /// `from` authorises it directly.
    pub spender: Option<&'a str>,
    pub from: &'a str,
    pub to: &'a str,
    pub amount: i128,
}

impl<'a> Movement<'a> {
    /// `to` pulls `amount` out of `from` against its allowance.
    pub fn pull(asset: &'a AssetId, from: &'a str, to: &'a str, amount: i128) -> Self {
        Movement {
            asset,
            spender: Some(to),
            from,
            to,
            amount,
        }
    }

    /// `from` sends `amount` to `to`.
    pub fn push(asset: &'a AssetId, from: &'a str, to: &'a str, amount: i128) -> Self {
        Movement {
            asset,
            spender: None,
            from,
            to,
            amount,
        }
    }
}

/// Token-interface operations the ledger needs, mirroring the contract-side
/// `balance` / `allowance` queries. Transfers go through [`settle`], which
/// applies a whole batch or none of it, like a contract invocation that the
/// host rolls back on error.
///
/// [`settle`]: AssetTransfer::settle
pub trait AssetTransfer: Send + Sync {
    fn balance_of(&self, asset: &AssetId, holder: &str) -> Result<i128, TransferError>;

    fn allowance(&self, asset: &AssetId, owner: &str, spender: &str)
        -> Result<i128, TransferError>;

    /// Applies every movement in order. If any movement fails, none of them
    /// is visible afterwards.
    fn settle(&self, batch: &[Movement<'_>]) -> Result<(), BatchError>;
}

#[derive(Debug, Clone, Default)]
struct Books {
    balances: HashMap<(AssetId, String), i128>,
    allowances: HashMap<(AssetId, String, String), i128>,
    frozen: HashSet<(AssetId, String)>,
}

impl Books {
    fn balance(&self, asset: &AssetId, holder: &str) -> i128 {
        self.balances
            .get(&(asset.clone(), holder.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn check_frozen(&self, asset: &AssetId, holder: &str) -> Result<(), TransferError> {
        if self.frozen.contains(&(asset.clone(), holder.to_string())) {
            return Err(TransferError::Rejected(format!("`{holder}` is frozen for {asset}")));
        }
        Ok(())
    }

    fn move_balance(
        &mut self,
        asset: &AssetId,
        from: &str,
        to: &str,
        amount: i128,
    ) -> Result<(), TransferError> {
        if amount < 0 {
            return Err(TransferError::NegativeAmount(amount));
        }
        self.check_frozen(asset, from)?;
        self.check_frozen(asset, to)?;

        let available = self.balance(asset, from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                holder: from.to_string(),
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(asset, to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("balance overflow".into()))?;

        self.balances
            .insert((asset.clone(), from.to_string()), available - amount);
        self.balances.insert((asset.clone(), to.to_string()), credited);
        Ok(())
    }

    fn apply(&mut self, movement: &Movement<'_>) -> Result<(), TransferError> {
        let Movement {
            asset,
            spender,
            from,
            to,
            amount,
        } = *movement;
        let Some(spender) = spender else {
            return self.move_balance(asset, from, to, amount);
        };

        let key = (asset.clone(), from.to_string(), spender.to_string());
        let available = self.allowances.get(&key).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientAllowance {
                owner: from.to_string(),
                spender: spender.to_string(),
                available,
                required: amount,
            });
        }
        self.move_balance(asset, from, to, amount)?;
        self.allowances.insert(key, available - amount);
        Ok(())
    }
}

/// In-process asset service holding balances and allowances for a fixed set
/// of assets. Used by tests and by the replay command.
#[derive(Debug)]
pub struct MemoryAssets {
    assets: HashSet<AssetId>,
    books: Mutex<Books>,
}

impl MemoryAssets {
    pub fn new<I>(assets: I) -> Self
    where
        I: IntoIterator<Item = AssetId>,
    {
        MemoryAssets {
            assets: assets.into_iter().collect(),
            books: Mutex::new(Books::default()),
        }
    }

    fn books(&self) -> std::sync::MutexGuard<'_, Books> {
        // Mutations validate before writing, so poisoned books are still consistent.
        self.books.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn known(&self, asset: &AssetId) -> Result<(), TransferError> {
        if self.assets.contains(asset) {
            Ok(())
        } else {
            Err(TransferError::UnknownAsset(asset.clone()))
        }
    }

    pub fn mint(&self, asset: &AssetId, to: &str, amount: i128) -> Result<(), TransferError> {
        self.known(asset)?;
        if amount < 0 {
            return Err(TransferError::NegativeAmount(amount));
        }
        let mut books = self.books();
        let balance = books
            .balance(asset, to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected("balance overflow".into()))?;
        books.balances.insert((asset.clone(), to.to_string()), balance);
        Ok(())
    }

    pub fn approve(
        &self,
        asset: &AssetId,
        owner: &str,
        spender: &str,
        amount: i128,
    ) -> Result<(), TransferError> {
        self.known(asset)?;
        if amount < 0 {
            return Err(TransferError::NegativeAmount(amount));
        }
        self.books().allowances.insert(
            (asset.clone(), owner.to_string(), spender.to_string()),
            amount,
        );
        Ok(())
    }

    /// Makes every transfer touching `holder` in `asset` fail. Balance and
    /// allowance queries are unaffected.
    pub fn freeze(&self, asset: &AssetId, holder: &str) {
        self.books()
            .frozen
            .insert((asset.clone(), holder.to_string()));
    }

    pub fn unfreeze(&self, asset: &AssetId, holder: &str) {
        self.books()
            .frozen
            .remove(&(asset.clone(), holder.to_string()));
    }
}

impl AssetTransfer for MemoryAssets {
    fn balance_of(&self, asset: &AssetId, holder: &str) -> Result<i128, TransferError> {
        self.known(asset)?;
        Ok(self.books().balance(asset, holder))
    }

    fn allowance(
        &self,
        asset: &AssetId,
        owner: &str,
        spender: &str,
    ) -> Result<i128, TransferError> {
        self.known(asset)?;
        Ok(self
            .books()
            .allowances
            .get(&(asset.clone(), owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn settle(&self, batch: &[Movement<'_>]) -> Result<(), BatchError> {
        let mut books = self.books();
        let mut staged = books.clone();
        for movement in batch {
            self.known(movement.asset)
                .and_then(|_| staged.apply(movement))
                .map_err(|source| BatchError {
                    asset: movement.asset.clone(),
                    source,
                })?;
        }
        *books = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> (MemoryAssets, AssetId) {
        let usdc = AssetId::new("USDC");
        (MemoryAssets::new([usdc.clone()]), usdc)
    }

    #[test]
    fn test_mint_and_push() {
        let (svc, usdc) = assets();
        svc.mint(&usdc, "alice", 100).unwrap();
        svc.settle(&[Movement::push(&usdc, "alice", "bob", 40)]).unwrap();

        assert_eq!(svc.balance_of(&usdc, "alice").unwrap(), 60);
        assert_eq!(svc.balance_of(&usdc, "bob").unwrap(), 40);
    }

    #[test]
    fn test_pull_spends_allowance() {
        let (svc, usdc) = assets();
        svc.mint(&usdc, "alice", 100).unwrap();
        svc.approve(&usdc, "alice", "pool", 70).unwrap();

        svc.settle(&[Movement::pull(&usdc, "alice", "pool", 50)]).unwrap();
        assert_eq!(svc.allowance(&usdc, "alice", "pool").unwrap(), 20);

        let err = svc
            .settle(&[Movement::pull(&usdc, "alice", "pool", 21)])
            .unwrap_err();
        assert_eq!(err.asset, usdc);
        assert!(matches!(
            err.source,
            TransferError::InsufficientAllowance { available: 20, .. }
        ));
        assert_eq!(svc.balance_of(&usdc, "alice").unwrap(), 50);
    }

    #[test]
    fn test_unknown_asset_rejected() {
        let (svc, _) = assets();
        let other = AssetId::new("XLM");
        assert_eq!(
            svc.balance_of(&other, "alice"),
            Err(TransferError::UnknownAsset(other.clone()))
        );
        let err = svc
            .settle(&[Movement::push(&other, "alice", "bob", 1)])
            .unwrap_err();
        assert_eq!(err.source, TransferError::UnknownAsset(other));
    }

    #[test]
    fn test_frozen_holder_cannot_move_funds() {
        let (svc, usdc) = assets();
        svc.mint(&usdc, "alice", 100).unwrap();
        svc.freeze(&usdc, "bob");

        assert!(matches!(
            svc.settle(&[Movement::push(&usdc, "alice", "bob", 10)]),
            Err(BatchError {
                source: TransferError::Rejected(_),
                ..
            })
        ));
        assert_eq!(svc.balance_of(&usdc, "alice").unwrap(), 100);

        svc.unfreeze(&usdc, "bob");
        svc.settle(&[Movement::push(&usdc, "alice", "bob", 10)]).unwrap();
        assert_eq!(svc.balance_of(&usdc, "bob").unwrap(), 10);
    }

    #[test]
    fn test_failed_batch_applies_nothing() {
        let usdc = AssetId::new("USDC");
        let xlm = AssetId::new("XLM");
        let svc = MemoryAssets::new([usdc.clone(), xlm.clone()]);
        svc.mint(&usdc, "pool", 100).unwrap();
        svc.mint(&xlm, "pool", 100).unwrap();
        svc.mint(&usdc, "alice", 100).unwrap();
        svc.approve(&usdc, "alice", "pool", 100).unwrap();
        svc.freeze(&xlm, "alice");

        let err = svc
            .settle(&[
                Movement::pull(&usdc, "alice", "pool", 30),
                Movement::push(&usdc, "pool", "alice", 10),
                Movement::push(&xlm, "pool", "alice", 10),
            ])
            .unwrap_err();
        assert_eq!(err.asset, xlm);

        assert_eq!(svc.balance_of(&usdc, "alice").unwrap(), 100);
        assert_eq!(svc.balance_of(&usdc, "pool").unwrap(), 100);
        assert_eq!(svc.balance_of(&xlm, "pool").unwrap(), 100);
        assert_eq!(svc.allowance(&usdc, "alice", "pool").unwrap(), 100);
    }
}
