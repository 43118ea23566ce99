//! Thread-safe pool ledger over an [`AssetTransfer`] service.
//!
//! The ledger holds one lock across plan, transfers and commit, so concurrent
//! callers are serialised and never observe an intermediate state. Transfers
//! are pre-flighted against balances and allowances, then settled as one
//! batch that the asset service applies in full or not at all. The pool state
//! is committed only after the batch succeeds.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use simple_amm::engine::{self, PoolState};
use simple_amm::{Error, Side};

use crate::asset::{AssetId, AssetTransfer, Movement};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::journal::{Journal, LedgerEvent};

/// Serialisable view of the pool at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub reserve_a: i128,
    pub reserve_b: i128,
    pub total_liquidity: i128,
}

impl From<PoolState> for PoolSnapshot {
    fn from(state: PoolState) -> Self {
        PoolSnapshot {
            reserve_a: state.reserve_a,
            reserve_b: state.reserve_b,
            total_liquidity: state.total_liquidity,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    pool: PoolState,
    shares: HashMap<String, i128>,
    journal: Journal,
}

impl Inner {
    fn shares_of(&self, holder: &str) -> i128 {
        self.shares.get(holder).copied().unwrap_or(0)
    }

    fn set_shares(&mut self, holder: &str, amount: i128) {
        if amount == 0 {
            self.shares.remove(holder);
        } else {
            self.shares.insert(holder.to_string(), amount);
        }
    }
}

pub struct AmmLedger<T> {
    config: LedgerConfig,
    assets: T,
    inner: Mutex<Inner>,
}

impl<T: AssetTransfer> AmmLedger<T> {
    pub fn new(config: LedgerConfig, assets: T) -> Result<Self> {
        config.validate()?;
        Ok(AmmLedger {
            config,
            assets,
            inner: Mutex::new(Inner::default()),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn assets(&self) -> &T {
        &self.assets
    }

    /// Holder id the pool keeps its reserves under.
    pub fn account(&self) -> &str {
        &self.config.account
    }

    pub fn token_a(&self) -> &AssetId {
        &self.config.asset_a
    }

    pub fn token_b(&self) -> &AssetId {
        &self.config.asset_b
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| LedgerError::Poisoned)
    }

    fn side_of(&self, asset: &AssetId) -> Result<Side> {
        if *asset == self.config.asset_a {
            Ok(Side::A)
        } else if *asset == self.config.asset_b {
            Ok(Side::B)
        } else {
            Err(Error::InvalidToken.into())
        }
    }

    fn asset(&self, side: Side) -> &AssetId {
        match side {
            Side::A => &self.config.asset_a,
            Side::B => &self.config.asset_b,
        }
    }

    // ── Transfers ───────────────────────────────────────────────────────────

    fn ensure_pullable(&self, asset: &AssetId, from: &str, amount: i128) -> Result<()> {
        let balance = self
            .assets
            .balance_of(asset, from)
            .map_err(|e| LedgerError::transfer(asset, e))?;
        let allowance = self
            .assets
            .allowance(asset, from, self.account())
            .map_err(|e| LedgerError::transfer(asset, e))?;
        if balance < amount || allowance < amount {
            return Err(LedgerError::Pool(Error::TransferFailed));
        }
        Ok(())
    }

    fn ensure_payable(&self, asset: &AssetId, amount: i128) -> Result<()> {
        let balance = self
            .assets
            .balance_of(asset, self.account())
            .map_err(|e| LedgerError::transfer(asset, e))?;
        if balance < amount {
            return Err(LedgerError::Pool(Error::TransferFailed));
        }
        Ok(())
    }

    /// Rejects the pool's own account as a caller: its balances are the
    /// reserves, so pulling from it would mint shares for nothing.
    fn ensure_caller(&self, caller: &str) -> Result<()> {
        if caller == self.account() {
            return Err(LedgerError::PoolAccountCaller(caller.to_string()));
        }
        Ok(())
    }

    fn settle(&self, batch: &[Movement<'_>]) -> Result<()> {
        Ok(self.assets.settle(batch)?)
    }

    // ── Operations ──────────────────────────────────────────────────────────

    /// Deposits both assets and credits `amount_a + amount_b` shares to
    /// `caller`. Returns the shares minted.
    pub fn deposit(&self, caller: &str, amount_a: i128, amount_b: i128) -> Result<i128> {
        self.ensure_caller(caller)?;
        let mut inner = self.lock()?;
        let plan = engine::plan_deposit(&inner.pool, inner.shares_of(caller), amount_a, amount_b)?;

        let (asset_a, asset_b, pool) = (self.token_a(), self.token_b(), self.account());
        self.ensure_pullable(asset_a, caller, amount_a)?;
        self.ensure_pullable(asset_b, caller, amount_b)?;
        self.settle(&[
            Movement::pull(asset_a, caller, pool, amount_a),
            Movement::pull(asset_b, caller, pool, amount_b),
        ])?;

        inner.pool = plan.next;
        inner.set_shares(caller, plan.holder_shares);
        let seq = inner.journal.next_seq();
        inner.journal.record(LedgerEvent::Deposit {
            seq,
            caller: caller.to_string(),
            amount_a,
            amount_b,
            minted: plan.minted,
        });
        Ok(plan.minted)
    }

    /// Withdraws exactly `amount_a` and `amount_b`, burning the shares they
    /// cost. Returns the shares burned.
    pub fn redeem(&self, caller: &str, amount_a: i128, amount_b: i128) -> Result<i128> {
        self.ensure_caller(caller)?;
        let mut inner = self.lock()?;
        let plan = engine::plan_redeem(&inner.pool, inner.shares_of(caller), amount_a, amount_b)?;

        let (asset_a, asset_b, pool) = (self.token_a(), self.token_b(), self.account());
        self.ensure_payable(asset_a, amount_a)?;
        self.ensure_payable(asset_b, amount_b)?;
        self.settle(&[
            Movement::push(asset_a, pool, caller, amount_a),
            Movement::push(asset_b, pool, caller, amount_b),
        ])?;

        inner.pool = plan.next;
        inner.set_shares(caller, plan.holder_shares);
        let seq = inner.journal.next_seq();
        inner.journal.record(LedgerEvent::Redeem {
            seq,
            caller: caller.to_string(),
            amount_a,
            amount_b,
            burned: plan.burned,
        });
        Ok(plan.burned)
    }

    /// Sells `amount_in` of `asset_in` for the other asset, failing with
    /// `SlippageExceeded` below `min_amount_out`. Returns the amount paid out.
    pub fn swap(
        &self,
        caller: &str,
        asset_in: &AssetId,
        amount_in: i128,
        min_amount_out: i128,
    ) -> Result<i128> {
        self.ensure_caller(caller)?;
        let side_in = self.side_of(asset_in)?;
        let mut inner = self.lock()?;
        let plan = engine::plan_swap(&inner.pool, side_in, amount_in, min_amount_out)?;

        let (input, output) = (self.asset(side_in), self.asset(side_in.other()));
        self.ensure_pullable(input, caller, amount_in)?;
        self.ensure_payable(output, plan.amount_out)?;
        let pool = self.account();
        self.settle(&[
            Movement::pull(input, caller, pool, amount_in),
            Movement::push(output, pool, caller, plan.amount_out),
        ])?;

        inner.pool = plan.next;
        let seq = inner.journal.next_seq();
        inner.journal.record(LedgerEvent::Swap {
            seq,
            caller: caller.to_string(),
            asset_in: input.clone(),
            amount_in,
            amount_out: plan.amount_out,
        });
        Ok(plan.amount_out)
    }

    /// Output a swap of `amount_in` of `asset_in` would produce right now.
    pub fn get_amount_out(&self, asset_in: &AssetId, amount_in: i128) -> Result<i128> {
        let side_in = self.side_of(asset_in)?;
        let (reserve_in, reserve_out) = self.lock()?.pool.reserves(side_in);
        Ok(engine::get_amount_out(amount_in, reserve_in, reserve_out)?)
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Result<PoolSnapshot> {
        Ok(self.lock()?.pool.into())
    }

    pub fn reserve_a(&self) -> Result<i128> {
        Ok(self.lock()?.pool.reserve_a)
    }

    pub fn reserve_b(&self) -> Result<i128> {
        Ok(self.lock()?.pool.reserve_b)
    }

    pub fn total_liquidity(&self) -> Result<i128> {
        Ok(self.lock()?.pool.total_liquidity)
    }

    /// Share balance of `holder`; zero if it never deposited.
    pub fn liquidity(&self, holder: &str) -> Result<i128> {
        Ok(self.lock()?.shares_of(holder))
    }

    /// All non-zero share balances, sorted by holder.
    pub fn holders(&self) -> Result<Vec<(String, i128)>> {
        let mut holders: Vec<_> = self
            .lock()?
            .shares
            .iter()
            .map(|(holder, amount)| (holder.clone(), *amount))
            .collect();
        holders.sort();
        Ok(holders)
    }

    pub fn events(&self) -> Result<Vec<LedgerEvent>> {
        Ok(self.lock()?.journal.events().to_vec())
    }

    /// Removes and returns every event recorded so far.
    pub fn drain_events(&self) -> Result<Vec<LedgerEvent>> {
        Ok(self.lock()?.journal.drain())
    }

    // ── Invariants ──────────────────────────────────────────────────────────

    /// Verifies the share ledger and reserve backing:
    /// Σ liquidity == total_liquidity, reserves are non-negative, and the
    /// pool account holds at least its recorded reserves of each asset.
    pub fn check_invariants(&self) -> Result<()> {
        let inner = self.lock()?;
        let pool = inner.pool;

        if pool.reserve_a < 0 || pool.reserve_b < 0 || pool.total_liquidity < 0 {
            return Err(LedgerError::InvariantViolation(format!(
                "negative pool field in {pool:?}"
            )));
        }

        let mut sum: i128 = 0;
        for (holder, amount) in &inner.shares {
            if *amount < 0 {
                return Err(LedgerError::InvariantViolation(format!(
                    "`{holder}` holds {amount} shares"
                )));
            }
            sum = sum.checked_add(*amount).ok_or_else(|| {
                LedgerError::InvariantViolation("share sum overflows".into())
            })?;
        }
        if sum != pool.total_liquidity {
            return Err(LedgerError::InvariantViolation(format!(
                "shares sum to {sum}, total liquidity is {}",
                pool.total_liquidity
            )));
        }

        for (asset, reserve) in [
            (self.token_a(), pool.reserve_a),
            (self.token_b(), pool.reserve_b),
        ] {
            let held = self
                .assets
                .balance_of(asset, self.account())
                .map_err(|e| LedgerError::transfer(asset, e))?;
            if held < reserve {
                return Err(LedgerError::InvariantViolation(format!(
                    "pool holds {held} {asset} against a reserve of {reserve}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryAssets;
    use std::sync::Arc;
    use std::thread;

    const E18: i128 = 1_000_000_000_000_000_000;

    fn ether(n: i128) -> i128 {
        n * E18
    }

    fn ledger() -> AmmLedger<MemoryAssets> {
        let config = LedgerConfig::new("TKA", "TKB").unwrap();
        let assets = MemoryAssets::new([config.asset_a.clone(), config.asset_b.clone()]);
        for user in ["alice", "bob", "carol"] {
            for asset in [&config.asset_a, &config.asset_b] {
                assets.mint(asset, user, ether(1000)).unwrap();
                assets.approve(asset, user, &config.account, ether(1000)).unwrap();
            }
        }
        AmmLedger::new(config, assets).unwrap()
    }

    fn balance(ledger: &AmmLedger<MemoryAssets>, asset: &AssetId, holder: &str) -> i128 {
        ledger.assets().balance_of(asset, holder).unwrap()
    }

    #[test]
    fn test_deposit_credits_shares_and_moves_assets() {
        let ledger = ledger();
        let minted = ledger.deposit("alice", ether(100), ether(200)).unwrap();

        assert_eq!(minted, ether(300));
        assert_eq!(
            ledger.snapshot().unwrap(),
            PoolSnapshot {
                reserve_a: ether(100),
                reserve_b: ether(200),
                total_liquidity: ether(300),
            }
        );
        assert_eq!(balance(&ledger, ledger.token_a(), "alice"), ether(900));
        assert_eq!(balance(&ledger, ledger.token_b(), ledger.account()), ether(200));
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_rejected_operations_leave_state_untouched() {
        let ledger = ledger();
        ledger.deposit("alice", ether(100), ether(200)).unwrap();
        let before = ledger.snapshot().unwrap();

        let cases = [
            (ledger.deposit("bob", 0, ether(1)), Error::InvalidAmounts),
            (ledger.redeem("alice", ether(150), ether(1)), Error::InsufficientReserves),
            (ledger.redeem("bob", ether(10), ether(10)), Error::InsufficientLiquidity),
            (ledger.swap("bob", &AssetId::new("TKC"), ether(1), 0), Error::InvalidToken),
            (ledger.swap("bob", ledger.token_a(), 0, 0), Error::InvalidInput),
            (
                ledger.swap("bob", ledger.token_a(), ether(10), ether(100)),
                Error::SlippageExceeded,
            ),
        ];
        for (outcome, kind) in cases {
            assert_eq!(outcome.unwrap_err().kind(), Some(kind));
        }

        assert_eq!(ledger.snapshot().unwrap(), before);
        assert_eq!(ledger.events().unwrap().len(), 1);
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_redeem_pays_out_exact_amounts() {
        let ledger = ledger();
        ledger.deposit("alice", ether(100), ether(200)).unwrap();

        let burned = ledger.redeem("alice", ether(20), ether(40)).unwrap();
        assert_eq!(burned, ether(120));
        assert_eq!(ledger.liquidity("alice").unwrap(), ether(180));
        assert_eq!(balance(&ledger, ledger.token_a(), "alice"), ether(920));
        assert_eq!(balance(&ledger, ledger.token_b(), "alice"), ether(840));
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_swap_matches_quote() {
        let ledger = ledger();
        ledger.deposit("alice", ether(1000), ether(1000)).unwrap();

        let quote = ledger.get_amount_out(ledger.token_a(), ether(100)).unwrap();
        assert_eq!(quote, 90_661_089_388_014_913_158);

        let out = ledger.swap("bob", ledger.token_a(), ether(100), quote).unwrap();
        assert_eq!(out, quote);
        assert_eq!(balance(&ledger, ledger.token_b(), "bob"), ether(1000) + quote);
        assert_eq!(ledger.reserve_a().unwrap(), ether(1100));
        assert_eq!(ledger.reserve_b().unwrap(), ether(1000) - quote);
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_missing_allowance_fails_before_any_transfer() {
        let ledger = ledger();
        ledger
            .assets()
            .approve(ledger.token_b(), "alice", ledger.account(), 0)
            .unwrap();

        let err = ledger.deposit("alice", ether(10), ether(10)).unwrap_err();
        assert_eq!(err.kind(), Some(Error::TransferFailed));
        assert_eq!(balance(&ledger, ledger.token_a(), "alice"), ether(1000));
        assert_eq!(ledger.total_liquidity().unwrap(), 0);
    }

    #[test]
    fn test_failed_second_deposit_leg_moves_nothing() {
        let ledger = ledger();
        ledger.assets().freeze(ledger.token_b(), "alice");

        let err = ledger.deposit("alice", ether(10), ether(10)).unwrap_err();
        assert!(matches!(err, LedgerError::Transfer { .. }));
        assert_eq!(err.kind(), Some(Error::TransferFailed));

        assert_eq!(balance(&ledger, ledger.token_a(), "alice"), ether(1000));
        assert_eq!(balance(&ledger, ledger.token_a(), ledger.account()), 0);
        assert_eq!(ledger.snapshot().unwrap(), PoolSnapshot::from(PoolState::default()));
        assert!(ledger.events().unwrap().is_empty());
    }

    #[test]
    fn test_failed_payout_refunds_swap_input() {
        let ledger = ledger();
        ledger.deposit("alice", ether(1000), ether(1000)).unwrap();
        ledger.assets().freeze(ledger.token_b(), "bob");

        let err = ledger.swap("bob", ledger.token_a(), ether(100), 0).unwrap_err();
        assert_eq!(err.kind(), Some(Error::TransferFailed));
        assert_eq!(balance(&ledger, ledger.token_a(), "bob"), ether(1000));
        assert_eq!(ledger.reserve_a().unwrap(), ether(1000));
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_failed_second_redeem_payout_keeps_first_in_pool() {
        let ledger = ledger();
        ledger.deposit("alice", ether(100), ether(200)).unwrap();
        ledger.assets().freeze(ledger.token_b(), "alice");
        let before = ledger.snapshot().unwrap();

        let err = ledger.redeem("alice", ether(20), ether(40)).unwrap_err();
        assert!(matches!(&err, LedgerError::Transfer { asset, .. } if asset == ledger.token_b()));
        assert_eq!(err.kind(), Some(Error::TransferFailed));

        assert_eq!(ledger.snapshot().unwrap(), before);
        assert_eq!(ledger.liquidity("alice").unwrap(), ether(300));
        assert_eq!(balance(&ledger, ledger.token_a(), "alice"), ether(900));
        assert_eq!(balance(&ledger, ledger.token_a(), ledger.account()), ether(100));
        assert_eq!(balance(&ledger, ledger.token_b(), ledger.account()), ether(200));
        assert_eq!(ledger.events().unwrap().len(), 1);
        ledger.check_invariants().unwrap();

        ledger.assets().unfreeze(ledger.token_b(), "alice");
        assert_eq!(ledger.redeem("alice", ether(20), ether(40)).unwrap(), ether(120));
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_pool_account_cannot_call_operations() {
        let ledger = ledger();
        ledger.deposit("alice", ether(100), ether(100)).unwrap();
        let pool = ledger.account().to_string();
        ledger
            .assets()
            .approve(ledger.token_a(), &pool, &pool, ether(100))
            .unwrap();
        ledger
            .assets()
            .approve(ledger.token_b(), &pool, &pool, ether(100))
            .unwrap();
        let before = ledger.snapshot().unwrap();

        for outcome in [
            ledger.deposit(&pool, ether(10), ether(10)),
            ledger.redeem(&pool, ether(1), ether(1)),
            ledger.swap(&pool, ledger.token_a(), ether(1), 0),
        ] {
            assert!(matches!(outcome, Err(LedgerError::PoolAccountCaller(_))));
        }

        assert_eq!(ledger.snapshot().unwrap(), before);
        assert_eq!(ledger.liquidity(&pool).unwrap(), 0);
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn test_journal_records_commit_order() {
        let ledger = ledger();
        ledger.deposit("alice", ether(10), ether(10)).unwrap();
        ledger.swap("bob", ledger.token_b(), ether(1), 0).unwrap();
        ledger.redeem("alice", ether(1), ether(1)).unwrap();

        let events = ledger.drain_events().unwrap();
        let seqs: Vec<_> = events.iter().map(LedgerEvent::seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(events[1].caller(), "bob");
        assert!(ledger.events().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_operations_keep_invariants() {
        let ledger = Arc::new(ledger());
        ledger.deposit("alice", ether(500), ether(500)).unwrap();

        let handles: Vec<_> = ["alice", "bob", "carol"]
            .into_iter()
            .enumerate()
            .map(|(i, user)| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for round in 0..20 {
                        let amount = ether(1) + (i as i128) * 1_000 + round;
                        let _ = ledger.deposit(user, amount, amount);
                        let asset = if round % 2 == 0 {
                            ledger.token_a()
                        } else {
                            ledger.token_b()
                        };
                        let _ = ledger.swap(user, asset, amount, 0);
                        let _ = ledger.redeem(user, amount / 4, amount / 4);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        ledger.check_invariants().unwrap();
        let total: i128 = ledger.holders().unwrap().iter().map(|(_, s)| s).sum();
        assert_eq!(total, ledger.total_liquidity().unwrap());
    }
}
