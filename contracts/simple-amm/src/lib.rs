#![no_std]

//! Two-asset constant-product AMM (x * y = k) with a fixed 0.3% swap fee.
//!
//! The crate follows a "core logic separation" layout: [`engine`] and [`math`]
//! are pure functions over integers, usable off-chain and under proptest/Kani,
//! while [`SimpleAmm`] is the contract layer that reads storage, moves tokens
//! through the standard token interface and commits the engine's plan.
//!
//! Every transition is validate → plan → transfer → commit. A failed
//! invocation returns an [`Error`] and the host discards all of its writes and
//! transfers, so callers never observe a partial transition.

pub mod engine;
mod error;
mod events;
pub mod math;
mod storage;

use soroban_sdk::{contract, contractimpl, log, token, Address, Env};

pub use engine::{PoolState, Side};
pub use error::Error;
use storage::AssetPair;

// ── Token movement ──────────────────────────────────────────────────────────────

/// Checks that `from` can fund a pull of `amount` into this contract.
fn ensure_pullable(
    env: &Env,
    token: &token::Client,
    from: &Address,
    amount: i128,
) -> Result<(), Error> {
    let this = env.current_contract_address();
    if token.balance(from) < amount || token.allowance(from, &this) < amount {
        return Err(Error::TransferFailed);
    }
    Ok(())
}

/// Moves `amount` from `from` into this contract using its allowance.
fn pull(env: &Env, token: &token::Client, from: &Address, amount: i128) -> Result<(), Error> {
    let this = env.current_contract_address();
    match token.try_transfer_from(&this, from, &this, &amount) {
        Ok(Ok(_)) => Ok(()),
        _ => Err(Error::TransferFailed),
    }
}

/// Moves `amount` held by this contract to `to`.
fn push(env: &Env, token: &token::Client, to: &Address, amount: i128) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    let this = env.current_contract_address();
    if token.balance(&this) < amount {
        return Err(Error::TransferFailed);
    }
    match token.try_transfer(&this, to, &amount) {
        Ok(Ok(_)) => Ok(()),
        _ => Err(Error::TransferFailed),
    }
}

// ── Contract ────────────────────────────────────────────────────────────────────

#[contract]
pub struct SimpleAmm;

#[contractimpl]
impl SimpleAmm {
    /// Binds the pool to two distinct token contracts. Callable once, and
    /// only with `admin`'s authorization.
    ///
    /// Deploy and initialize in the same transaction so nobody can bind the
    /// freshly deployed contract to other tokens in between.
    pub fn initialize(env: Env, admin: Address, token_a: Address, token_b: Address) -> Result<(), Error> {
        if storage::has_pair(&env) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        if token_a == token_b {
            return Err(Error::IdenticalAssets);
        }

        let pair = AssetPair { token_a, token_b };
        storage::write_admin(&env, &admin);
        storage::write_pair(&env, &pair);
        storage::write_pool(&env, &PoolState::default());
        storage::extend_instance(&env);

        events::initialized(&env, &admin, &pair);
        Ok(())
    }

    /// Deposits both assets and credits `amount_a + amount_b` shares to
    /// `caller`. Returns the shares minted.
    pub fn deposit(env: Env, caller: Address, amount_a: i128, amount_b: i128) -> Result<i128, Error> {
        caller.require_auth();

        let pair = storage::read_pair(&env)?;
        let pool = storage::read_pool(&env);
        let held = storage::read_shares(&env, &caller);
        let plan = engine::plan_deposit(&pool, held, amount_a, amount_b)?;

        let client_a = token::Client::new(&env, &pair.token_a);
        let client_b = token::Client::new(&env, &pair.token_b);
        ensure_pullable(&env, &client_a, &caller, amount_a)?;
        ensure_pullable(&env, &client_b, &caller, amount_b)?;
        pull(&env, &client_a, &caller, amount_a)?;
        pull(&env, &client_b, &caller, amount_b)?;

        storage::write_pool(&env, &plan.next);
        storage::write_shares(&env, &caller, plan.holder_shares);
        storage::extend_instance(&env);

        log!(&env, "deposit", caller, amount_a, amount_b, plan.minted);
        events::deposited(&env, &caller, amount_a, amount_b, plan.minted);
        Ok(plan.minted)
    }

    /// Withdraws exactly `amount_a` and `amount_b`, burning the shares they
    /// cost. Returns the shares burned.
    pub fn redeem(env: Env, caller: Address, amount_a: i128, amount_b: i128) -> Result<i128, Error> {
        caller.require_auth();

        let pair = storage::read_pair(&env)?;
        let pool = storage::read_pool(&env);
        let held = storage::read_shares(&env, &caller);
        let plan = engine::plan_redeem(&pool, held, amount_a, amount_b)?;

        let client_a = token::Client::new(&env, &pair.token_a);
        let client_b = token::Client::new(&env, &pair.token_b);
        push(&env, &client_a, &caller, amount_a)?;
        push(&env, &client_b, &caller, amount_b)?;

        storage::write_pool(&env, &plan.next);
        storage::write_shares(&env, &caller, plan.holder_shares);
        storage::extend_instance(&env);

        log!(&env, "redeem", caller, amount_a, amount_b, plan.burned);
        events::redeemed(&env, &caller, amount_a, amount_b, plan.burned);
        Ok(plan.burned)
    }

    /// Sells `amount_in` of `token_in` for the other asset. Fails with
    /// `SlippageExceeded` if the output would be below `min_amount_out`.
    /// Returns the amount sent to `caller`.
    pub fn swap(
        env: Env,
        caller: Address,
        token_in: Address,
        amount_in: i128,
        min_amount_out: i128,
    ) -> Result<i128, Error> {
        caller.require_auth();

        let pair = storage::read_pair(&env)?;
        let side_in = pair.side_of(&token_in)?;
        let pool = storage::read_pool(&env);
        let plan = engine::plan_swap(&pool, side_in, amount_in, min_amount_out)?;

        let input = token::Client::new(&env, &token_in);
        let output = token::Client::new(&env, pair.token(side_in.other()));
        ensure_pullable(&env, &input, &caller, amount_in)?;
        pull(&env, &input, &caller, amount_in)?;
        push(&env, &output, &caller, plan.amount_out)?;

        storage::write_pool(&env, &plan.next);
        storage::extend_instance(&env);

        log!(&env, "swap", caller, amount_in, plan.amount_out);
        events::swapped(&env, &caller, &token_in, amount_in, plan.amount_out);
        Ok(plan.amount_out)
    }

    /// Output a swap of `amount_in` of `token_in` would produce right now.
    pub fn get_amount_out(env: Env, token_in: Address, amount_in: i128) -> Result<i128, Error> {
        let pair = storage::read_pair(&env)?;
        let side_in = pair.side_of(&token_in)?;
        let (reserve_in, reserve_out) = storage::read_pool(&env).reserves(side_in);
        engine::get_amount_out(amount_in, reserve_in, reserve_out)
    }

    pub fn admin(env: Env) -> Result<Address, Error> {
        storage::read_admin(&env)
    }

    pub fn token_a(env: Env) -> Result<Address, Error> {
        Ok(storage::read_pair(&env)?.token_a)
    }

    pub fn token_b(env: Env) -> Result<Address, Error> {
        Ok(storage::read_pair(&env)?.token_b)
    }

    pub fn reserve_a(env: Env) -> i128 {
        storage::read_pool(&env).reserve_a
    }

    pub fn reserve_b(env: Env) -> i128 {
        storage::read_pool(&env).reserve_b
    }

    pub fn total_liquidity(env: Env) -> i128 {
        storage::read_pool(&env).total_liquidity
    }

    /// Share balance of `holder`; zero if it never deposited.
    pub fn liquidity(env: Env, holder: Address) -> i128 {
        storage::read_shares(&env, &holder)
    }
}
