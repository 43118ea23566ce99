//! Transition engine: pure deposit, redeem and swap planning.
//!
//! Nothing here touches `Env`, storage or token contracts. Each `plan_*`
//! function validates its inputs against a [`PoolState`] snapshot and returns
//! either the complete post-transition state or an [`Error`]; callers perform
//! the token transfers and then commit the plan as one unit.
//!
//! ```text
//! deposit:  shares = amount_a + amount_b
//! redeem:   cost   = ⌊amount_a·L / reserve_a⌋ + ⌊amount_b·L / reserve_b⌋
//! swap:     out    = ⌊amount_in·997·reserve_out / (reserve_in·1000 + amount_in·997)⌋
//! ```

use soroban_sdk::contracttype;

use crate::error::Error;
use crate::math::{mul_div_floor, U256};

/// Numerator of the input scaling applied by swaps (0.3% fee).
pub const FEE_NUMERATOR: i128 = 997;
/// Denominator of the input scaling applied by swaps.
pub const FEE_DENOMINATOR: i128 = 1000;

/// Reserves and outstanding liquidity shares of one pool.
#[contracttype]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolState {
    pub reserve_a: i128,
    pub reserve_b: i128,
    pub total_liquidity: i128,
}

/// One side of the pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl PoolState {
    /// `(reserve_in, reserve_out)` for a swap whose input is `side`.
    pub fn reserves(&self, side: Side) -> (i128, i128) {
        match side {
            Side::A => (self.reserve_a, self.reserve_b),
            Side::B => (self.reserve_b, self.reserve_a),
        }
    }

    /// Product of the reserves at 256-bit width.
    pub fn k(&self) -> U256 {
        U256::from(self.reserve_a.max(0) as u128) * U256::from(self.reserve_b.max(0) as u128)
    }

    fn with_reserves(&self, side: Side, reserve_in: i128, reserve_out: i128) -> PoolState {
        let (reserve_a, reserve_b) = match side {
            Side::A => (reserve_in, reserve_out),
            Side::B => (reserve_out, reserve_in),
        };
        PoolState {
            reserve_a,
            reserve_b,
            total_liquidity: self.total_liquidity,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DepositPlan {
    pub next: PoolState,
    /// Shares credited to the depositor.
    pub minted: i128,
    /// Depositor's share balance after the deposit.
    pub holder_shares: i128,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RedeemPlan {
    pub next: PoolState,
    /// Shares debited from the holder.
    pub burned: i128,
    /// Holder's share balance after the redeem.
    pub holder_shares: i128,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SwapPlan {
    pub next: PoolState,
    pub side_in: Side,
    pub amount_in: i128,
    pub amount_out: i128,
}

/// Deposit `amount_a` and `amount_b` on behalf of a holder currently owning
/// `holder_shares`. Any positive ratio is accepted.
pub fn plan_deposit(
    state: &PoolState,
    holder_shares: i128,
    amount_a: i128,
    amount_b: i128,
) -> Result<DepositPlan, Error> {
    if amount_a <= 0 || amount_b <= 0 {
        return Err(Error::InvalidAmounts);
    }

    let minted = amount_a.checked_add(amount_b).ok_or(Error::Overflow)?;
    let next = PoolState {
        reserve_a: state.reserve_a.checked_add(amount_a).ok_or(Error::Overflow)?,
        reserve_b: state.reserve_b.checked_add(amount_b).ok_or(Error::Overflow)?,
        total_liquidity: state
            .total_liquidity
            .checked_add(minted)
            .ok_or(Error::Overflow)?,
    };

    Ok(DepositPlan {
        next,
        minted,
        holder_shares: holder_shares.checked_add(minted).ok_or(Error::Overflow)?,
    })
}

/// Shares burned by withdrawing `amount_a` and `amount_b`: one proportional
/// claim per asset, each truncated, then summed.
///
/// Callers must have checked `0 < amount <= reserve` on both sides.
pub fn redeem_cost(state: &PoolState, amount_a: i128, amount_b: i128) -> Result<i128, Error> {
    let cost_a = mul_div_floor(amount_a, state.total_liquidity, state.reserve_a)
        .ok_or(Error::Overflow)?;
    let cost_b = mul_div_floor(amount_b, state.total_liquidity, state.reserve_b)
        .ok_or(Error::Overflow)?;
    cost_a.checked_add(cost_b).ok_or(Error::Overflow)
}

/// Withdraw `amount_a` and `amount_b` on behalf of a holder owning
/// `holder_shares`.
pub fn plan_redeem(
    state: &PoolState,
    holder_shares: i128,
    amount_a: i128,
    amount_b: i128,
) -> Result<RedeemPlan, Error> {
    if amount_a <= 0 || amount_b <= 0 {
        return Err(Error::InvalidAmounts);
    }
    if amount_a > state.reserve_a || amount_b > state.reserve_b {
        return Err(Error::InsufficientReserves);
    }
    // A zero-share caller may not sweep a pool whose supply is fully burned.
    if holder_shares <= 0 {
        return Err(Error::InsufficientLiquidity);
    }

    let burned = redeem_cost(state, amount_a, amount_b)?;
    if burned > holder_shares {
        return Err(Error::InsufficientLiquidity);
    }

    let next = PoolState {
        reserve_a: state.reserve_a - amount_a,
        reserve_b: state.reserve_b - amount_b,
        total_liquidity: state
            .total_liquidity
            .checked_sub(burned)
            .ok_or(Error::Overflow)?,
    };

    Ok(RedeemPlan {
        next,
        burned,
        holder_shares: holder_shares - burned,
    })
}

/// Constant-product output for `amount_in` against the given reserves, with
/// the 0.3% fee folded into the input. Truncation always favours the pool.
pub fn get_amount_out(amount_in: i128, reserve_in: i128, reserve_out: i128) -> Result<i128, Error> {
    if amount_in <= 0 {
        return Err(Error::InvalidInput);
    }

    let amount_in_with_fee = amount_in
        .checked_mul(FEE_NUMERATOR)
        .ok_or(Error::Overflow)?;
    let denominator = reserve_in
        .checked_mul(FEE_DENOMINATOR)
        .ok_or(Error::Overflow)?
        .checked_add(amount_in_with_fee)
        .ok_or(Error::Overflow)?;

    mul_div_floor(amount_in_with_fee, reserve_out, denominator).ok_or(Error::Overflow)
}

/// Swap `amount_in` of `side_in` for the other asset, failing if the output
/// would fall below `min_amount_out`.
pub fn plan_swap(
    state: &PoolState,
    side_in: Side,
    amount_in: i128,
    min_amount_out: i128,
) -> Result<SwapPlan, Error> {
    let (reserve_in, reserve_out) = state.reserves(side_in);
    let amount_out = get_amount_out(amount_in, reserve_in, reserve_out)?;
    if amount_out < min_amount_out {
        return Err(Error::SlippageExceeded);
    }

    let next = state.with_reserves(
        side_in,
        reserve_in.checked_add(amount_in).ok_or(Error::Overflow)?,
        reserve_out - amount_out,
    );

    Ok(SwapPlan {
        next,
        side_in,
        amount_in,
        amount_out,
    })
}
