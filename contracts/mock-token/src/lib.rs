#![no_std]

//! Minimal fungible token implementing the standard Soroban token interface
//! (`balance`, `allowance`, `approve`, `transfer`, `transfer_from`) plus an
//! unrestricted `mint` and a `freeze` switch that makes every transfer
//! touching a holder fail. Used as the asset-transfer service in AMM tests.

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, Address, Env, String,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum TokenError {
    AlreadyInitialized = 1,
    NegativeAmount = 2,
    InsufficientBalance = 3,
    InsufficientAllowance = 4,
    Overflow = 5,
    /// Non-zero allowance whose expiration ledger is already in the past.
    InvalidExpiration = 6,
    Frozen = 7,
}

#[contracttype]
pub enum DataKey {
    Allowance(Address, Address),
    Balance(Address),
    Frozen(Address),
    Metadata,
}

#[contracttype]
#[derive(Clone)]
pub struct Metadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

#[contracttype]
#[derive(Clone)]
pub struct AllowanceValue {
    pub amount: i128,
    pub expiration_ledger: u32,
}

// ── Pure logic ──────────────────────────────────────────────────────────────────

/// Moves `amount` between two balances, returning `(new_from, new_to)`.
pub fn transfer_pure(
    balance_from: i128,
    balance_to: i128,
    amount: i128,
) -> Result<(i128, i128), TokenError> {
    if amount < 0 {
        return Err(TokenError::NegativeAmount);
    }
    if balance_from < amount {
        return Err(TokenError::InsufficientBalance);
    }
    let new_to = balance_to
        .checked_add(amount)
        .ok_or(TokenError::Overflow)?;
    Ok((balance_from - amount, new_to))
}

/// Credits `amount` to a balance.
pub fn mint_pure(balance: i128, amount: i128) -> Result<i128, TokenError> {
    if amount < 0 {
        return Err(TokenError::NegativeAmount);
    }
    balance.checked_add(amount).ok_or(TokenError::Overflow)
}

// ── Contract ────────────────────────────────────────────────────────────────────

#[contract]
pub struct MockToken;

#[contractimpl]
impl MockToken {
    pub fn initialize(e: Env, name: String, symbol: String, decimals: u32) {
        if e.storage().instance().has(&DataKey::Metadata) {
            panic_with_error!(&e, TokenError::AlreadyInitialized);
        }
        let metadata = Metadata {
            name,
            symbol,
            decimals,
        };
        e.storage().instance().set(&DataKey::Metadata, &metadata);
    }

    /// Test double: anyone may mint.
    pub fn mint(e: Env, to: Address, amount: i128) {
        let balance = Self::balance(e.clone(), to.clone());
        match mint_pure(balance, amount) {
            Ok(new_balance) => write_balance(&e, &to, new_balance),
            Err(err) => panic_with_error!(&e, err),
        }
    }

    /// Test double: anyone may freeze or thaw a holder.
    pub fn freeze(e: Env, id: Address) {
        e.storage().persistent().set(&DataKey::Frozen(id), &true);
    }

    pub fn unfreeze(e: Env, id: Address) {
        e.storage().persistent().remove(&DataKey::Frozen(id));
    }

    pub fn frozen(e: Env, id: Address) -> bool {
        e.storage()
            .persistent()
            .get(&DataKey::Frozen(id))
            .unwrap_or(false)
    }

    pub fn balance(e: Env, id: Address) -> i128 {
        e.storage()
            .persistent()
            .get(&DataKey::Balance(id))
            .unwrap_or(0)
    }

    pub fn allowance(e: Env, from: Address, spender: Address) -> i128 {
        match read_allowance(&e, &from, &spender) {
            Some(value) if value.expiration_ledger >= e.ledger().sequence() => value.amount,
            _ => 0,
        }
    }

    pub fn approve(e: Env, from: Address, spender: Address, amount: i128, expiration_ledger: u32) {
        from.require_auth();

        if amount < 0 {
            panic_with_error!(&e, TokenError::NegativeAmount);
        }
        if amount > 0 && expiration_ledger < e.ledger().sequence() {
            panic_with_error!(&e, TokenError::InvalidExpiration);
        }
        let value = AllowanceValue {
            amount,
            expiration_ledger,
        };
        e.storage()
            .persistent()
            .set(&DataKey::Allowance(from, spender), &value);
    }

    pub fn transfer(e: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        move_balance(&e, &from, &to, amount);
    }

    pub fn transfer_from(e: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();

        let allowed = Self::allowance(e.clone(), from.clone(), spender.clone());
        if amount < 0 {
            panic_with_error!(&e, TokenError::NegativeAmount);
        }
        if allowed < amount {
            panic_with_error!(&e, TokenError::InsufficientAllowance);
        }
        move_balance(&e, &from, &to, amount);

        if let Some(mut value) = read_allowance(&e, &from, &spender) {
            value.amount = allowed - amount;
            e.storage()
                .persistent()
                .set(&DataKey::Allowance(from, spender), &value);
        }
    }

    pub fn decimals(e: Env) -> u32 {
        read_metadata(&e).decimals
    }

    pub fn name(e: Env) -> String {
        read_metadata(&e).name
    }

    pub fn symbol(e: Env) -> String {
        read_metadata(&e).symbol
    }
}

fn read_metadata(e: &Env) -> Metadata {
    e.storage()
        .instance()
        .get(&DataKey::Metadata)
        .unwrap_or_else(|| Metadata {
            name: String::from_str(e, ""),
            symbol: String::from_str(e, ""),
            decimals: 0,
        })
}

fn read_allowance(e: &Env, from: &Address, spender: &Address) -> Option<AllowanceValue> {
    e.storage()
        .persistent()
        .get(&DataKey::Allowance(from.clone(), spender.clone()))
}

fn write_balance(e: &Env, owner: &Address, amount: i128) {
    e.storage()
        .persistent()
        .set(&DataKey::Balance(owner.clone()), &amount);
}

fn move_balance(e: &Env, from: &Address, to: &Address, amount: i128) {
    if MockToken::frozen(e.clone(), from.clone()) || MockToken::frozen(e.clone(), to.clone()) {
        panic_with_error!(e, TokenError::Frozen);
    }
    if from == to {
        if amount < 0 {
            panic_with_error!(e, TokenError::NegativeAmount);
        }
        return;
    }
    let balance_from = MockToken::balance(e.clone(), from.clone());
    let balance_to = MockToken::balance(e.clone(), to.clone());
    match transfer_pure(balance_from, balance_to, amount) {
        Ok((new_from, new_to)) => {
            write_balance(e, from, new_from);
            write_balance(e, to, new_to);
        }
        Err(err) => panic_with_error!(e, err),
    }
}
