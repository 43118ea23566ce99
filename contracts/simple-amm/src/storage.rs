use soroban_sdk::{contracttype, Address, Env};

use crate::engine::{PoolState, Side};
use crate::error::Error;

pub(crate) const DAY_IN_LEDGERS: u32 = 17280;
pub(crate) const INSTANCE_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
pub(crate) const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;
pub(crate) const SHARES_BUMP_AMOUNT: u32 = 60 * DAY_IN_LEDGERS;
pub(crate) const SHARES_LIFETIME_THRESHOLD: u32 = SHARES_BUMP_AMOUNT - DAY_IN_LEDGERS;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Pair,
    Pool,
    Shares(Address),
}

/// The two token contracts traded by this pool, fixed by `initialize`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetPair {
    pub token_a: Address,
    pub token_b: Address,
}

impl AssetPair {
    pub fn side_of(&self, token: &Address) -> Result<Side, Error> {
        if *token == self.token_a {
            Ok(Side::A)
        } else if *token == self.token_b {
            Ok(Side::B)
        } else {
            Err(Error::InvalidToken)
        }
    }

    pub fn token(&self, side: Side) -> &Address {
        match side {
            Side::A => &self.token_a,
            Side::B => &self.token_b,
        }
    }
}

pub(crate) fn extend_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub(crate) fn has_pair(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Pair)
}

pub(crate) fn read_admin(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub(crate) fn write_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
}

pub(crate) fn read_pair(env: &Env) -> Result<AssetPair, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Pair)
        .ok_or(Error::NotInitialized)
}

pub(crate) fn write_pair(env: &Env, pair: &AssetPair) {
    env.storage().instance().set(&DataKey::Pair, pair);
}

pub(crate) fn read_pool(env: &Env) -> PoolState {
    env.storage()
        .instance()
        .get(&DataKey::Pool)
        .unwrap_or_default()
}

pub(crate) fn write_pool(env: &Env, pool: &PoolState) {
    env.storage().instance().set(&DataKey::Pool, pool);
}

/// Share balance of `holder`; absent entries read as zero.
pub(crate) fn read_shares(env: &Env, holder: &Address) -> i128 {
    let key = DataKey::Shares(holder.clone());
    match env.storage().persistent().get::<_, i128>(&key) {
        Some(shares) => {
            env.storage()
                .persistent()
                .extend_ttl(&key, SHARES_LIFETIME_THRESHOLD, SHARES_BUMP_AMOUNT);
            shares
        }
        None => 0,
    }
}

pub(crate) fn write_shares(env: &Env, holder: &Address, shares: i128) {
    let key = DataKey::Shares(holder.clone());
    env.storage().persistent().set(&key, &shares);
    env.storage()
        .persistent()
        .extend_ttl(&key, SHARES_LIFETIME_THRESHOLD, SHARES_BUMP_AMOUNT);
}
