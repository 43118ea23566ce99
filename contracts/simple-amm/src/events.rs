use soroban_sdk::{symbol_short, Address, Env};

use crate::storage::AssetPair;

pub(crate) fn initialized(env: &Env, admin: &Address, pair: &AssetPair) {
    let topics = (symbol_short!("init"), admin.clone());
    env.events()
        .publish(topics, (pair.token_a.clone(), pair.token_b.clone()));
}

pub(crate) fn deposited(env: &Env, caller: &Address, amount_a: i128, amount_b: i128, minted: i128) {
    let topics = (symbol_short!("deposit"), caller.clone());
    env.events().publish(topics, (amount_a, amount_b, minted));
}

pub(crate) fn redeemed(env: &Env, caller: &Address, amount_a: i128, amount_b: i128, burned: i128) {
    let topics = (symbol_short!("redeem"), caller.clone());
    env.events().publish(topics, (amount_a, amount_b, burned));
}

pub(crate) fn swapped(
    env: &Env,
    caller: &Address,
    token_in: &Address,
    amount_in: i128,
    amount_out: i128,
) {
    let topics = (symbol_short!("swap"), caller.clone(), token_in.clone());
    env.events().publish(topics, (amount_in, amount_out));
}
