//! Wide-integer helpers for the pricing and redemption formulas.
//!
//! Token amounts carry up to 18 decimals, so products such as
//! `amount_in * 997 * reserve_out` or `amount * total_liquidity` routinely
//! exceed 128 bits. They are formed at 256 bits and divided back down, which
//! keeps every result bit-exact with the plain integer formula.

use uint::construct_uint;

construct_uint! {
    /// Unsigned 256-bit integer for intermediate products.
    pub struct U256(4);
}

/// `floor(a * b / divisor)` for non-negative token amounts.
///
/// Returns `None` if an operand is negative, the divisor is zero, or the
/// quotient does not fit in an `i128`.
pub fn mul_div_floor(a: i128, b: i128, divisor: i128) -> Option<i128> {
    if a < 0 || b < 0 || divisor <= 0 {
        return None;
    }
    // Both factors are below 2^127, so the product cannot overflow 256 bits.
    let product = U256::from(a as u128) * U256::from(b as u128);
    let quot = product.checked_div(U256::from(divisor as u128))?;
    if quot > U256::from(i128::MAX as u128) {
        return None;
    }
    Some(quot.low_u128() as i128)
}


// ── Kani harnesses ─────────────────────────────────────────────────────────────

#[cfg(kani)]
mod verification {
    use super::*;

    #[kani::proof]
    fn verify_u256_mul_matches_native_for_u64() {
        let a: u64 = kani::any();
        let b: u64 = kani::any();

        let p = U256::from(a) * U256::from(b);

        assert!(p.bits() <= 128);
        assert!(p.low_u128() == (a as u128) * (b as u128));
    }

    #[kani::proof]
    #[kani::unwind(130)]
    fn verify_mul_div_floor_matches_native_for_u32() {
        let a: u32 = kani::any();
        let b: u32 = kani::any();
        let d: u32 = kani::any();
        kani::assume(d > 0);

        let Some(q) = mul_div_floor(a as i128, b as i128, d as i128) else {
            unreachable!();
        };

        assert!(q == (a as i128) * (b as i128) / (d as i128));
    }
}
