use soroban_sdk::contracterror;

/// Failure kinds surfaced by the AMM. Every error aborts the transition
/// with no state change; the codes are part of the contract ABI.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    /// `initialize` was given the same token for both sides.
    IdenticalAssets = 3,
    /// Deposit or redeem with a non-positive amount on either side.
    InvalidAmounts = 4,
    /// Swap with a non-positive input amount.
    InvalidInput = 5,
    /// Swap input token is neither asset A nor asset B.
    InvalidToken = 6,
    InsufficientReserves = 7,
    InsufficientLiquidity = 8,
    SlippageExceeded = 9,
    /// The token contract rejected a pull or a push.
    TransferFailed = 10,
    Overflow = 11,
}
