use serde::{Deserialize, Serialize};

use crate::asset::AssetId;

/// Record of one committed transition, in commit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Deposit {
        seq: u64,
        caller: String,
        amount_a: i128,
        amount_b: i128,
        minted: i128,
    },
    Redeem {
        seq: u64,
        caller: String,
        amount_a: i128,
        amount_b: i128,
        burned: i128,
    },
    Swap {
        seq: u64,
        caller: String,
        asset_in: AssetId,
        amount_in: i128,
        amount_out: i128,
    },
}

impl LedgerEvent {
    pub fn seq(&self) -> u64 {
        match self {
            LedgerEvent::Deposit { seq, .. }
            | LedgerEvent::Redeem { seq, .. }
            | LedgerEvent::Swap { seq, .. } => *seq,
        }
    }

    pub fn caller(&self) -> &str {
        match self {
            LedgerEvent::Deposit { caller, .. }
            | LedgerEvent::Redeem { caller, .. }
            | LedgerEvent::Swap { caller, .. } => caller,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Journal {
    next_seq: u64,
    events: Vec<LedgerEvent>,
}

impl Journal {
    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub(crate) fn record(&mut self, event: LedgerEvent) {
        self.next_seq += 1;
        self.events.push(event);
    }

    pub(crate) fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub(crate) fn drain(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }
}
