use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::ledger::messages::Amount;

/// Denominator of `JoinableFraction`.
pub const FRACTION_SCALE: u32 = 1_000_000;

/// A fraction in the range [0, 1), kept in parts per million.
///
/// This is the part of the funds that is held back when opening the initial channels,
/// reserved for channels opened with us by other nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinableFraction {
    parts_per_million: u32,
}

impl JoinableFraction {
    pub fn zero() -> Self {
        JoinableFraction {
            parts_per_million: 0,
        }
    }

    pub fn from_parts_per_million(parts_per_million: u32) -> Option<Self> {
        if parts_per_million >= FRACTION_SCALE {
            return None;
        }
        Some(JoinableFraction { parts_per_million })
    }

    /// Returns None if `fraction` is not inside [0, 1) (NaN included).
    pub fn from_f64(fraction: f64) -> Option<Self> {
        if !(0.0..1.0).contains(&fraction) {
            return None;
        }
        let parts = (fraction * f64::from(FRACTION_SCALE)).round();
        // Fractions just below 1 would round up to a whole:
        let parts_per_million = u32::try_from(parts as u64).ok()?.min(FRACTION_SCALE - 1);
        Self::from_parts_per_million(parts_per_million)
    }

    pub fn parts_per_million(&self) -> u32 {
        self.parts_per_million
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.parts_per_million) / f64::from(FRACTION_SCALE)
    }

    /// floor(amount * (1 - fraction))
    pub fn keep_complement(&self, amount: Amount) -> Amount {
        let scale = Amount::from(FRACTION_SCALE);
        let keep = Amount::from(FRACTION_SCALE - self.parts_per_million);
        // Split amount to avoid overflow: amount = quot * scale + rem
        let quot = amount / scale;
        let rem = amount % scale;
        quot * keep + rem * keep / scale
    }
}

/// Amount of funds we deposit into every channel of the initial channel set.
///
/// floor(funds * (1 - joinable_funds_target) / initial_channel_target),
/// or 0 if there is no channel target.
pub fn initial_funding_per_partner(
    funds: Amount,
    initial_channel_target: u32,
    joinable_funds_target: JoinableFraction,
) -> Amount {
    if initial_channel_target == 0 {
        return 0;
    }
    joinable_funds_target.keep_complement(funds) / Amount::from(initial_channel_target)
}

/// Funds we may still deposit, given the total funds, the sum of our deposits in open
/// channels and our current token balance.
pub fn funds_remaining(funds: Amount, own_deposit_sum: Amount, token_balance: Amount) -> Amount {
    if funds == 0 {
        return 0;
    }
    funds.saturating_sub(own_deposit_sum).min(token_balance)
}
