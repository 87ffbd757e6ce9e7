//! Fee rate policy type.

use crate::entities::Amount;
use serde::{Deserialize, Serialize};

/// A fee rate in base units per 1000 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct FeeRate {
    /// Base units per kilobyte of serialized transaction data.
    pub sat_per_kb: Amount,
}

impl FeeRate {
    /// Creates a fee rate from base units per kilobyte.
    pub fn per_kb(sat_per_kb: Amount) -> Self {
        Self { sat_per_kb }
    }

    /// Fee owed for `size` serialized bytes, rounded down.
    ///
    /// A non-zero rate never quotes a zero fee for a non-empty transaction.
    pub fn fee_for(&self, size: u64) -> Amount {
        let fee = (i128::from(self.sat_per_kb) * i128::from(size) / 1000)
            .clamp(i128::from(Amount::MIN), i128::from(Amount::MAX)) as Amount;
        if fee == 0 && size != 0 && self.sat_per_kb > 0 {
            return 1;
        }
        fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_scales_with_size() {
        let rate = FeeRate::per_kb(1000);
        assert_eq!(rate.fee_for(1000), 1000);
        assert_eq!(rate.fee_for(250), 250);
        assert_eq!(rate.fee_for(0), 0);
    }

    #[test]
    fn test_nonzero_rate_never_quotes_zero() {
        let rate = FeeRate::per_kb(1);
        assert_eq!(rate.fee_for(100), 1);
    }

    #[test]
    fn test_zero_rate_quotes_zero() {
        let rate = FeeRate::per_kb(0);
        assert_eq!(rate.fee_for(100_000), 0);
    }
}
