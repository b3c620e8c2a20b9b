use crate::swap::DebtType;
use serde::{Deserialize, Serialize};

/// Fees charged for an outgoing submarine swap.
///
/// The output padding is only charged when an on-chain funding transaction exists. For LEND swaps
/// the swap server extends credit instead, so there's nothing to pad and the padding is waived.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct SubmarineSwapFees {
    pub lightning_in_sats: u64,
    /// Also known as the sweep fee.
    pub output_padding_in_sats: u64,
}

impl SubmarineSwapFees {
    pub fn new(lightning_in_sats: u64, output_padding_in_sats: u64) -> Self {
        Self {
            lightning_in_sats,
            output_padding_in_sats,
        }
    }

    pub fn output_padding_in_sat(&self, debt_type: DebtType) -> u64 {
        match debt_type {
            DebtType::Lend => 0,
            DebtType::None | DebtType::Collect => self.output_padding_in_sats,
        }
    }

    pub fn total_in_sat(&self, debt_type: DebtType) -> u64 {
        self.lightning_in_sats
            .saturating_add(self.output_padding_in_sat(debt_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_without_debt() {
        let fees = SubmarineSwapFees::new(500, 300);
        assert_eq!(fees.output_padding_in_sat(DebtType::None), 300);
        assert_eq!(fees.total_in_sat(DebtType::None), 800);
    }

    #[test]
    fn test_total_for_lend_waives_padding() {
        let fees = SubmarineSwapFees::new(500, 300);
        assert_eq!(fees.output_padding_in_sat(DebtType::Lend), 0);
        assert_eq!(fees.total_in_sat(DebtType::Lend), 500);
    }

    #[test]
    fn test_total_for_every_debt_type() {
        let samples = [(0, 0), (1, 0), (0, 1), (500, 300), (12_345, 546), (u64::MAX, 0)];
        for (lightning, padding) in samples {
            let fees = SubmarineSwapFees::new(lightning, padding);
            assert_eq!(fees.total_in_sat(DebtType::None), lightning.saturating_add(padding));
            assert_eq!(
                fees.total_in_sat(DebtType::Collect),
                lightning.saturating_add(padding)
            );
            assert_eq!(fees.total_in_sat(DebtType::Lend), lightning);
        }
    }
}
