pub mod fees;
pub mod funding_output;

use crate::errors::{DomainError, Result};
use crate::swap::fees::SubmarineSwapFees;
use crate::swap::funding_output::SubmarineSwapFundingOutput;
use perro::{ensure, invalid_input};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::SystemTime;

/// How a swap relates to the user's debt with the swap server.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DebtType {
    /// A regular swap funded by an on-chain transaction.
    None,
    /// The swap server pays the invoice on credit. No funding transaction is made.
    Lend,
    /// The funding transaction also repays previously lent amounts.
    Collect,
}

impl DebtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtType::None => "NONE",
            DebtType::Lend => "LEND",
            DebtType::Collect => "COLLECT",
        }
    }
}

impl FromStr for DebtType {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(DebtType::None),
            "LEND" => Ok(DebtType::Lend),
            "COLLECT" => Ok(DebtType::Collect),
            _ => Err(DomainError::UnknownDebtType {
                value: s.to_string(),
            }),
        }
    }
}

impl Display for DebtType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The lightning node an outgoing swap pays to.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubmarineSwapReceiver {
    pub alias: Option<String>,
    /// Serialized network addresses as announced by the node.
    pub network_addresses: String,
    pub public_key: String,
}

/// Fee schedule of one route to the receiver, valid up to `max_capacity_in_sat`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct BestRouteFees {
    pub max_capacity_in_sat: u64,
    pub proportional_millionth: u64,
    pub base_in_sat: u64,
}

impl BestRouteFees {
    pub fn fee_for_amount(&self, amount_in_sat: u64) -> u64 {
        let proportional =
            (amount_in_sat as u128 * self.proportional_millionth as u128) / 1_000_000;
        self.base_in_sat
            .saturating_add(u64::try_from(proportional).unwrap_or(u64::MAX))
    }
}

/// Limits set by the swap server that decide how a swap will be funded.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct FundingOutputPolicies {
    pub maximum_debt_in_sat: u64,
    pub potential_collect_in_sat: u64,
    pub max_amount_in_sat_for_0_conf: u64,
}

impl FundingOutputPolicies {
    pub fn funding_confirmations(
        &self,
        payment_amount_in_sat: u64,
        lightning_fee_in_sat: u64,
    ) -> u32 {
        let total = payment_amount_in_sat.saturating_add(lightning_fee_in_sat);
        if total <= self.max_amount_in_sat_for_0_conf {
            0
        } else {
            1
        }
    }

    pub fn debt_type(&self, payment_amount_in_sat: u64, lightning_fee_in_sat: u64) -> DebtType {
        let total = payment_amount_in_sat.saturating_add(lightning_fee_in_sat);
        let is_0_conf =
            self.funding_confirmations(payment_amount_in_sat, lightning_fee_in_sat) == 0;
        if is_0_conf && total <= self.maximum_debt_in_sat {
            DebtType::Lend
        } else if self.potential_collect_in_sat > 0 {
            DebtType::Collect
        } else {
            DebtType::None
        }
    }

    pub fn debt_amount(&self, payment_amount_in_sat: u64, lightning_fee_in_sat: u64) -> u64 {
        match self.debt_type(payment_amount_in_sat, lightning_fee_in_sat) {
            DebtType::Lend => payment_amount_in_sat.saturating_add(lightning_fee_in_sat),
            DebtType::Collect => self.potential_collect_in_sat,
            DebtType::None => 0,
        }
    }

    /// The smallest output that can fund the swap, including collected debt.
    pub fn min_funding_amount(&self, payment_amount_in_sat: u64, lightning_fee_in_sat: u64) -> u64 {
        let total = payment_amount_in_sat.saturating_add(lightning_fee_in_sat);
        match self.debt_type(payment_amount_in_sat, lightning_fee_in_sat) {
            DebtType::Collect => total.saturating_add(self.potential_collect_in_sat),
            DebtType::None | DebtType::Lend => total,
        }
    }
}

/// An outgoing swap: the user pays a lightning invoice with on-chain funds, or on credit.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubmarineSwap {
    /// Local id. `None` until persisted.
    pub id: Option<i64>,
    pub houston_uuid: String,
    pub invoice: String,
    pub receiver: SubmarineSwapReceiver,
    pub funding_output: SubmarineSwapFundingOutput,
    /// `None` until the swap amount is known.
    pub fees: Option<SubmarineSwapFees>,
    pub expires_at: SystemTime,
    pub payed_at: Option<SystemTime>,
    pub preimage: Option<Vec<u8>>,
    /// Only available while the payment is being set up. Never persisted.
    pub best_route_fees: Option<Vec<BestRouteFees>>,
    /// Only available while the payment is being set up. Never persisted.
    pub funding_output_policies: Option<FundingOutputPolicies>,
}

impl SubmarineSwap {
    pub fn debt_type(&self) -> DebtType {
        self.funding_output.debt_type
    }

    pub fn is_lend(&self) -> bool {
        self.debt_type() == DebtType::Lend
    }

    pub fn is_collect(&self) -> bool {
        self.debt_type() == DebtType::Collect
    }

    pub fn output_padding_in_sat(&self) -> u64 {
        self.fees
            .map(|fees| fees.output_padding_in_sat(self.debt_type()))
            .unwrap_or(0)
    }

    pub fn total_fees_in_sat(&self) -> u64 {
        self.fees
            .map(|fees| fees.total_in_sat(self.debt_type()))
            .unwrap_or(0)
    }

    pub fn is_settled(&self) -> bool {
        self.payed_at.is_some()
    }

    /// Whether `preimage` unlocks the swap's payment hash.
    pub fn verify_preimage(&self, preimage: &[u8]) -> bool {
        Sha256::digest(preimage)[..] == self.funding_output.server_payment_hash[..]
    }

    pub fn with_settlement(mut self, payed_at: SystemTime, preimage: Vec<u8>) -> Result<Self> {
        ensure!(
            self.verify_preimage(&preimage),
            invalid_input(format!(
                "Preimage doesn't match payment hash of swap {}",
                self.houston_uuid
            ))
        );
        self.payed_at = Some(payed_at);
        self.preimage = Some(preimage);
        Ok(self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::swap::funding_output::{RefundAddress, ScriptVersion};
    use std::time::Duration;

    pub(crate) const PREIMAGE: [u8; 32] = [7; 32];

    pub(crate) fn sample_swap(debt_type: DebtType) -> SubmarineSwap {
        let server_payment_hash: [u8; 32] = Sha256::digest(PREIMAGE).into();
        SubmarineSwap {
            id: None,
            houston_uuid: "b1ff3e0c-3bf1-4cf5-9a7a-4d2f3c55b001".to_string(),
            invoice: "lnbcrt10u1pjexample".to_string(),
            receiver: SubmarineSwapReceiver {
                alias: Some("ACINQ".to_string()),
                network_addresses: "[\"1.2.3.4:9735\"]".to_string(),
                public_key: "03864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8f"
                    .to_string(),
            },
            funding_output: SubmarineSwapFundingOutput {
                output_address: "bcrt1qexampleoutputaddress".to_string(),
                output_amount_in_satoshis: Some(1_300),
                debt_type,
                debt_amount_in_satoshis: 0,
                confirmations_needed: Some(0),
                user_lock_time: None,
                user_refund_address: RefundAddress {
                    version: 4,
                    derivation_path: "m/schema:1'/recovery:1'/external:1/7".to_string(),
                    address: "bcrt1qexamplerefundaddress".to_string(),
                },
                server_payment_hash,
                server_public_key: vec![2; 33],
                script_version: ScriptVersion::V2,
                expiration_in_blocks: Some(144),
                user_public_key: None,
                muun_public_key: None,
            },
            fees: Some(SubmarineSwapFees::new(500, 300)),
            expires_at: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            payed_at: None,
            preimage: None,
            best_route_fees: None,
            funding_output_policies: None,
        }
    }

    #[test]
    fn test_debt_type_text() {
        for debt_type in [DebtType::None, DebtType::Lend, DebtType::Collect] {
            assert_eq!(DebtType::from_str(debt_type.as_str()), Ok(debt_type));
        }
        assert_eq!(
            DebtType::from_str("lend"),
            Err(DomainError::UnknownDebtType {
                value: "lend".to_string()
            })
        );
        assert_eq!(DebtType::Collect.to_string(), "COLLECT");
    }

    #[test]
    fn test_swap_fees_depend_on_debt_type() {
        let swap = sample_swap(DebtType::None);
        assert_eq!(swap.total_fees_in_sat(), 800);
        assert_eq!(swap.output_padding_in_sat(), 300);

        let lend = sample_swap(DebtType::Lend);
        assert!(lend.is_lend());
        assert_eq!(lend.total_fees_in_sat(), 500);
        assert_eq!(lend.output_padding_in_sat(), 0);

        let mut amountless = sample_swap(DebtType::Collect);
        amountless.fees = None;
        assert!(amountless.is_collect());
        assert_eq!(amountless.total_fees_in_sat(), 0);
    }

    #[test]
    fn test_settlement_checks_preimage() {
        let swap = sample_swap(DebtType::None);
        assert!(!swap.is_settled());
        assert!(swap.clone().with_settlement(SystemTime::now(), vec![1; 32]).is_err());

        let settled = swap.with_settlement(SystemTime::now(), PREIMAGE.to_vec()).unwrap();
        assert!(settled.is_settled());
        assert_eq!(settled.preimage, Some(PREIMAGE.to_vec()));
    }

    #[test]
    fn test_best_route_fees() {
        let route = BestRouteFees {
            max_capacity_in_sat: 1_000_000,
            proportional_millionth: 1_000,
            base_in_sat: 1,
        };
        assert_eq!(route.fee_for_amount(0), 1);
        assert_eq!(route.fee_for_amount(100_000), 101);
        assert_eq!(route.fee_for_amount(999), 1);
    }

    #[test]
    fn test_funding_output_policies() {
        let policies = FundingOutputPolicies {
            maximum_debt_in_sat: 10_000,
            potential_collect_in_sat: 0,
            max_amount_in_sat_for_0_conf: 50_000,
        };
        assert_eq!(policies.funding_confirmations(5_000, 10), 0);
        assert_eq!(policies.debt_type(5_000, 10), DebtType::Lend);
        assert_eq!(policies.debt_amount(5_000, 10), 5_010);
        assert_eq!(policies.min_funding_amount(5_000, 10), 5_010);

        assert_eq!(policies.debt_type(20_000, 10), DebtType::None);
        assert_eq!(policies.debt_amount(20_000, 10), 0);
        assert_eq!(policies.funding_confirmations(60_000, 0), 1);
        assert_eq!(policies.debt_type(60_000, 0), DebtType::None);

        let collecting = FundingOutputPolicies {
            potential_collect_in_sat: 2_000,
            ..policies
        };
        assert_eq!(collecting.debt_type(5_000, 10), DebtType::Lend);
        assert_eq!(collecting.debt_type(20_000, 10), DebtType::Collect);
        assert_eq!(collecting.debt_amount(20_000, 10), 2_000);
        assert_eq!(collecting.min_funding_amount(20_000, 10), 22_010);
    }
}
