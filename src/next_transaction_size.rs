use crate::errors::DomainError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const WEIGHT_UNITS_PER_VBYTE: u64 = 4;
const UNINITIALIZED_OUTPOINT: &str = "uninitialized";

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UtxoStatus {
    Confirmed,
    Unconfirmed,
}

impl FromStr for UtxoStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" => Ok(UtxoStatus::Confirmed),
            "unconfirmed" => Ok(UtxoStatus::Unconfirmed),
            _ => Err(DomainError::UnknownUtxoStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// One step of the size progression: spending every utxo up to this one yields
/// `amount_in_satoshis` and needs a transaction of `size_in_bytes`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SizeForAmount {
    pub amount_in_satoshis: u64,
    /// Despite its name, this is the size in weight units. Kept for backend compatibility.
    pub size_in_bytes: u64,
    pub outpoint: Option<String>,
    pub utxo_status: UtxoStatus,
}

impl SizeForAmount {
    pub fn size_in_vbytes(&self) -> u64 {
        self.size_in_bytes / WEIGHT_UNITS_PER_VBYTE
    }
}

/// A precomputed projection of the wallet's utxo set used to estimate the size of the next
/// transaction without scanning every utxo.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NextTransactionSize {
    pub size_progression: Vec<SizeForAmount>,
    pub valid_at_operation_hid: Option<i64>,
    pub expected_debt_in_sat: u64,
}

impl NextTransactionSize {
    /// The utxo-only balance, without considering debt.
    pub fn utxo_balance(&self) -> u64 {
        self.size_progression
            .last()
            .map(|s| s.amount_in_satoshis)
            .unwrap_or(0)
    }

    /// The spendable balance, considering debt.
    pub fn user_balance(&self) -> u64 {
        let utxo_balance = self.utxo_balance();
        if self.expected_debt_in_sat > utxo_balance {
            warn!(
                "Expected debt {} exceeds utxo balance {utxo_balance}",
                self.expected_debt_in_sat
            );
        }
        utxo_balance.saturating_sub(self.expected_debt_in_sat)
    }

    /// Outpoints in size progression order.
    ///
    /// Returns `None` when the progression hasn't been initialized with outpoints yet.
    pub fn outpoints(&self) -> Option<Vec<String>> {
        let outpoints: Vec<String> = self
            .size_progression
            .iter()
            .filter_map(|s| s.outpoint.clone())
            .filter(|o| o != UNINITIALIZED_OUTPOINT)
            .collect();
        if outpoints.is_empty() || outpoints.len() != self.size_progression.len() {
            return None;
        }
        Some(outpoints)
    }
}
