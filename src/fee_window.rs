use crate::errors::Result;
use perro::{ensure, invalid_input};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Time before a fee estimation is considered too old to use.
const EXPIRATION_TIME: Duration = Duration::from_secs(5 * 60);

/// Confirmation target used for 0-conf swaps. Approx 2 days.
const SWAP_V2_CONF_TARGET: u32 = 250;

const WEIGHT_UNITS_PER_VBYTE: f64 = 4.0;

pub fn to_sats_per_vbyte(sats_per_weight_unit: f64) -> f64 {
    sats_per_weight_unit * WEIGHT_UNITS_PER_VBYTE
}

/// Fee rate recommendations fetched from the backend.
///
/// `targeted_fees` maps a confirmation target (in blocks) to a fee rate in sats per weight unit.
#[derive(Debug, PartialEq, Clone)]
pub struct FeeWindow {
    pub houston_id: i64,
    pub fetched_at: SystemTime,
    targeted_fees: BTreeMap<u32, f64>,
    fast_conf_target: u32,
    medium_conf_target: u32,
    slow_conf_target: u32,
}

impl FeeWindow {
    pub fn new(
        houston_id: i64,
        fetched_at: SystemTime,
        targeted_fees: BTreeMap<u32, f64>,
        fast_conf_target: u32,
        medium_conf_target: u32,
        slow_conf_target: u32,
    ) -> Result<Self> {
        ensure!(
            !targeted_fees.is_empty(),
            invalid_input("Fee window must have at least one targeted fee")
        );
        ensure!(
            !targeted_fees.contains_key(&0),
            invalid_input("Confirmation targets must be positive")
        );
        ensure!(
            fast_conf_target > 0 && medium_conf_target > 0 && slow_conf_target > 0,
            invalid_input("Confirmation targets must be positive")
        );
        Ok(Self {
            houston_id,
            fetched_at,
            targeted_fees,
            fast_conf_target,
            medium_conf_target,
            slow_conf_target,
        })
    }

    pub fn targeted_fees(&self) -> &BTreeMap<u32, f64> {
        &self.targeted_fees
    }

    pub fn fast_conf_target(&self) -> u32 {
        self.fast_conf_target
    }

    pub fn medium_conf_target(&self) -> u32 {
        self.medium_conf_target
    }

    pub fn slow_conf_target(&self) -> u32 {
        self.slow_conf_target
    }

    pub fn is_recent(&self, now: SystemTime) -> bool {
        match now.duration_since(self.fetched_at) {
            Ok(age) => age < EXPIRATION_TIME,
            // Fetched "in the future" according to the local clock.
            Err(_) => true,
        }
    }

    pub fn fastest_fee_rate(&self) -> f64 {
        self.targeted_fees
            .values()
            .next()
            .copied()
            .unwrap_or_default()
    }

    /// The minimum available fee rate that will hit a given confirmation target.
    ///
    /// No interpolation is made, so the fee might be overshot if data is sparse. If every
    /// available target is above the requested one, or the target is 0, the fastest rate is used.
    pub fn minimum_fee_rate_for_target(&self, confirmation_target: u32) -> f64 {
        if confirmation_target == 0 {
            return self.fastest_fee_rate();
        }
        self.targeted_fees
            .range(1..=confirmation_target)
            .next_back()
            .map(|(_, rate)| *rate)
            .unwrap_or_else(|| self.fastest_fee_rate())
    }

    /// The fee rate to use for a swap's funding transaction.
    pub fn swap_fee_rate(&self, confirmations_needed: u32) -> f64 {
        if confirmations_needed == 0 {
            return self.minimum_fee_rate_for_target(SWAP_V2_CONF_TARGET);
        }
        self.fastest_fee_rate()
    }

    /// The lowest recommended fee rate.
    pub fn minimum_fee_rate(&self) -> f64 {
        self.targeted_fees
            .values()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }
}
