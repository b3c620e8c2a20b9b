use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const BITCOIN_CURRENCY_CODE: &str = "BTC";

const SATS_PER_BITCOIN_DECIMALS: u32 = 8;
const FIAT_DECIMALS: u32 = 2;

/// A monetary value denominated in the minor units of its currency.
///
/// For bitcoin the minor unit is the satoshi. For most fiat currencies the minor unit is the cent.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct MonetaryAmount {
    pub minor_units: u64,
    pub currency_code: String,
}

impl MonetaryAmount {
    pub fn new(minor_units: u64, currency_code: impl Into<String>) -> Self {
        Self {
            minor_units,
            currency_code: currency_code.into(),
        }
    }

    pub fn from_sats(sats: u64) -> Self {
        Self::new(sats, BITCOIN_CURRENCY_CODE)
    }

    pub fn is_bitcoin(&self) -> bool {
        self.currency_code == BITCOIN_CURRENCY_CODE
    }

    pub fn decimals(&self) -> u32 {
        if self.is_bitcoin() {
            SATS_PER_BITCOIN_DECIMALS
        } else {
            FIAT_DECIMALS
        }
    }

    /// Adds two amounts of the same currency. Returns `None` if the currencies differ.
    pub fn checked_add(&self, other: &MonetaryAmount) -> Option<MonetaryAmount> {
        if self.currency_code != other.currency_code {
            return None;
        }
        let minor_units = self.minor_units.checked_add(other.minor_units)?;
        Some(MonetaryAmount::new(minor_units, self.currency_code.clone()))
    }
}

impl Display for MonetaryAmount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let scale = 10_u64.pow(self.decimals());
        write!(
            f,
            "{}.{:0width$} {}",
            self.minor_units / scale,
            self.minor_units % scale,
            self.currency_code,
            width = self.decimals() as usize
        )
    }
}

/// A sat amount accompanied by the value it had, at creation time, in the currency the user typed
/// it in and in the user's primary currency.
///
/// The currency values are a historical snapshot. They are never recomputed with newer rates.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct BitcoinAmount {
    pub in_satoshis: u64,
    pub in_input_currency: MonetaryAmount,
    pub in_primary_currency: MonetaryAmount,
}

impl BitcoinAmount {
    pub fn new(
        in_satoshis: u64,
        in_input_currency: MonetaryAmount,
        in_primary_currency: MonetaryAmount,
    ) -> Self {
        Self {
            in_satoshis,
            in_input_currency,
            in_primary_currency,
        }
    }

    /// An amount whose input and primary currency are bitcoin itself.
    pub fn from_sats(sats: u64) -> Self {
        Self::new(
            sats,
            MonetaryAmount::from_sats(sats),
            MonetaryAmount::from_sats(sats),
        )
    }

    /// Adds two snapshots. Returns `None` if they were taken in different currencies.
    pub fn checked_add(&self, other: &BitcoinAmount) -> Option<BitcoinAmount> {
        Some(BitcoinAmount {
            in_satoshis: self.in_satoshis.checked_add(other.in_satoshis)?,
            in_input_currency: self.in_input_currency.checked_add(&other.in_input_currency)?,
            in_primary_currency: self
                .in_primary_currency
                .checked_add(&other.in_primary_currency)?,
        })
    }
}

/// Converts sats to fiat minor units given a rate expressed in sats per major unit, rounding down.
///
/// Returns `None` for a zero rate, which can't convert anything.
pub(crate) fn sats_to_fiat_minor_units(sats: u64, rate: u32) -> Option<u64> {
    if rate == 0 {
        return None;
    }
    let msats = sats as u128 * 1_000;
    let minor_units = msats * 100 / rate as u128 / 1_000;
    Some(u64::try_from(minor_units).unwrap_or(u64::MAX))
}
