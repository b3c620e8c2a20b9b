use crate::amount::{sats_to_fiat_minor_units, MonetaryAmount, BITCOIN_CURRENCY_CODE};
use std::collections::BTreeMap;
use std::time::SystemTime;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExchangeRate {
    pub currency_code: String,
    /// Sats per major unit
    pub rate: u32,
    pub updated_at: SystemTime,
}

/// A set of exchange rates fetched together from the backend, identified by its backend id.
///
/// Operations keep a reference to the window their amounts were converted with.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExchangeRateWindow {
    pub window_hid: i64,
    pub fetched_at: SystemTime,
    rates: BTreeMap<String, ExchangeRate>,
}

impl ExchangeRateWindow {
    pub fn new(window_hid: i64, fetched_at: SystemTime, rates: Vec<ExchangeRate>) -> Self {
        let rates = rates
            .into_iter()
            .map(|r| (r.currency_code.clone(), r))
            .collect();
        Self {
            window_hid,
            fetched_at,
            rates,
        }
    }

    pub fn rate(&self, currency_code: &str) -> Option<&ExchangeRate> {
        self.rates.get(currency_code)
    }

    pub fn rates(&self) -> impl Iterator<Item = &ExchangeRate> {
        self.rates.values()
    }

    pub fn currency_codes(&self) -> Vec<String> {
        self.rates.keys().cloned().collect()
    }

    /// Converts sats into the given currency, rounding down.
    ///
    /// Bitcoin is always convertible. Returns `None` for a fiat currency without a usable rate.
    pub fn convert(&self, sats: u64, currency_code: &str) -> Option<MonetaryAmount> {
        if currency_code == BITCOIN_CURRENCY_CODE {
            return Some(MonetaryAmount::from_sats(sats));
        }
        let rate = self.rate(currency_code)?;
        let minor_units = sats_to_fiat_minor_units(sats, rate.rate)?;
        Some(MonetaryAmount::new(minor_units, currency_code))
    }
}
