use crate::amount::BitcoinAmount;
use crate::errors::Result;
use crate::exchange_rate::ExchangeRateWindow;
use crate::fee_window::{to_sats_per_vbyte, FeeWindow};
use crate::next_transaction_size::{NextTransactionSize, UtxoStatus};
use crate::swap::fees::SubmarineSwapFees;
use crate::swap::{BestRouteFees, DebtType, FundingOutputPolicies, SubmarineSwap};
use crate::user::User;
use log::debug;
use perro::{MapToError, OptionToError};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::watch;

/// Everything needed to analyze and build a new payment, captured at one point in time.
#[derive(Debug, PartialEq, Clone)]
pub struct PaymentContext {
    pub user: User,
    pub fee_window: FeeWindow,
    pub exchange_rate_window: ExchangeRateWindow,
    pub next_transaction_size: NextTransactionSize,
    /// In sats per weight unit.
    pub min_fee_rate: f64,
}

impl PaymentContext {
    pub fn new(
        user: User,
        fee_window: FeeWindow,
        exchange_rate_window: ExchangeRateWindow,
        next_transaction_size: NextTransactionSize,
        min_fee_rate: f64,
    ) -> Self {
        Self {
            user,
            fee_window,
            exchange_rate_window,
            next_transaction_size,
            min_fee_rate,
        }
    }

    pub fn user_balance(&self) -> u64 {
        self.next_transaction_size.user_balance()
    }

    pub fn utxo_balance(&self) -> u64 {
        self.next_transaction_size.utxo_balance()
    }

    pub fn fast_fee_rate(&self) -> f64 {
        self.fee_window
            .minimum_fee_rate_for_target(self.fee_window.fast_conf_target())
    }

    pub fn medium_fee_rate(&self) -> f64 {
        self.fee_window
            .minimum_fee_rate_for_target(self.fee_window.medium_conf_target())
    }

    pub fn slow_fee_rate(&self) -> f64 {
        self.fee_window
            .minimum_fee_rate_for_target(self.fee_window.slow_conf_target())
    }

    /// Snapshots the value of `sats` in the input and primary currencies with the current rates.
    pub fn convert_to_bitcoin_amount(
        &self,
        sats: u64,
        input_currency_code: &str,
    ) -> Result<BitcoinAmount> {
        let in_input_currency = self
            .exchange_rate_window
            .convert(sats, input_currency_code)
            .ok_or_invalid_input(format!("No exchange rate for {input_currency_code}"))?;
        let in_primary_currency = self
            .exchange_rate_window
            .convert(sats, &self.user.primary_currency)
            .ok_or_permanent_failure(format!(
                "No exchange rate for primary currency {}",
                self.user.primary_currency
            ))?;
        Ok(BitcoinAmount::new(
            sats,
            in_input_currency,
            in_primary_currency,
        ))
    }

    /// The shape handed over to the transaction-construction engine.
    pub fn to_engine_context(&self, swap: Option<&SubmarineSwap>) -> EngineContext {
        EngineContext {
            fee_window: EngineFeeWindow {
                targeted_fees_in_sats_per_vbyte: self
                    .fee_window
                    .targeted_fees()
                    .iter()
                    .map(|(target, rate)| (*target, to_sats_per_vbyte(*rate)))
                    .collect(),
                fast_conf_target: self.fee_window.fast_conf_target(),
                medium_conf_target: self.fee_window.medium_conf_target(),
                slow_conf_target: self.fee_window.slow_conf_target(),
            },
            next_transaction_size: EngineNextTransactionSize {
                size_progression: self
                    .next_transaction_size
                    .size_progression
                    .iter()
                    .map(|s| EngineSizeForAmount {
                        amount_in_sats: s.amount_in_satoshis,
                        size_in_vbytes: s.size_in_vbytes(),
                        outpoint: s.outpoint.clone(),
                        utxo_status: s.utxo_status,
                    })
                    .collect(),
                valid_at_operation_hid: self.next_transaction_size.valid_at_operation_hid,
                expected_debt_in_sats: self.next_transaction_size.expected_debt_in_sat,
            },
            primary_currency: self.user.primary_currency.clone(),
            exchange_rates: self
                .exchange_rate_window
                .rates()
                .map(|r| (r.currency_code.clone(), r.rate))
                .collect(),
            min_fee_rate_in_sats_per_vbyte: to_sats_per_vbyte(self.min_fee_rate),
            swap: swap.map(EngineSwap::from),
        }
    }

    /// [`PaymentContext::to_engine_context`] as JSON.
    pub fn to_engine_context_json(&self, swap: Option<&SubmarineSwap>) -> Result<String> {
        serde_json::to_string(&self.to_engine_context(swap))
            .map_to_permanent_failure("Failed to serialize engine context")
    }
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct EngineContext {
    pub fee_window: EngineFeeWindow,
    pub next_transaction_size: EngineNextTransactionSize,
    pub primary_currency: String,
    /// Sats per major unit, by currency code.
    pub exchange_rates: BTreeMap<String, u32>,
    pub min_fee_rate_in_sats_per_vbyte: f64,
    pub swap: Option<EngineSwap>,
}

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct EngineFeeWindow {
    pub targeted_fees_in_sats_per_vbyte: BTreeMap<u32, f64>,
    pub fast_conf_target: u32,
    pub medium_conf_target: u32,
    pub slow_conf_target: u32,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct EngineNextTransactionSize {
    pub size_progression: Vec<EngineSizeForAmount>,
    pub valid_at_operation_hid: Option<i64>,
    pub expected_debt_in_sats: u64,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct EngineSizeForAmount {
    pub amount_in_sats: u64,
    pub size_in_vbytes: u64,
    pub outpoint: Option<String>,
    pub utxo_status: UtxoStatus,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct EngineSwap {
    pub uuid: String,
    pub invoice: String,
    pub debt_type: DebtType,
    pub debt_amount_in_sats: u64,
    pub output_amount_in_sats: Option<u64>,
    pub confirmations_needed: Option<u32>,
    pub fees: Option<SubmarineSwapFees>,
    pub output_padding_in_sats: u64,
    pub total_fees_in_sats: u64,
    pub funding_output_policies: Option<FundingOutputPolicies>,
    pub best_route_fees: Option<Vec<BestRouteFees>>,
}

impl From<&SubmarineSwap> for EngineSwap {
    fn from(swap: &SubmarineSwap) -> Self {
        EngineSwap {
            uuid: swap.houston_uuid.clone(),
            invoice: swap.invoice.clone(),
            debt_type: swap.debt_type(),
            debt_amount_in_sats: swap.funding_output.debt_amount_in_satoshis,
            output_amount_in_sats: swap.funding_output.output_amount_in_satoshis,
            confirmations_needed: swap.funding_output.confirmations_needed,
            fees: swap.fees,
            output_padding_in_sats: swap.output_padding_in_sat(),
            total_fees_in_sats: swap.total_fees_in_sat(),
            funding_output_policies: swap.funding_output_policies,
            best_route_fees: swap.best_route_fees.clone(),
        }
    }
}

/// Sources a [`PaymentContext`] is derived from.
pub struct PaymentContextSources {
    pub user: watch::Receiver<Option<User>>,
    pub fee_window: watch::Receiver<Option<FeeWindow>>,
    pub exchange_rate_window: watch::Receiver<Option<ExchangeRateWindow>>,
    pub next_transaction_size: watch::Receiver<Option<NextTransactionSize>>,
    pub min_fee_rate: watch::Receiver<Option<f64>>,
}

/// Builds a fresh [`PaymentContext`] whenever one of its sources changes.
pub struct PaymentContextSelector {
    sources: PaymentContextSources,
}

impl PaymentContextSelector {
    pub fn new(sources: PaymentContextSources) -> Self {
        Self { sources }
    }

    /// The context built from the latest values, or `None` while some source has no value yet.
    pub fn current(&self) -> Option<PaymentContext> {
        let sources = &self.sources;
        Some(PaymentContext::new(
            sources.user.borrow().clone()?,
            sources.fee_window.borrow().clone()?,
            sources.exchange_rate_window.borrow().clone()?,
            sources.next_transaction_size.borrow().clone()?,
            (*sources.min_fee_rate.borrow())?,
        ))
    }

    /// Waits until a source changes and every source has a value.
    ///
    /// Fails once any source is no longer published.
    pub async fn changed(&mut self) -> Result<PaymentContext> {
        loop {
            let sources = &mut self.sources;
            tokio::select! {
                changed = sources.user.changed() => changed,
                changed = sources.fee_window.changed() => changed,
                changed = sources.exchange_rate_window.changed() => changed,
                changed = sources.next_transaction_size.changed() => changed,
                changed = sources.min_fee_rate.changed() => changed,
            }
            .map_to_permanent_failure("A payment context source is no longer published")?;

            self.mark_all_seen();
            match self.current() {
                Some(context) => return Ok(context),
                None => debug!("Payment context still incomplete"),
            }
        }
    }

    fn mark_all_seen(&mut self) {
        self.sources.user.borrow_and_update();
        self.sources.fee_window.borrow_and_update();
        self.sources.exchange_rate_window.borrow_and_update();
        self.sources.next_transaction_size.borrow_and_update();
        self.sources.min_fee_rate.borrow_and_update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::MonetaryAmount;
    use crate::exchange_rate::ExchangeRate;
    use crate::next_transaction_size::SizeForAmount;
    use crate::swap::tests::sample_swap;
    use std::time::SystemTime;

    fn user() -> User {
        User {
            hid: 1,
            primary_currency: "EUR".to_string(),
            profile: None,
        }
    }

    fn fee_window() -> FeeWindow {
        FeeWindow::new(
            1,
            SystemTime::now(),
            BTreeMap::from([(1, 10.0), (6, 5.0), (24, 2.5)]),
            1,
            6,
            24,
        )
        .unwrap()
    }

    fn exchange_rate_window() -> ExchangeRateWindow {
        ExchangeRateWindow::new(
            7,
            SystemTime::now(),
            vec![
                ExchangeRate {
                    currency_code: "EUR".to_string(),
                    rate: 4256,
                    updated_at: SystemTime::now(),
                },
                ExchangeRate {
                    currency_code: "USD".to_string(),
                    rate: 3950,
                    updated_at: SystemTime::now(),
                },
            ],
        )
    }

    fn next_transaction_size() -> NextTransactionSize {
        NextTransactionSize {
            size_progression: vec![
                SizeForAmount {
                    amount_in_satoshis: 10_000,
                    size_in_bytes: 440,
                    outpoint: Some("aa:0".to_string()),
                    utxo_status: UtxoStatus::Confirmed,
                },
                SizeForAmount {
                    amount_in_satoshis: 50_000,
                    size_in_bytes: 840,
                    outpoint: Some("bb:1".to_string()),
                    utxo_status: UtxoStatus::Unconfirmed,
                },
            ],
            valid_at_operation_hid: Some(9),
            expected_debt_in_sat: 2_000,
        }
    }

    fn context() -> PaymentContext {
        PaymentContext::new(
            user(),
            fee_window(),
            exchange_rate_window(),
            next_transaction_size(),
            0.25,
        )
    }

    #[test]
    fn test_balances_and_fee_rates() {
        let context = context();
        assert_eq!(context.utxo_balance(), 50_000);
        assert_eq!(context.user_balance(), 48_000);
        assert_eq!(context.fast_fee_rate(), 10.0);
        assert_eq!(context.medium_fee_rate(), 5.0);
        assert_eq!(context.slow_fee_rate(), 2.5);
    }

    #[test]
    fn test_convert_to_bitcoin_amount() {
        let context = context();
        let amount = context.convert_to_bitcoin_amount(12_349, "USD").unwrap();
        assert_eq!(amount.in_satoshis, 12_349);
        assert_eq!(amount.in_input_currency, MonetaryAmount::new(312, "USD"));
        assert_eq!(amount.in_primary_currency, MonetaryAmount::new(290, "EUR"));

        let amount = context.convert_to_bitcoin_amount(12_349, "BTC").unwrap();
        assert_eq!(amount.in_input_currency, MonetaryAmount::from_sats(12_349));

        assert!(context.convert_to_bitcoin_amount(1, "CHF").is_err());
    }

    #[test]
    fn test_engine_context() {
        let context = context();
        let engine_context = context.to_engine_context(None);
        assert_eq!(
            engine_context.fee_window.targeted_fees_in_sats_per_vbyte,
            BTreeMap::from([(1, 40.0), (6, 20.0), (24, 10.0)])
        );
        assert_eq!(
            engine_context.next_transaction_size.size_progression[1].size_in_vbytes,
            210
        );
        assert_eq!(engine_context.next_transaction_size.expected_debt_in_sats, 2_000);
        assert_eq!(engine_context.min_fee_rate_in_sats_per_vbyte, 1.0);
        assert_eq!(engine_context.exchange_rates.get("USD"), Some(&3950));
        assert!(engine_context.swap.is_none());
        assert_eq!(context.to_engine_context(None), engine_context);

        let swap = sample_swap(DebtType::Lend);
        let engine_swap = context.to_engine_context(Some(&swap)).swap.unwrap();
        assert_eq!(engine_swap.debt_type, DebtType::Lend);
        assert_eq!(engine_swap.total_fees_in_sats, 500);
        assert_eq!(engine_swap.output_padding_in_sats, 0);

        let json = context.to_engine_context_json(Some(&swap)).unwrap();
        assert!(json.contains("\"debt_type\":\"LEND\""));
        assert!(json.contains("\"utxo_status\":\"UNCONFIRMED\""));
    }

    #[tokio::test]
    async fn test_selector_waits_for_every_source() {
        let (user_sender, user) = watch::channel(None);
        let (fee_window_sender, fee_window) = watch::channel(None);
        let (exchange_rate_window_sender, exchange_rate_window) = watch::channel(None);
        let (next_transaction_size_sender, next_transaction_size) = watch::channel(None);
        let (min_fee_rate_sender, min_fee_rate) = watch::channel(None);
        let mut selector = PaymentContextSelector::new(PaymentContextSources {
            user,
            fee_window,
            exchange_rate_window,
            next_transaction_size,
            min_fee_rate,
        });
        assert_eq!(selector.current(), None);

        user_sender.send(Some(self::user())).unwrap();
        fee_window_sender.send(Some(self::fee_window())).unwrap();
        exchange_rate_window_sender
            .send(Some(self::exchange_rate_window()))
            .unwrap();
        min_fee_rate_sender.send(Some(0.25)).unwrap();
        assert_eq!(selector.current(), None);

        next_transaction_size_sender
            .send(Some(self::next_transaction_size()))
            .unwrap();
        assert_eq!(selector.changed().await.unwrap(), context());

        let mut nts = self::next_transaction_size();
        nts.expected_debt_in_sat = 0;
        next_transaction_size_sender.send(Some(nts)).unwrap();
        assert_eq!(selector.changed().await.unwrap().user_balance(), 50_000);
    }
}
