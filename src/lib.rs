mod locker;
mod migrations;
mod operation_row;
mod util;

pub mod amount;
pub mod config;
pub mod errors;
pub mod exchange_rate;
pub mod fee_window;
pub mod incoming_swap;
pub mod logger;
pub mod next_transaction_size;
pub mod operation;
pub mod operation_store;
pub mod payment_context;
pub mod swap;
pub mod user;
pub mod utxo_set_state;

pub use crate::amount::{BitcoinAmount, MonetaryAmount};
pub use crate::config::Config;
pub use crate::errors::{DomainError, Error, Result, RuntimeErrorCode};
pub use crate::exchange_rate::{ExchangeRate, ExchangeRateWindow};
pub use crate::fee_window::FeeWindow;
pub use crate::incoming_swap::{IncomingSwap, IncomingSwapHtlc, IncomingSwapState};
pub use crate::next_transaction_size::{NextTransactionSize, SizeForAmount, UtxoStatus};
pub use crate::operation::{
    Operation, OperationDirection, OperationIncomingSwapState, OperationStatus,
};
pub use crate::operation_row::{reconstruct, OperationRow};
pub use crate::payment_context::{
    EngineContext, PaymentContext, PaymentContextSelector, PaymentContextSources,
};
pub use crate::swap::fees::SubmarineSwapFees;
pub use crate::swap::funding_output::{ScriptVersion, SubmarineSwapFundingOutput};
pub use crate::swap::{DebtType, SubmarineSwap};
pub use crate::user::{PublicProfile, User};
pub use crate::utxo_set_state::{UtxoSetState, UtxoSetStateSelector};

use crate::locker::Locker;
use crate::logger::init_logger_once;
use crate::operation_store::OperationStore;
use crate::util::LogIgnoreError;
use log::{debug, info, Level};
use perro::{ensure, invalid_input};
use std::sync::Mutex;
use std::time::SystemTime;

pub struct OperationsCore {
    config: Config,
    store: Mutex<OperationStore>,
}

impl OperationsCore {
    pub fn new(config: Config) -> Result<Self> {
        init_logger_once(config.log_level, &config.log_file_path())
            .log_ignore_error(Level::Warn, "Failed to initialize the logger");
        info!("Starting operations core on {}", config.network);

        let store = OperationStore::new(&config.db_path())?;
        Ok(OperationsCore {
            config,
            store: Mutex::new(store),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn insert_operation(&self, operation: &Operation) -> Result<Operation> {
        self.store.lock_or_fail()?.insert_operation(operation)
    }

    pub fn update_status(
        &self,
        hid: i64,
        confirmations: u64,
        hash: Option<&str>,
        status: OperationStatus,
    ) -> Result<()> {
        self.store
            .lock_or_fail()?
            .update_status(hid, confirmations, hash, status)
    }

    /// Marks the swap as paid once the preimage it was locked with is known.
    pub fn settle_swap(
        &self,
        swap_uuid: &str,
        payed_at: SystemTime,
        preimage: Vec<u8>,
    ) -> Result<Operation> {
        let mut store = self.store.lock_or_fail()?;
        let operation = store.fetch_by_swap_uuid(swap_uuid)?;
        let swap = operation
            .swap()
            .ok_or_else(|| invalid_input(format!("Operation for {swap_uuid} has no swap")))?;
        ensure!(
            swap.verify_preimage(&preimage),
            invalid_input(format!(
                "Preimage doesn't match payment hash of swap {swap_uuid}"
            ))
        );
        store.update_swap_settlement(swap_uuid, payed_at, &preimage)?;
        debug!("Settled swap {swap_uuid}");
        store.fetch_by_swap_uuid(swap_uuid)
    }

    pub fn store_incoming_swap_preimage(
        &self,
        incoming_swap_uuid: &str,
        preimage: Vec<u8>,
    ) -> Result<Operation> {
        let mut store = self.store.lock_or_fail()?;
        let operation = store.fetch_by_incoming_swap_uuid(incoming_swap_uuid)?;
        let incoming_swap = operation
            .incoming_swap()
            .ok_or_else(|| no_incoming_swap(incoming_swap_uuid))?;
        ensure!(
            incoming_swap.verify_preimage(&preimage),
            invalid_input(format!(
                "Preimage doesn't match payment hash of incoming swap {incoming_swap_uuid}"
            ))
        );
        store.update_incoming_swap_preimage(incoming_swap_uuid, &preimage)?;
        store.fetch_by_incoming_swap_uuid(incoming_swap_uuid)
    }

    pub fn store_htlc_fulfillment(
        &self,
        incoming_swap_uuid: &str,
        fulfillment_tx: Vec<u8>,
    ) -> Result<Operation> {
        let mut store = self.store.lock_or_fail()?;
        let operation = store.fetch_by_incoming_swap_uuid(incoming_swap_uuid)?;
        let incoming_swap = operation
            .incoming_swap()
            .ok_or_else(|| no_incoming_swap(incoming_swap_uuid))?;
        ensure!(
            incoming_swap.htlc.is_some(),
            invalid_input(format!(
                "Incoming swap {incoming_swap_uuid} has no htlc to fulfill"
            ))
        );
        store.update_htlc_fulfillment(incoming_swap_uuid, &fulfillment_tx)?;
        store.fetch_by_incoming_swap_uuid(incoming_swap_uuid)
    }

    pub fn fetch_all(&self) -> Result<Vec<Operation>> {
        self.store.lock_or_fail()?.fetch_all()
    }

    pub fn fetch_by_id(&self, id: i64) -> Result<Operation> {
        self.store.lock_or_fail()?.fetch_by_id(id)
    }

    pub fn fetch_by_hid(&self, hid: i64) -> Result<Operation> {
        self.store.lock_or_fail()?.fetch_by_hid(hid)
    }

    pub fn fetch_latest(&self) -> Result<Option<Operation>> {
        self.store.lock_or_fail()?.fetch_latest()
    }

    pub fn fetch_unsettled(&self) -> Result<Vec<Operation>> {
        self.store.lock_or_fail()?.fetch_unsettled()
    }

    pub fn fetch_by_swap_uuid(&self, swap_uuid: &str) -> Result<Operation> {
        self.store.lock_or_fail()?.fetch_by_swap_uuid(swap_uuid)
    }

    pub fn fetch_by_incoming_swap_uuid(&self, incoming_swap_uuid: &str) -> Result<Operation> {
        self.store
            .lock_or_fail()?
            .fetch_by_incoming_swap_uuid(incoming_swap_uuid)
    }

    pub fn utxo_set_state(&self) -> Result<UtxoSetState> {
        utxo_set_state_of(&*self.store.lock_or_fail()?)
    }

    pub fn utxo_set_state_selector(&self) -> Result<UtxoSetStateSelector> {
        let store = self.store.lock_or_fail()?;
        Ok(UtxoSetStateSelector::new(
            store.watch_pending_incoming(true),
            store.watch_pending_incoming(false),
        ))
    }

    /// Logging out while funds are in flight would lose track of them.
    pub fn can_logout(&self) -> Result<bool> {
        let store = self.store.lock_or_fail()?;
        let utxo_set_state = utxo_set_state_of(&store)?;
        if utxo_set_state != UtxoSetState::Confirmed {
            debug!("Can't log out, utxo set is {utxo_set_state:?}");
            return Ok(false);
        }
        let has_unfulfilled_incoming_swap = store.fetch_unsettled()?.iter().any(|operation| {
            matches!(
                operation.incoming_swap_state(),
                Some(OperationIncomingSwapState::Registered)
                    | Some(OperationIncomingSwapState::HtlcOffered { .. })
            )
        });
        if has_unfulfilled_incoming_swap {
            debug!("Can't log out, an incoming swap is not fulfilled yet");
        }
        Ok(!has_unfulfilled_incoming_swap)
    }

    pub fn delete_all(&self) -> Result<()> {
        self.store.lock_or_fail()?.delete_all()
    }
}

fn utxo_set_state_of(store: &OperationStore) -> Result<UtxoSetState> {
    Ok(UtxoSetState::resolve(
        store.count_pending_incoming(true)?,
        store.count_pending_incoming(false)?,
    ))
}

fn no_incoming_swap(incoming_swap_uuid: &str) -> Error {
    invalid_input(format!(
        "Operation for {incoming_swap_uuid} has no incoming swap"
    ))
}
