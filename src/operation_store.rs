use crate::amount::MonetaryAmount;
use crate::errors::{Result, RuntimeErrorCode};
use crate::incoming_swap::{IncomingSwap, IncomingSwapHtlc};
use crate::migrations::migrate;
use crate::operation::{Operation, OperationDirection, OperationStatus};
use crate::operation_row::{
    reconstruct, FundingOutputColumns, HtlcColumns, IncomingSwapColumns, OperationRow,
    ProfileColumns, SwapColumns,
};
use crate::swap::SubmarineSwap;
use crate::user::PublicProfile;
use crate::util::{from_db_time, to_db_time, LogIgnoreError};
use chrono::{DateTime, Utc};
use log::{debug, info, Level};
use perro::{runtime_error, MapToError};
use rusqlite::{params, Connection, Params, Row, Transaction};
use std::time::SystemTime;
use tokio::sync::watch;

const SELECT_OPERATIONS: &str = "\
    SELECT \
    o.id, o.hid, o.direction, o.is_external, o.sender_is_external, o.receiver_is_external, \
    o.receiver_address, o.receiver_address_derivation_path, \
    o.amount_in_satoshis, o.amount_in_input_currency_minor_units, o.amount_in_input_currency_code, \
    o.amount_in_primary_currency_minor_units, o.amount_in_primary_currency_code, \
    o.fee_in_satoshis, o.fee_in_input_currency_minor_units, o.fee_in_input_currency_code, \
    o.fee_in_primary_currency_minor_units, o.fee_in_primary_currency_code, \
    o.confirmations, o.hash, o.description, o.status, o.creation_date, \
    o.exchange_rate_window_hid, o.is_rbf, \
    sp.id AS sender_profile_id, sp.hid AS sender_profile_hid, \
    sp.first_name AS sender_profile_first_name, sp.last_name AS sender_profile_last_name, \
    sp.profile_picture_url AS sender_profile_picture_url, \
    rp.id AS receiver_profile_id, rp.hid AS receiver_profile_hid, \
    rp.first_name AS receiver_profile_first_name, rp.last_name AS receiver_profile_last_name, \
    rp.profile_picture_url AS receiver_profile_picture_url, \
    s.id AS swap_id, s.houston_uuid AS swap_uuid, s.invoice AS swap_invoice, \
    s.receiver_alias AS swap_receiver_alias, \
    s.receiver_network_addresses AS swap_receiver_network_addresses, \
    s.receiver_public_key AS swap_receiver_public_key, \
    s.funding_output_address, s.funding_output_amount_in_satoshis, s.funding_output_debt_type, \
    s.funding_output_debt_amount_in_satoshis, s.funding_output_confirmations_needed, \
    s.funding_output_user_lock_time, s.funding_output_user_refund_address, \
    s.funding_output_user_refund_address_path, s.funding_output_user_refund_address_version, \
    s.funding_output_server_payment_hash_in_hex, s.funding_output_server_public_key_in_hex, \
    s.funding_output_script_version, s.funding_output_expiration_in_blocks, \
    s.funding_output_user_public_key, s.funding_output_user_public_key_path, \
    s.funding_output_muun_public_key, s.funding_output_muun_public_key_path, \
    s.sweep_fee_in_satoshis AS swap_sweep_fee_in_satoshis, \
    s.lightning_fee_in_satoshis AS swap_lightning_fee_in_satoshis, \
    s.expires_at AS swap_expires_at, s.payed_at AS swap_payed_at, \
    s.preimage_in_hex AS swap_preimage_in_hex, \
    i.id AS incoming_swap_id, i.houston_uuid AS incoming_swap_uuid, \
    i.payment_hash_in_hex AS incoming_swap_payment_hash_in_hex, \
    i.sphinx_packet_in_hex AS incoming_swap_sphinx_packet_in_hex, \
    i.collect_in_satoshis AS incoming_swap_collect_in_satoshis, \
    i.payment_amount_in_satoshis AS incoming_swap_payment_amount_in_satoshis, \
    i.preimage_in_hex AS incoming_swap_preimage_in_hex, \
    h.id AS htlc_id, h.houston_uuid AS htlc_uuid, h.expiration_height AS htlc_expiration_height, \
    h.fulfillment_fee_subsidy_in_satoshis AS htlc_fulfillment_fee_subsidy_in_satoshis, \
    h.lent_in_satoshis AS htlc_lent_in_satoshis, \
    h.swap_server_public_key_in_hex AS htlc_swap_server_public_key_in_hex, \
    h.fulfillment_tx_in_hex AS htlc_fulfillment_tx_in_hex, h.address AS htlc_address, \
    h.output_amount_in_satoshis AS htlc_output_amount_in_satoshis, \
    h.htlc_tx_in_hex AS htlc_tx_in_hex \
    FROM operations o \
    LEFT JOIN public_profiles sp ON sp.hid = o.sender_profile_hid \
    LEFT JOIN public_profiles rp ON rp.hid = o.receiver_profile_hid \
    LEFT JOIN submarine_swaps s ON s.houston_uuid = o.submarine_swap_houston_uuid \
    LEFT JOIN incoming_swaps i ON i.houston_uuid = o.incoming_swap_houston_uuid \
    LEFT JOIN incoming_swap_htlcs h ON h.incoming_swap_houston_uuid = i.houston_uuid \
";

/// Local persistence of operations and their swaps.
///
/// Operations are written once, as a whole, and afterwards only touched through narrow updates.
/// The number of pending incoming operations is published after every write.
pub struct OperationStore {
    conn: Connection,
    pending_incoming_rbf: watch::Sender<u64>,
    pending_incoming_plain: watch::Sender<u64>,
}

impl OperationStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let mut conn = Connection::open(db_path).map_to_invalid_input("Invalid db path")?;
        migrate(&mut conn)?;
        let (pending_incoming_rbf, _) = watch::channel(0);
        let (pending_incoming_plain, _) = watch::channel(0);
        let store = OperationStore {
            conn,
            pending_incoming_rbf,
            pending_incoming_plain,
        };
        store.publish_pending_counts()?;
        Ok(store)
    }

    /// Stores a new operation with everything it carries.
    ///
    /// Returns the stored operation, with local ids filled in.
    pub fn insert_operation(&mut self, operation: &Operation) -> Result<Operation> {
        let tx = self
            .conn
            .transaction()
            .map_to_permanent_failure("Failed to begin SQL transaction")?;

        if let Some(profile) = &operation.sender_profile {
            upsert_profile(&tx, profile)?;
        }
        if let Some(profile) = &operation.receiver_profile {
            upsert_profile(&tx, profile)?;
        }
        if let Some(swap) = operation.swap() {
            insert_swap(&tx, swap)?;
        }
        if let Some(incoming_swap) = operation.incoming_swap() {
            insert_incoming_swap(&tx, incoming_swap)?;
            if let Some(htlc) = &incoming_swap.htlc {
                insert_htlc(&tx, &incoming_swap.houston_uuid, htlc)?;
            }
        }
        insert_operation_row(&tx, operation)?;
        let id = tx.last_insert_rowid();

        tx.commit()
            .map_to_permanent_failure("Failed to commit the db transaction")?;
        info!("Stored operation {} with local id {id}", operation.hid);

        self.publish_pending_counts()
            .log_ignore_error(Level::Warn, "Failed to publish pending incoming counts");
        self.fetch_by_id(id)
    }

    pub fn update_status(
        &mut self,
        hid: i64,
        confirmations: u64,
        hash: Option<&str>,
        status: OperationStatus,
    ) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE operations SET confirmations = ?1, hash = ?2, status = ?3 WHERE hid = ?4",
                (confirmations, hash, status.code(), hid),
            )
            .map_to_permanent_failure("Failed to update operation status")?;
        if updated == 0 {
            return Err(runtime_error(
                RuntimeErrorCode::OperationNotFound,
                format!("No operation with hid {hid}"),
            ));
        }
        debug!("Operation {hid} is now {status:?} with {confirmations} confirmations");

        self.publish_pending_counts()
            .log_ignore_error(Level::Warn, "Failed to publish pending incoming counts");
        Ok(())
    }

    pub fn update_swap_settlement(
        &mut self,
        swap_uuid: &str,
        payed_at: SystemTime,
        preimage: &[u8],
    ) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE submarine_swaps SET payed_at = ?1, preimage_in_hex = ?2 \
                WHERE houston_uuid = ?3",
                (to_db_time(payed_at), hex::encode(preimage), swap_uuid),
            )
            .map_to_permanent_failure("Failed to update swap settlement")?;
        if updated == 0 {
            return Err(runtime_error(
                RuntimeErrorCode::SwapNotFound,
                format!("No swap with uuid {swap_uuid}"),
            ));
        }
        debug!("Swap {swap_uuid} settled");
        Ok(())
    }

    pub fn update_incoming_swap_preimage(
        &mut self,
        incoming_swap_uuid: &str,
        preimage: &[u8],
    ) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE incoming_swaps SET preimage_in_hex = ?1 WHERE houston_uuid = ?2",
                (hex::encode(preimage), incoming_swap_uuid),
            )
            .map_to_permanent_failure("Failed to update incoming swap preimage")?;
        if updated == 0 {
            return Err(runtime_error(
                RuntimeErrorCode::IncomingSwapNotFound,
                format!("No incoming swap with uuid {incoming_swap_uuid}"),
            ));
        }
        debug!("Stored preimage for incoming swap {incoming_swap_uuid}");
        Ok(())
    }

    pub fn update_htlc_fulfillment(
        &mut self,
        incoming_swap_uuid: &str,
        fulfillment_tx: &[u8],
    ) -> Result<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE incoming_swap_htlcs SET fulfillment_tx_in_hex = ?1 \
                WHERE incoming_swap_houston_uuid = ?2",
                (hex::encode(fulfillment_tx), incoming_swap_uuid),
            )
            .map_to_permanent_failure("Failed to update htlc fulfillment")?;
        if updated == 0 {
            return Err(runtime_error(
                RuntimeErrorCode::IncomingSwapNotFound,
                format!("No htlc for incoming swap {incoming_swap_uuid}"),
            ));
        }
        debug!("Stored fulfillment tx for incoming swap {incoming_swap_uuid}");
        Ok(())
    }

    pub fn fetch_all(&self) -> Result<Vec<Operation>> {
        self.query_operations("ORDER BY o.id", [])
    }

    pub fn fetch_by_id(&self, id: i64) -> Result<Operation> {
        self.query_operations("WHERE o.id = ?1", [id])?
            .pop()
            .ok_or_else(|| {
                runtime_error(
                    RuntimeErrorCode::OperationNotFound,
                    format!("No operation with id {id}"),
                )
            })
    }

    pub fn fetch_by_hid(&self, hid: i64) -> Result<Operation> {
        self.query_operations("WHERE o.hid = ?1", [hid])?
            .pop()
            .ok_or_else(|| {
                runtime_error(
                    RuntimeErrorCode::OperationNotFound,
                    format!("No operation with hid {hid}"),
                )
            })
    }

    /// The most recently stored operation, if any.
    pub fn fetch_latest(&self) -> Result<Option<Operation>> {
        Ok(self
            .query_operations("ORDER BY o.id DESC LIMIT 1", [])?
            .pop())
    }

    /// Operations whose swap still waits to be paid or fulfilled.
    pub fn fetch_unsettled(&self) -> Result<Vec<Operation>> {
        let filter = format!(
            "WHERE o.status NOT IN ({}) AND (\
            (s.id IS NOT NULL AND s.payed_at IS NULL) OR \
            (i.id IS NOT NULL AND i.preimage_in_hex IS NULL AND h.fulfillment_tx_in_hex IS NULL)\
            ) ORDER BY o.id",
            status_codes(&[
                OperationStatus::Dropped,
                OperationStatus::Failed,
                OperationStatus::SwapFailed,
                OperationStatus::SwapExpired,
            ])
        );
        self.query_operations(&filter, [])
    }

    pub fn fetch_by_swap_uuid(&self, swap_uuid: &str) -> Result<Operation> {
        self.query_operations("WHERE s.houston_uuid = ?1", [swap_uuid])?
            .pop()
            .ok_or_else(|| {
                runtime_error(
                    RuntimeErrorCode::SwapNotFound,
                    format!("No operation for swap {swap_uuid}"),
                )
            })
    }

    pub fn fetch_by_incoming_swap_uuid(&self, incoming_swap_uuid: &str) -> Result<Operation> {
        self.query_operations("WHERE i.houston_uuid = ?1", [incoming_swap_uuid])?
            .pop()
            .ok_or_else(|| {
                runtime_error(
                    RuntimeErrorCode::IncomingSwapNotFound,
                    format!("No operation for incoming swap {incoming_swap_uuid}"),
                )
            })
    }

    /// Number of incoming operations that are still pending, split by whether they signal RBF.
    pub fn count_pending_incoming(&self, is_rbf: bool) -> Result<u64> {
        self.conn
            .query_row(
                &format!(
                    "SELECT COUNT(*) FROM operations \
                    WHERE direction = ?1 AND is_rbf = ?2 AND status IN ({})",
                    status_codes(&OperationStatus::PENDING)
                ),
                (OperationDirection::Incoming.code(), is_rbf),
                |row| row.get(0),
            )
            .map_to_permanent_failure("Failed to count pending incoming operations")
    }

    /// Follows [`OperationStore::count_pending_incoming`] across writes.
    pub fn watch_pending_incoming(&self, is_rbf: bool) -> watch::Receiver<u64> {
        if is_rbf {
            self.pending_incoming_rbf.subscribe()
        } else {
            self.pending_incoming_plain.subscribe()
        }
    }

    /// Wipes every stored operation, e.g. on logout.
    pub fn delete_all(&mut self) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_to_permanent_failure("Failed to begin SQL transaction")?;
        for table in [
            "operations",
            "incoming_swap_htlcs",
            "incoming_swaps",
            "submarine_swaps",
            "public_profiles",
        ] {
            tx.execute(&format!("DELETE FROM {table}"), [])
                .map_to_permanent_failure(format!("Failed to delete from {table}"))?;
        }
        tx.commit()
            .map_to_permanent_failure("Failed to commit the db transaction")?;
        info!("Deleted all operations");

        self.publish_pending_counts()
            .log_ignore_error(Level::Warn, "Failed to publish pending incoming counts");
        Ok(())
    }

    fn publish_pending_counts(&self) -> Result<()> {
        let rbf = self.count_pending_incoming(true)?;
        let plain = self.count_pending_incoming(false)?;
        self.pending_incoming_rbf.send_if_modified(|count| replace_count(count, rbf));
        self.pending_incoming_plain
            .send_if_modified(|count| replace_count(count, plain));
        Ok(())
    }

    fn query_operations<P: Params>(&self, filter: &str, params: P) -> Result<Vec<Operation>> {
        let rows = self
            .query_map(
                &format!("{SELECT_OPERATIONS} {filter}"),
                params,
                operation_row_from_row,
            )
            .map_to_permanent_failure("Failed to query operations")?;
        rows.into_iter().map(reconstruct).collect()
    }

    fn query_map<T, P, F>(
        &self,
        statement: &str,
        params: P,
        from_row: F,
    ) -> rusqlite::Result<Vec<T>>
    where
        P: Params,
        F: Fn(&Row) -> rusqlite::Result<T>,
    {
        self.conn
            .prepare(statement)?
            .query_map(params, from_row)?
            .collect()
    }
}

fn replace_count(count: &mut u64, new_count: u64) -> bool {
    if *count == new_count {
        return false;
    }
    *count = new_count;
    true
}

fn status_codes(statuses: &[OperationStatus]) -> String {
    statuses
        .iter()
        .map(|s| s.code().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn upsert_profile(tx: &Transaction, profile: &PublicProfile) -> Result<()> {
    tx.execute(
        "\
        INSERT INTO public_profiles (hid, first_name, last_name, profile_picture_url) \
        VALUES (?1, ?2, ?3, ?4) \
        ON CONFLICT(hid) DO UPDATE SET first_name = excluded.first_name, \
        last_name = excluded.last_name, profile_picture_url = excluded.profile_picture_url\
        ",
        (
            profile.hid,
            &profile.first_name,
            &profile.last_name,
            &profile.profile_picture_url,
        ),
    )
    .map_to_invalid_input("Failed to store public profile")?;
    Ok(())
}

fn insert_swap(tx: &Transaction, swap: &SubmarineSwap) -> Result<()> {
    let output = &swap.funding_output;
    tx.execute(
        "\
        INSERT INTO submarine_swaps (houston_uuid, invoice, receiver_alias, \
        receiver_network_addresses, receiver_public_key, funding_output_address, \
        funding_output_amount_in_satoshis, funding_output_debt_type, \
        funding_output_debt_amount_in_satoshis, funding_output_confirmations_needed, \
        funding_output_user_lock_time, funding_output_user_refund_address, \
        funding_output_user_refund_address_path, funding_output_user_refund_address_version, \
        funding_output_server_payment_hash_in_hex, funding_output_server_public_key_in_hex, \
        funding_output_script_version, funding_output_expiration_in_blocks, \
        funding_output_user_public_key, funding_output_user_public_key_path, \
        funding_output_muun_public_key, funding_output_muun_public_key_path, \
        sweep_fee_in_satoshis, lightning_fee_in_satoshis, expires_at, payed_at, preimage_in_hex) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
        ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)\
        ",
        params![
            swap.houston_uuid,
            swap.invoice,
            swap.receiver.alias,
            swap.receiver.network_addresses,
            swap.receiver.public_key,
            output.output_address,
            output.output_amount_in_satoshis,
            output.debt_type.as_str(),
            output.debt_amount_in_satoshis,
            output.confirmations_needed,
            output.user_lock_time,
            output.user_refund_address.address,
            output.user_refund_address.derivation_path,
            output.user_refund_address.version,
            output.server_payment_hash_hex(),
            output.server_public_key_hex(),
            output.script_version.code(),
            output.expiration_in_blocks,
            output.user_public_key.as_ref().map(|k| &k.serialized),
            output.user_public_key.as_ref().map(|k| &k.derivation_path),
            output.muun_public_key.as_ref().map(|k| &k.serialized),
            output.muun_public_key.as_ref().map(|k| &k.derivation_path),
            swap.fees.map(|f| f.output_padding_in_sats),
            swap.fees.map(|f| f.lightning_in_sats),
            to_db_time(swap.expires_at),
            swap.payed_at.map(to_db_time),
            swap.preimage.as_ref().map(hex::encode),
        ],
    )
    .map_to_invalid_input("Failed to store submarine swap")?;
    Ok(())
}

fn insert_incoming_swap(tx: &Transaction, incoming_swap: &IncomingSwap) -> Result<()> {
    tx.execute(
        "\
        INSERT INTO incoming_swaps (houston_uuid, payment_hash_in_hex, sphinx_packet_in_hex, \
        collect_in_satoshis, payment_amount_in_satoshis, preimage_in_hex) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)\
        ",
        (
            &incoming_swap.houston_uuid,
            incoming_swap.payment_hash_hex(),
            incoming_swap.sphinx_packet.as_ref().map(hex::encode),
            incoming_swap.collect_in_satoshis,
            incoming_swap.payment_amount_in_satoshis,
            incoming_swap.preimage.as_ref().map(hex::encode),
        ),
    )
    .map_to_invalid_input("Failed to store incoming swap")?;
    Ok(())
}

fn insert_htlc(tx: &Transaction, incoming_swap_uuid: &str, htlc: &IncomingSwapHtlc) -> Result<()> {
    tx.execute(
        "\
        INSERT INTO incoming_swap_htlcs (houston_uuid, incoming_swap_houston_uuid, \
        expiration_height, fulfillment_fee_subsidy_in_satoshis, lent_in_satoshis, \
        swap_server_public_key_in_hex, fulfillment_tx_in_hex, address, \
        output_amount_in_satoshis, htlc_tx_in_hex) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)\
        ",
        (
            &htlc.houston_uuid,
            incoming_swap_uuid,
            htlc.expiration_height,
            htlc.fulfillment_fee_subsidy_in_satoshis,
            htlc.lent_in_satoshis,
            hex::encode(&htlc.swap_server_public_key),
            htlc.fulfillment_tx.as_ref().map(hex::encode),
            &htlc.address,
            htlc.output_amount_in_satoshis,
            hex::encode(&htlc.htlc_tx),
        ),
    )
    .map_to_invalid_input("Failed to store incoming swap htlc")?;
    Ok(())
}

fn insert_operation_row(tx: &Transaction, operation: &Operation) -> Result<()> {
    tx.execute(
        "\
        INSERT INTO operations (hid, direction, is_external, sender_profile_hid, \
        sender_is_external, receiver_profile_hid, receiver_is_external, receiver_address, \
        receiver_address_derivation_path, amount_in_satoshis, \
        amount_in_input_currency_minor_units, amount_in_input_currency_code, \
        amount_in_primary_currency_minor_units, amount_in_primary_currency_code, \
        fee_in_satoshis, fee_in_input_currency_minor_units, fee_in_input_currency_code, \
        fee_in_primary_currency_minor_units, fee_in_primary_currency_code, confirmations, hash, \
        description, status, creation_date, exchange_rate_window_hid, \
        submarine_swap_houston_uuid, incoming_swap_houston_uuid, is_rbf) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
        ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28)\
        ",
        params![
            operation.hid,
            operation.direction.code(),
            operation.is_external,
            operation.sender_profile.as_ref().map(|p| p.hid),
            operation.sender_is_external,
            operation.receiver_profile.as_ref().map(|p| p.hid),
            operation.receiver_is_external,
            operation.receiver_address,
            operation.receiver_address_derivation_path,
            operation.amount.in_satoshis,
            operation.amount.in_input_currency.minor_units,
            operation.amount.in_input_currency.currency_code,
            operation.amount.in_primary_currency.minor_units,
            operation.amount.in_primary_currency.currency_code,
            operation.fee.in_satoshis,
            operation.fee.in_input_currency.minor_units,
            operation.fee.in_input_currency.currency_code,
            operation.fee.in_primary_currency.minor_units,
            operation.fee.in_primary_currency.currency_code,
            operation.confirmations,
            operation.hash,
            operation.description,
            operation.status.code(),
            to_db_time(operation.creation_date),
            operation.exchange_rate_window_hid,
            operation.swap().map(|s| &s.houston_uuid),
            operation.incoming_swap().map(|s| &s.houston_uuid),
            operation.is_rbf,
        ],
    )
    .map_to_invalid_input("Failed to store operation")?;
    Ok(())
}

fn monetary_amount_from_row(
    row: &Row,
    minor_units_column: &str,
    currency_code_column: &str,
) -> rusqlite::Result<MonetaryAmount> {
    Ok(MonetaryAmount::new(
        row.get::<_, u64>(minor_units_column)?,
        row.get::<_, String>(currency_code_column)?,
    ))
}

fn optional_time_from_row(row: &Row, column: &str) -> rusqlite::Result<Option<SystemTime>> {
    let time: Option<DateTime<Utc>> = row.get(column)?;
    Ok(time.map(from_db_time))
}

fn profile_columns_from_row(row: &Row, prefix: &str) -> rusqlite::Result<ProfileColumns> {
    Ok(ProfileColumns {
        id: row.get(format!("{prefix}_profile_id").as_str())?,
        hid: row.get(format!("{prefix}_profile_hid").as_str())?,
        first_name: row.get(format!("{prefix}_profile_first_name").as_str())?,
        last_name: row.get(format!("{prefix}_profile_last_name").as_str())?,
        profile_picture_url: row.get(format!("{prefix}_profile_picture_url").as_str())?,
    })
}

fn swap_columns_from_row(row: &Row) -> rusqlite::Result<SwapColumns> {
    Ok(SwapColumns {
        id: row.get("swap_id")?,
        uuid: row.get("swap_uuid")?,
        invoice: row.get("swap_invoice")?,
        receiver_alias: row.get("swap_receiver_alias")?,
        receiver_network_addresses: row.get("swap_receiver_network_addresses")?,
        receiver_public_key: row.get("swap_receiver_public_key")?,
        funding_output: FundingOutputColumns {
            address: row.get("funding_output_address")?,
            amount_in_satoshis: row.get("funding_output_amount_in_satoshis")?,
            debt_type: row.get("funding_output_debt_type")?,
            debt_amount_in_satoshis: row.get("funding_output_debt_amount_in_satoshis")?,
            confirmations_needed: row.get("funding_output_confirmations_needed")?,
            user_lock_time: row.get("funding_output_user_lock_time")?,
            user_refund_address: row.get("funding_output_user_refund_address")?,
            user_refund_address_path: row.get("funding_output_user_refund_address_path")?,
            user_refund_address_version: row.get("funding_output_user_refund_address_version")?,
            server_payment_hash_in_hex: row.get("funding_output_server_payment_hash_in_hex")?,
            server_public_key_in_hex: row.get("funding_output_server_public_key_in_hex")?,
            script_version: row.get("funding_output_script_version")?,
            expiration_in_blocks: row.get("funding_output_expiration_in_blocks")?,
            user_public_key: row.get("funding_output_user_public_key")?,
            user_public_key_path: row.get("funding_output_user_public_key_path")?,
            muun_public_key: row.get("funding_output_muun_public_key")?,
            muun_public_key_path: row.get("funding_output_muun_public_key_path")?,
        },
        sweep_fee_in_satoshis: row.get("swap_sweep_fee_in_satoshis")?,
        lightning_fee_in_satoshis: row.get("swap_lightning_fee_in_satoshis")?,
        expires_at: optional_time_from_row(row, "swap_expires_at")?,
        payed_at: optional_time_from_row(row, "swap_payed_at")?,
        preimage_in_hex: row.get("swap_preimage_in_hex")?,
    })
}

fn incoming_swap_columns_from_row(row: &Row) -> rusqlite::Result<IncomingSwapColumns> {
    Ok(IncomingSwapColumns {
        id: row.get("incoming_swap_id")?,
        uuid: row.get("incoming_swap_uuid")?,
        payment_hash_in_hex: row.get("incoming_swap_payment_hash_in_hex")?,
        sphinx_packet_in_hex: row.get("incoming_swap_sphinx_packet_in_hex")?,
        collect_in_satoshis: row.get("incoming_swap_collect_in_satoshis")?,
        payment_amount_in_satoshis: row.get("incoming_swap_payment_amount_in_satoshis")?,
        preimage_in_hex: row.get("incoming_swap_preimage_in_hex")?,
    })
}

fn htlc_columns_from_row(row: &Row) -> rusqlite::Result<HtlcColumns> {
    Ok(HtlcColumns {
        id: row.get("htlc_id")?,
        uuid: row.get("htlc_uuid")?,
        expiration_height: row.get("htlc_expiration_height")?,
        fulfillment_fee_subsidy_in_satoshis: row
            .get("htlc_fulfillment_fee_subsidy_in_satoshis")?,
        lent_in_satoshis: row.get("htlc_lent_in_satoshis")?,
        swap_server_public_key_in_hex: row.get("htlc_swap_server_public_key_in_hex")?,
        fulfillment_tx_in_hex: row.get("htlc_fulfillment_tx_in_hex")?,
        address: row.get("htlc_address")?,
        output_amount_in_satoshis: row.get("htlc_output_amount_in_satoshis")?,
        htlc_tx_in_hex: row.get("htlc_tx_in_hex")?,
    })
}

fn operation_row_from_row(row: &Row) -> rusqlite::Result<OperationRow> {
    let creation_date: DateTime<Utc> = row.get("creation_date")?;
    Ok(OperationRow {
        id: row.get("id")?,
        hid: row.get("hid")?,
        direction: row.get("direction")?,
        is_external: row.get("is_external")?,
        sender_is_external: row.get("sender_is_external")?,
        receiver_is_external: row.get("receiver_is_external")?,
        receiver_address: row.get("receiver_address")?,
        receiver_address_derivation_path: row.get("receiver_address_derivation_path")?,
        amount_in_satoshis: row.get("amount_in_satoshis")?,
        amount_in_input_currency: monetary_amount_from_row(
            row,
            "amount_in_input_currency_minor_units",
            "amount_in_input_currency_code",
        )?,
        amount_in_primary_currency: monetary_amount_from_row(
            row,
            "amount_in_primary_currency_minor_units",
            "amount_in_primary_currency_code",
        )?,
        fee_in_satoshis: row.get("fee_in_satoshis")?,
        fee_in_input_currency: monetary_amount_from_row(
            row,
            "fee_in_input_currency_minor_units",
            "fee_in_input_currency_code",
        )?,
        fee_in_primary_currency: monetary_amount_from_row(
            row,
            "fee_in_primary_currency_minor_units",
            "fee_in_primary_currency_code",
        )?,
        confirmations: row.get("confirmations")?,
        hash: row.get("hash")?,
        description: row.get("description")?,
        status: row.get("status")?,
        creation_date: from_db_time(creation_date),
        exchange_rate_window_hid: row.get("exchange_rate_window_hid")?,
        is_rbf: row.get("is_rbf")?,
        sender_profile: profile_columns_from_row(row, "sender")?,
        receiver_profile: profile_columns_from_row(row, "receiver")?,
        swap: swap_columns_from_row(row)?,
        incoming_swap: incoming_swap_columns_from_row(row)?,
        htlc: htlc_columns_from_row(row)?,
    })
}
