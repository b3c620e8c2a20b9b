use crate::errors::Result;

use perro::MapToError;
use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

const MIGRATION_01_INIT: &str = "
    CREATE TABLE public_profiles (
        id INTEGER NOT NULL PRIMARY KEY,
        hid INTEGER NOT NULL UNIQUE,
        first_name TEXT NULL,
        last_name TEXT NULL,
        profile_picture_url TEXT NULL
    );

    CREATE TABLE submarine_swaps (
        id INTEGER NOT NULL PRIMARY KEY,
        houston_uuid TEXT NOT NULL UNIQUE,
        invoice TEXT NOT NULL,
        receiver_alias TEXT NULL,
        receiver_network_addresses TEXT NOT NULL,
        receiver_public_key TEXT NOT NULL,
        funding_output_address TEXT NOT NULL,
        funding_output_amount_in_satoshis INTEGER NULL,
        funding_output_debt_type TEXT NOT NULL,
        funding_output_debt_amount_in_satoshis INTEGER NOT NULL,
        funding_output_confirmations_needed INTEGER NULL,
        funding_output_user_lock_time INTEGER NULL,
        funding_output_user_refund_address TEXT NOT NULL,
        funding_output_user_refund_address_path TEXT NOT NULL,
        funding_output_user_refund_address_version INTEGER NOT NULL,
        funding_output_server_payment_hash_in_hex TEXT NOT NULL,
        funding_output_server_public_key_in_hex TEXT NOT NULL,
        funding_output_script_version INTEGER NOT NULL,
        funding_output_expiration_in_blocks INTEGER NULL,
        funding_output_user_public_key TEXT NULL,
        funding_output_user_public_key_path TEXT NULL,
        funding_output_muun_public_key TEXT NULL,
        funding_output_muun_public_key_path TEXT NULL,
        sweep_fee_in_satoshis INTEGER NULL,
        lightning_fee_in_satoshis INTEGER NULL,
        expires_at TEXT NOT NULL,
        payed_at TEXT NULL,
        preimage_in_hex TEXT NULL
    );

    CREATE TABLE incoming_swaps (
        id INTEGER NOT NULL PRIMARY KEY,
        houston_uuid TEXT NOT NULL UNIQUE,
        payment_hash_in_hex TEXT NOT NULL,
        sphinx_packet_in_hex TEXT NULL,
        collect_in_satoshis INTEGER NOT NULL,
        payment_amount_in_satoshis INTEGER NOT NULL,
        preimage_in_hex TEXT NULL
    );

    CREATE TABLE incoming_swap_htlcs (
        id INTEGER NOT NULL PRIMARY KEY,
        houston_uuid TEXT NOT NULL UNIQUE,
        incoming_swap_houston_uuid TEXT NOT NULL UNIQUE,
        expiration_height INTEGER NOT NULL,
        fulfillment_fee_subsidy_in_satoshis INTEGER NOT NULL,
        lent_in_satoshis INTEGER NOT NULL,
        swap_server_public_key_in_hex TEXT NOT NULL,
        fulfillment_tx_in_hex TEXT NULL,
        address TEXT NOT NULL,
        output_amount_in_satoshis INTEGER NOT NULL,
        htlc_tx_in_hex TEXT NOT NULL
    );

    CREATE TABLE operations (
        id INTEGER NOT NULL PRIMARY KEY,
        hid INTEGER NOT NULL UNIQUE,
        direction INTEGER NOT NULL,
        is_external INTEGER NOT NULL,
        sender_profile_hid INTEGER NULL,
        sender_is_external INTEGER NOT NULL,
        receiver_profile_hid INTEGER NULL,
        receiver_is_external INTEGER NOT NULL,
        receiver_address TEXT NULL,
        receiver_address_derivation_path TEXT NULL,
        amount_in_satoshis INTEGER NOT NULL,
        amount_in_input_currency_minor_units INTEGER NOT NULL,
        amount_in_input_currency_code TEXT NOT NULL,
        amount_in_primary_currency_minor_units INTEGER NOT NULL,
        amount_in_primary_currency_code TEXT NOT NULL,
        fee_in_satoshis INTEGER NOT NULL,
        fee_in_input_currency_minor_units INTEGER NOT NULL,
        fee_in_input_currency_code TEXT NOT NULL,
        fee_in_primary_currency_minor_units INTEGER NOT NULL,
        fee_in_primary_currency_code TEXT NOT NULL,
        confirmations INTEGER NOT NULL,
        hash TEXT NULL,
        description TEXT NULL,
        status INTEGER NOT NULL,
        creation_date TEXT NOT NULL,
        exchange_rate_window_hid INTEGER NOT NULL,
        submarine_swap_houston_uuid TEXT NULL,
        incoming_swap_houston_uuid TEXT NULL,
        is_rbf INTEGER NOT NULL
    );
";

const MIGRATION_02_PENDING_INCOMING_INDEX: &str = "
    CREATE INDEX operations_pending_incoming ON operations (direction, is_rbf, status);
";

pub(crate) fn migrate(conn: &mut Connection) -> Result<()> {
    migrations()
        .to_latest(conn)
        .map_to_permanent_failure("Failed to migrate the db")
}

fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(MIGRATION_01_INIT),
        M::up(MIGRATION_02_PENDING_INCOMING_INDEX),
    ])
}
