use bitcoin::Network;
use log::LevelFilter;
use operations_core::swap::funding_output::RefundAddress;
use operations_core::swap::SubmarineSwapReceiver;
use operations_core::{
    BitcoinAmount, Config, DebtType, IncomingSwap, IncomingSwapHtlc, MonetaryAmount, Operation,
    OperationDirection, OperationStatus, OperationsCore, ScriptVersion, SubmarineSwap,
    SubmarineSwapFees, SubmarineSwapFundingOutput,
};
use sha2::{Digest, Sha256};
use std::fs;
use std::time::{Duration, SystemTime};

const TEST_PERSISTENCE_ROOT: &str = ".3l_local_test";

#[allow(dead_code)] // not used by all tests
pub const PREIMAGE: [u8; 32] = [42; 32];

/// Starts a core on a fresh directory, one per test so tests can run in parallel.
pub fn setup(test_name: &str) -> OperationsCore {
    let local_persistence_path = format!("{TEST_PERSISTENCE_ROOT}/{test_name}");
    let _ = fs::remove_dir_all(&local_persistence_path);
    fs::create_dir_all(&local_persistence_path).unwrap();

    OperationsCore::new(Config {
        network: Network::Regtest,
        local_persistence_path,
        log_level: LevelFilter::Debug,
    })
    .unwrap()
}

pub fn plain_operation(hid: i64, direction: OperationDirection) -> Operation {
    let amount = BitcoinAmount::new(
        10_000,
        MonetaryAmount::new(290, "EUR"),
        MonetaryAmount::new(290, "EUR"),
    );
    let fee = BitcoinAmount::new(
        250,
        MonetaryAmount::new(7, "EUR"),
        MonetaryAmount::new(7, "EUR"),
    );
    Operation::new(
        hid,
        direction,
        amount,
        fee,
        OperationStatus::Broadcasted,
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        12,
    )
}

#[allow(dead_code)] // not used by all tests
pub fn incoming_swap_operation(hid: i64, uuid: &str, with_htlc: bool) -> Operation {
    let htlc = with_htlc.then(|| IncomingSwapHtlc {
        id: None,
        houston_uuid: format!("{uuid}-htlc"),
        expiration_height: 800_144,
        fulfillment_fee_subsidy_in_satoshis: 0,
        lent_in_satoshis: 0,
        swap_server_public_key: vec![3; 33],
        fulfillment_tx: None,
        address: "bcrt1qexamplehtlcaddress".to_string(),
        output_amount_in_satoshis: 10_000,
        htlc_tx: vec![0xde, 0xad, 0xbe, 0xef],
    });
    let incoming_swap = IncomingSwap {
        id: None,
        houston_uuid: uuid.to_string(),
        payment_hash: Sha256::digest(PREIMAGE).into(),
        htlc,
        sphinx_packet: None,
        collect_in_satoshis: 0,
        payment_amount_in_satoshis: 10_000,
        preimage: None,
    };
    let mut operation = plain_operation(hid, OperationDirection::Incoming);
    operation.status = OperationStatus::SwapPending;
    operation.with_incoming_swap(incoming_swap)
}

#[allow(dead_code)] // not used by all tests
pub fn outgoing_swap_operation(hid: i64, uuid: &str) -> Operation {
    let swap = SubmarineSwap {
        id: None,
        houston_uuid: uuid.to_string(),
        invoice: "lnbcrt10u1pjexample".to_string(),
        receiver: SubmarineSwapReceiver {
            alias: Some("ACINQ".to_string()),
            network_addresses: "[\"1.2.3.4:9735\"]".to_string(),
            public_key: "03864ef025fde8fb587d989186ce6a4a186895ee44a926bfc370e2c366597a3f8f"
                .to_string(),
        },
        funding_output: SubmarineSwapFundingOutput {
            output_address: "bcrt1qexampleoutputaddress".to_string(),
            output_amount_in_satoshis: Some(10_800),
            debt_type: DebtType::None,
            debt_amount_in_satoshis: 0,
            confirmations_needed: Some(0),
            user_lock_time: None,
            user_refund_address: RefundAddress {
                version: 4,
                derivation_path: "m/schema:1'/recovery:1'/external:1/7".to_string(),
                address: "bcrt1qexamplerefundaddress".to_string(),
            },
            server_payment_hash: Sha256::digest(PREIMAGE).into(),
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
    };
    let mut operation = plain_operation(hid, OperationDirection::Outgoing);
    operation.status = OperationStatus::SwapPending;
    operation.with_swap(swap)
}
