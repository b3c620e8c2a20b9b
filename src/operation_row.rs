//! Flat, column-per-field form of an [`Operation`] as produced by the persistence layer.
//!
//! A row joins the operation with its optional profiles, swap, incoming swap and htlc. Each of
//! those groups is keyed by its local id: if the id is null the whole group is absent, otherwise
//! every required column of the group must be present. Anything else means the stored data is
//! corrupt and is reported as a permanent failure.

use crate::amount::{BitcoinAmount, MonetaryAmount};
use crate::errors::Result;
use crate::incoming_swap::{IncomingSwap, IncomingSwapHtlc};
use crate::operation::{Operation, OperationDirection, OperationStatus};
use crate::swap::fees::SubmarineSwapFees;
use crate::swap::funding_output::{
    DerivedPublicKey, RefundAddress, ScriptVersion, SubmarineSwapFundingOutput,
};
use crate::swap::{DebtType, SubmarineSwap, SubmarineSwapReceiver};
use crate::user::PublicProfile;
use perro::{invalid_input, permanent_failure, MapToError, OptionToError};
use std::str::FromStr;
use std::time::SystemTime;

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct ProfileColumns {
    pub id: Option<i64>,
    pub hid: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct FundingOutputColumns {
    pub address: Option<String>,
    pub amount_in_satoshis: Option<i64>,
    pub debt_type: Option<String>,
    pub debt_amount_in_satoshis: Option<i64>,
    pub confirmations_needed: Option<i64>,
    pub user_lock_time: Option<i64>,
    pub user_refund_address: Option<String>,
    pub user_refund_address_path: Option<String>,
    pub user_refund_address_version: Option<i64>,
    pub server_payment_hash_in_hex: Option<String>,
    pub server_public_key_in_hex: Option<String>,
    pub script_version: Option<i64>,
    pub expiration_in_blocks: Option<i64>,
    pub user_public_key: Option<String>,
    pub user_public_key_path: Option<String>,
    pub muun_public_key: Option<String>,
    pub muun_public_key_path: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct SwapColumns {
    pub id: Option<i64>,
    pub uuid: Option<String>,
    pub invoice: Option<String>,
    pub receiver_alias: Option<String>,
    pub receiver_network_addresses: Option<String>,
    pub receiver_public_key: Option<String>,
    pub funding_output: FundingOutputColumns,
    pub sweep_fee_in_satoshis: Option<i64>,
    pub lightning_fee_in_satoshis: Option<i64>,
    pub expires_at: Option<SystemTime>,
    pub payed_at: Option<SystemTime>,
    pub preimage_in_hex: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct IncomingSwapColumns {
    pub id: Option<i64>,
    pub uuid: Option<String>,
    pub payment_hash_in_hex: Option<String>,
    pub sphinx_packet_in_hex: Option<String>,
    pub collect_in_satoshis: Option<i64>,
    pub payment_amount_in_satoshis: Option<i64>,
    pub preimage_in_hex: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct HtlcColumns {
    pub id: Option<i64>,
    pub uuid: Option<String>,
    pub expiration_height: Option<i64>,
    pub fulfillment_fee_subsidy_in_satoshis: Option<i64>,
    pub lent_in_satoshis: Option<i64>,
    pub swap_server_public_key_in_hex: Option<String>,
    pub fulfillment_tx_in_hex: Option<String>,
    pub address: Option<String>,
    pub output_amount_in_satoshis: Option<i64>,
    pub htlc_tx_in_hex: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OperationRow {
    pub id: Option<i64>,
    pub hid: i64,
    pub direction: i64,
    pub is_external: bool,
    pub sender_is_external: bool,
    pub receiver_is_external: bool,
    pub receiver_address: Option<String>,
    pub receiver_address_derivation_path: Option<String>,
    pub amount_in_satoshis: i64,
    pub amount_in_input_currency: MonetaryAmount,
    pub amount_in_primary_currency: MonetaryAmount,
    pub fee_in_satoshis: i64,
    pub fee_in_input_currency: MonetaryAmount,
    pub fee_in_primary_currency: MonetaryAmount,
    pub confirmations: i64,
    pub hash: Option<String>,
    pub description: Option<String>,
    pub status: i64,
    pub creation_date: SystemTime,
    pub exchange_rate_window_hid: i64,
    pub is_rbf: bool,
    pub sender_profile: ProfileColumns,
    pub receiver_profile: ProfileColumns,
    pub swap: SwapColumns,
    pub incoming_swap: IncomingSwapColumns,
    pub htlc: HtlcColumns,
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.ok_or_permanent_failure(format!("Missing required column {column}"))
}

fn to_unsigned<T: TryFrom<i64>>(value: i64, column: &str) -> Result<T> {
    T::try_from(value).map_err(|_| {
        permanent_failure(format!("Out of range value {value} in column {column}"))
    })
}

fn required_unsigned<T: TryFrom<i64>>(value: Option<i64>, column: &str) -> Result<T> {
    to_unsigned(required(value, column)?, column)
}

fn optional_unsigned<T: TryFrom<i64>>(value: Option<i64>, column: &str) -> Result<Option<T>> {
    value.map(|v| to_unsigned(v, column)).transpose()
}

fn to_signed<T: TryInto<i64> + Copy + std::fmt::Display>(value: T, column: &str) -> Result<i64> {
    value
        .try_into()
        .map_err(|_| invalid_input(format!("Value {value} of {column} does not fit a column")))
}

fn decode_hex(value: &str, column: &str) -> Result<Vec<u8>> {
    hex::decode(value).map_to_permanent_failure(format!("Malformed hex in column {column}"))
}

fn decode_optional_hex(value: Option<&str>, column: &str) -> Result<Option<Vec<u8>>> {
    value.map(|v| decode_hex(v, column)).transpose()
}

fn decode_hash(value: &str, column: &str) -> Result<[u8; 32]> {
    let bytes = decode_hex(value, column)?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_to_permanent_failure(format!("Column {column} must hold exactly 32 bytes"))
}

fn required_id(id: Option<i64>, what: &str) -> Result<i64> {
    id.ok_or_invalid_input(format!("{what} has no local id, persist it before flattening"))
}

impl ProfileColumns {
    fn build(self, group: &str) -> Result<Option<PublicProfile>> {
        let Some(id) = self.id else {
            return Ok(None);
        };
        Ok(Some(PublicProfile {
            id: Some(id),
            hid: required(self.hid, &format!("{group}_profile_hid"))?,
            first_name: self.first_name,
            last_name: self.last_name,
            profile_picture_url: self.profile_picture_url,
        }))
    }

    fn from_profile(profile: Option<&PublicProfile>, group: &str) -> Result<Self> {
        let Some(profile) = profile else {
            return Ok(Self::default());
        };
        Ok(Self {
            id: Some(required_id(profile.id, &format!("{group} profile"))?),
            hid: Some(profile.hid),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            profile_picture_url: profile.profile_picture_url.clone(),
        })
    }
}

fn derived_public_key(
    serialized: Option<String>,
    path: Option<String>,
    path_column: &str,
) -> Result<Option<DerivedPublicKey>> {
    let Some(serialized) = serialized else {
        return Ok(None);
    };
    Ok(Some(DerivedPublicKey {
        serialized,
        derivation_path: required(path, path_column)?,
    }))
}

impl FundingOutputColumns {
    fn build(self) -> Result<SubmarineSwapFundingOutput> {
        let debt_type = DebtType::from_str(&required(self.debt_type, "funding_output_debt_type")?)?;
        let script_version = ScriptVersion::from_code(required(
            self.script_version,
            "funding_output_script_version",
        )?)?;
        Ok(SubmarineSwapFundingOutput {
            output_address: required(self.address, "funding_output_address")?,
            output_amount_in_satoshis: optional_unsigned(
                self.amount_in_satoshis,
                "funding_output_amount_in_satoshis",
            )?,
            debt_type,
            debt_amount_in_satoshis: required_unsigned(
                self.debt_amount_in_satoshis,
                "funding_output_debt_amount_in_satoshis",
            )?,
            confirmations_needed: optional_unsigned(
                self.confirmations_needed,
                "funding_output_confirmations_needed",
            )?,
            user_lock_time: optional_unsigned(self.user_lock_time, "funding_output_user_lock_time")?,
            user_refund_address: RefundAddress {
                version: required_unsigned(
                    self.user_refund_address_version,
                    "funding_output_user_refund_address_version",
                )?,
                derivation_path: required(
                    self.user_refund_address_path,
                    "funding_output_user_refund_address_path",
                )?,
                address: required(
                    self.user_refund_address,
                    "funding_output_user_refund_address",
                )?,
            },
            server_payment_hash: decode_hash(
                &required(
                    self.server_payment_hash_in_hex,
                    "funding_output_server_payment_hash_in_hex",
                )?,
                "funding_output_server_payment_hash_in_hex",
            )?,
            server_public_key: decode_hex(
                &required(
                    self.server_public_key_in_hex,
                    "funding_output_server_public_key_in_hex",
                )?,
                "funding_output_server_public_key_in_hex",
            )?,
            script_version,
            expiration_in_blocks: optional_unsigned(
                self.expiration_in_blocks,
                "funding_output_expiration_in_blocks",
            )?,
            user_public_key: derived_public_key(
                self.user_public_key,
                self.user_public_key_path,
                "funding_output_user_public_key_path",
            )?,
            muun_public_key: derived_public_key(
                self.muun_public_key,
                self.muun_public_key_path,
                "funding_output_muun_public_key_path",
            )?,
        })
    }

    fn from_funding_output(output: &SubmarineSwapFundingOutput) -> Result<Self> {
        Ok(Self {
            address: Some(output.output_address.clone()),
            amount_in_satoshis: output
                .output_amount_in_satoshis
                .map(|a| to_signed(a, "funding output amount"))
                .transpose()?,
            debt_type: Some(output.debt_type.to_string()),
            debt_amount_in_satoshis: Some(to_signed(
                output.debt_amount_in_satoshis,
                "funding output debt amount",
            )?),
            confirmations_needed: output.confirmations_needed.map(i64::from),
            user_lock_time: output.user_lock_time.map(i64::from),
            user_refund_address: Some(output.user_refund_address.address.clone()),
            user_refund_address_path: Some(output.user_refund_address.derivation_path.clone()),
            user_refund_address_version: Some(i64::from(output.user_refund_address.version)),
            server_payment_hash_in_hex: Some(output.server_payment_hash_hex()),
            server_public_key_in_hex: Some(output.server_public_key_hex()),
            script_version: Some(output.script_version.code()),
            expiration_in_blocks: output.expiration_in_blocks.map(i64::from),
            user_public_key: output.user_public_key.as_ref().map(|k| k.serialized.clone()),
            user_public_key_path: output
                .user_public_key
                .as_ref()
                .map(|k| k.derivation_path.clone()),
            muun_public_key: output.muun_public_key.as_ref().map(|k| k.serialized.clone()),
            muun_public_key_path: output
                .muun_public_key
                .as_ref()
                .map(|k| k.derivation_path.clone()),
        })
    }
}

impl SwapColumns {
    fn build(self) -> Result<Option<SubmarineSwap>> {
        let Some(id) = self.id else {
            return Ok(None);
        };
        let receiver = SubmarineSwapReceiver {
            alias: self.receiver_alias,
            network_addresses: required(
                self.receiver_network_addresses,
                "swap_receiver_network_addresses",
            )?,
            public_key: required(self.receiver_public_key, "swap_receiver_public_key")?,
        };
        let fees = match self.sweep_fee_in_satoshis {
            Some(sweep_fee) => Some(SubmarineSwapFees::new(
                required_unsigned(self.lightning_fee_in_satoshis, "swap_lightning_fee_in_satoshis")?,
                to_unsigned(sweep_fee, "swap_sweep_fee_in_satoshis")?,
            )),
            None => None,
        };
        Ok(Some(SubmarineSwap {
            id: Some(id),
            houston_uuid: required(self.uuid, "swap_uuid")?,
            invoice: required(self.invoice, "swap_invoice")?,
            receiver,
            funding_output: self.funding_output.build()?,
            fees,
            expires_at: required(self.expires_at, "swap_expires_at")?,
            payed_at: self.payed_at,
            preimage: decode_optional_hex(self.preimage_in_hex.as_deref(), "swap_preimage_in_hex")?,
            best_route_fees: None,
            funding_output_policies: None,
        }))
    }

    fn from_swap(swap: Option<&SubmarineSwap>) -> Result<Self> {
        let Some(swap) = swap else {
            return Ok(Self::default());
        };
        Ok(Self {
            id: Some(required_id(swap.id, "Swap")?),
            uuid: Some(swap.houston_uuid.clone()),
            invoice: Some(swap.invoice.clone()),
            receiver_alias: swap.receiver.alias.clone(),
            receiver_network_addresses: Some(swap.receiver.network_addresses.clone()),
            receiver_public_key: Some(swap.receiver.public_key.clone()),
            funding_output: FundingOutputColumns::from_funding_output(&swap.funding_output)?,
            sweep_fee_in_satoshis: swap
                .fees
                .map(|f| to_signed(f.output_padding_in_sats, "swap sweep fee"))
                .transpose()?,
            lightning_fee_in_satoshis: swap
                .fees
                .map(|f| to_signed(f.lightning_in_sats, "swap lightning fee"))
                .transpose()?,
            expires_at: Some(swap.expires_at),
            payed_at: swap.payed_at,
            preimage_in_hex: swap.preimage.as_ref().map(hex::encode),
        })
    }
}

impl HtlcColumns {
    fn build(self) -> Result<Option<IncomingSwapHtlc>> {
        let Some(id) = self.id else {
            return Ok(None);
        };
        Ok(Some(IncomingSwapHtlc {
            id: Some(id),
            houston_uuid: required(self.uuid, "htlc_uuid")?,
            expiration_height: required_unsigned(
                self.expiration_height,
                "htlc_expiration_height",
            )?,
            fulfillment_fee_subsidy_in_satoshis: required_unsigned(
                self.fulfillment_fee_subsidy_in_satoshis,
                "htlc_fulfillment_fee_subsidy_in_satoshis",
            )?,
            lent_in_satoshis: required_unsigned(self.lent_in_satoshis, "htlc_lent_in_satoshis")?,
            swap_server_public_key: decode_hex(
                &required(
                    self.swap_server_public_key_in_hex,
                    "htlc_swap_server_public_key_in_hex",
                )?,
                "htlc_swap_server_public_key_in_hex",
            )?,
            fulfillment_tx: decode_optional_hex(
                self.fulfillment_tx_in_hex.as_deref(),
                "htlc_fulfillment_tx_in_hex",
            )?,
            address: required(self.address, "htlc_address")?,
            output_amount_in_satoshis: required_unsigned(
                self.output_amount_in_satoshis,
                "htlc_output_amount_in_satoshis",
            )?,
            htlc_tx: decode_hex(
                &required(self.htlc_tx_in_hex, "htlc_tx_in_hex")?,
                "htlc_tx_in_hex",
            )?,
        }))
    }

    fn from_htlc(htlc: Option<&IncomingSwapHtlc>) -> Result<Self> {
        let Some(htlc) = htlc else {
            return Ok(Self::default());
        };
        Ok(Self {
            id: Some(required_id(htlc.id, "Htlc")?),
            uuid: Some(htlc.houston_uuid.clone()),
            expiration_height: Some(to_signed(htlc.expiration_height, "htlc expiration height")?),
            fulfillment_fee_subsidy_in_satoshis: Some(to_signed(
                htlc.fulfillment_fee_subsidy_in_satoshis,
                "htlc fulfillment fee subsidy",
            )?),
            lent_in_satoshis: Some(to_signed(htlc.lent_in_satoshis, "htlc lent amount")?),
            swap_server_public_key_in_hex: Some(hex::encode(&htlc.swap_server_public_key)),
            fulfillment_tx_in_hex: htlc.fulfillment_tx.as_ref().map(hex::encode),
            address: Some(htlc.address.clone()),
            output_amount_in_satoshis: Some(to_signed(
                htlc.output_amount_in_satoshis,
                "htlc output amount",
            )?),
            htlc_tx_in_hex: Some(hex::encode(&htlc.htlc_tx)),
        })
    }
}

impl IncomingSwapColumns {
    fn build(self, htlc: Option<IncomingSwapHtlc>) -> Result<Option<IncomingSwap>> {
        let Some(id) = self.id else {
            if htlc.is_some() {
                return Err(permanent_failure("Found an htlc without an incoming swap"));
            }
            return Ok(None);
        };
        Ok(Some(IncomingSwap {
            id: Some(id),
            houston_uuid: required(self.uuid, "incoming_swap_uuid")?,
            payment_hash: decode_hash(
                &required(self.payment_hash_in_hex, "incoming_swap_payment_hash_in_hex")?,
                "incoming_swap_payment_hash_in_hex",
            )?,
            htlc,
            sphinx_packet: decode_optional_hex(
                self.sphinx_packet_in_hex.as_deref(),
                "incoming_swap_sphinx_packet_in_hex",
            )?,
            collect_in_satoshis: required_unsigned(
                self.collect_in_satoshis,
                "incoming_swap_collect_in_satoshis",
            )?,
            payment_amount_in_satoshis: required_unsigned(
                self.payment_amount_in_satoshis,
                "incoming_swap_payment_amount_in_satoshis",
            )?,
            preimage: decode_optional_hex(
                self.preimage_in_hex.as_deref(),
                "incoming_swap_preimage_in_hex",
            )?,
        }))
    }

    fn from_incoming_swap(incoming_swap: Option<&IncomingSwap>) -> Result<Self> {
        let Some(incoming_swap) = incoming_swap else {
            return Ok(Self::default());
        };
        Ok(Self {
            id: Some(required_id(incoming_swap.id, "Incoming swap")?),
            uuid: Some(incoming_swap.houston_uuid.clone()),
            payment_hash_in_hex: Some(incoming_swap.payment_hash_hex()),
            sphinx_packet_in_hex: incoming_swap.sphinx_packet.as_ref().map(hex::encode),
            collect_in_satoshis: Some(to_signed(
                incoming_swap.collect_in_satoshis,
                "incoming swap collect amount",
            )?),
            payment_amount_in_satoshis: Some(to_signed(
                incoming_swap.payment_amount_in_satoshis,
                "incoming swap payment amount",
            )?),
            preimage_in_hex: incoming_swap.preimage.as_ref().map(hex::encode),
        })
    }
}

/// Builds a validated [`Operation`] out of a flat row.
pub fn reconstruct(row: OperationRow) -> Result<Operation> {
    if row.swap.id.is_some() && row.incoming_swap.id.is_some() {
        return Err(permanent_failure(format!(
            "Operation {} has both a swap and an incoming swap",
            row.hid
        )));
    }
    let id = required(row.id, "operation_id")?;
    let direction = OperationDirection::from_code(row.direction)?;
    let status = OperationStatus::from_code(row.status)?;

    let sender_profile = row.sender_profile.build("sender")?;
    let receiver_profile = row.receiver_profile.build("receiver")?;
    let swap = row.swap.build()?;
    let htlc = row.htlc.build()?;
    let incoming_swap = row.incoming_swap.build(htlc)?;

    let mut operation = Operation::new(
        row.hid,
        direction,
        BitcoinAmount::new(
            to_unsigned(row.amount_in_satoshis, "amount_in_satoshis")?,
            row.amount_in_input_currency,
            row.amount_in_primary_currency,
        ),
        BitcoinAmount::new(
            to_unsigned(row.fee_in_satoshis, "fee_in_satoshis")?,
            row.fee_in_input_currency,
            row.fee_in_primary_currency,
        ),
        status,
        row.creation_date,
        row.exchange_rate_window_hid,
    );
    operation.id = Some(id);
    operation.is_external = row.is_external;
    operation.sender_profile = sender_profile;
    operation.sender_is_external = row.sender_is_external;
    operation.receiver_profile = receiver_profile;
    operation.receiver_is_external = row.receiver_is_external;
    operation.receiver_address = row.receiver_address;
    operation.receiver_address_derivation_path = row.receiver_address_derivation_path;
    operation.confirmations = to_unsigned(row.confirmations, "confirmations")?;
    operation.hash = row.hash;
    operation.description = row.description;
    operation.is_rbf = row.is_rbf;

    Ok(match (swap, incoming_swap) {
        (Some(swap), None) => operation.with_swap(swap),
        (None, Some(incoming_swap)) => operation.with_incoming_swap(incoming_swap),
        (None, None) => operation,
        (Some(_), Some(_)) => {
            return Err(permanent_failure(format!(
                "Operation {} has both a swap and an incoming swap",
                row.hid
            )))
        }
    })
}

impl Operation {
    /// Flattens a persisted operation. Binary fields are encoded as lowercase hex.
    pub fn to_row(&self) -> Result<OperationRow> {
        let incoming_swap = self.incoming_swap();
        Ok(OperationRow {
            id: Some(required_id(self.id, "Operation")?),
            hid: self.hid,
            direction: self.direction.code(),
            is_external: self.is_external,
            sender_is_external: self.sender_is_external,
            receiver_is_external: self.receiver_is_external,
            receiver_address: self.receiver_address.clone(),
            receiver_address_derivation_path: self.receiver_address_derivation_path.clone(),
            amount_in_satoshis: to_signed(self.amount.in_satoshis, "amount")?,
            amount_in_input_currency: self.amount.in_input_currency.clone(),
            amount_in_primary_currency: self.amount.in_primary_currency.clone(),
            fee_in_satoshis: to_signed(self.fee.in_satoshis, "fee")?,
            fee_in_input_currency: self.fee.in_input_currency.clone(),
            fee_in_primary_currency: self.fee.in_primary_currency.clone(),
            confirmations: to_signed(self.confirmations, "confirmations")?,
            hash: self.hash.clone(),
            description: self.description.clone(),
            status: self.status.code(),
            creation_date: self.creation_date,
            exchange_rate_window_hid: self.exchange_rate_window_hid,
            is_rbf: self.is_rbf,
            sender_profile: ProfileColumns::from_profile(self.sender_profile.as_ref(), "Sender")?,
            receiver_profile: ProfileColumns::from_profile(
                self.receiver_profile.as_ref(),
                "Receiver",
            )?,
            swap: SwapColumns::from_swap(self.swap())?,
            incoming_swap: IncomingSwapColumns::from_incoming_swap(incoming_swap)?,
            htlc: HtlcColumns::from_htlc(incoming_swap.and_then(|s| s.htlc.as_ref()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incoming_swap::tests::{sample_htlc, sample_incoming_swap};
    use crate::operation::tests::sample_operation;
    use crate::swap::tests::sample_swap;
    use perro::Error;

    fn plain_row() -> OperationRow {
        let mut operation = sample_operation(100, OperationDirection::Outgoing);
        operation.id = Some(1);
        operation.to_row().unwrap()
    }

    fn assert_permanent_failure(result: Result<Operation>) {
        assert!(
            matches!(result, Err(Error::PermanentFailure { .. })),
            "expected a permanent failure, got {result:?}"
        );
    }

    fn assert_invalid_input(result: Result<Operation>) {
        assert!(
            matches!(result, Err(Error::InvalidInput { .. })),
            "expected invalid input, got {result:?}"
        );
    }

    fn persisted_swap_operation() -> Operation {
        let mut swap = sample_swap(DebtType::Collect);
        swap.id = Some(3);
        swap.funding_output.user_public_key = Some(DerivedPublicKey {
            serialized: "tpubDAygaiK3eZ9hpC3aQkxtu5fGSTK4P7QKTwwGExN8hGZytVppB8zUxBYMBQULMPP8MSZwXTfAZXmZG3gYzXjrBhoQ7FChbHGgdmRkUWWeS9S".to_string(),
            derivation_path: "m/schema:1'/recovery:1'/change:0/3".to_string(),
        });
        swap.payed_at = Some(SystemTime::UNIX_EPOCH);
        swap.preimage = Some(vec![0xab; 32]);
        let mut operation = sample_operation(200, OperationDirection::Outgoing).with_swap(swap);
        operation.id = Some(2);
        operation.hash = Some("f".repeat(64));
        operation
    }

    fn persisted_incoming_swap_operation() -> Operation {
        let mut htlc = sample_htlc();
        htlc.id = Some(5);
        htlc.fulfillment_tx = Some(vec![0x01, 0x02]);
        let mut incoming_swap = sample_incoming_swap(Some(htlc));
        incoming_swap.id = Some(4);
        let mut operation =
            sample_operation(300, OperationDirection::Incoming).with_incoming_swap(incoming_swap);
        operation.id = Some(3);
        operation.is_rbf = true;
        operation
    }

    #[test]
    fn test_receiver_profile_only() {
        let mut row = plain_row();
        row.receiver_profile = ProfileColumns {
            id: Some(7),
            hid: Some(70),
            first_name: Some("Satoshi".to_string()),
            last_name: None,
            profile_picture_url: None,
        };

        let operation = reconstruct(row).unwrap();
        assert!(operation.sender_profile.is_none());
        assert_eq!(operation.receiver_profile.as_ref().unwrap().id, Some(7));
        assert_eq!(operation.receiver_profile.as_ref().unwrap().hid, 70);
        assert!(operation.swap().is_none());
        assert!(operation.incoming_swap().is_none());
    }

    #[test]
    fn test_swap_with_missing_funding_address() {
        let mut row = persisted_swap_operation().to_row().unwrap();
        row.swap.funding_output.address = None;
        match reconstruct(row) {
            Err(Error::PermanentFailure { msg }) => assert!(msg.contains("funding_output_address")),
            result => panic!("expected a permanent failure, got {result:?}"),
        }
    }

    #[test]
    fn test_round_trip() {
        for operation in [
            persisted_swap_operation(),
            persisted_incoming_swap_operation(),
        ] {
            let row = operation.to_row().unwrap();
            assert_eq!(reconstruct(row).unwrap(), operation);
        }

        let mut row = plain_row();
        row.sender_profile = ProfileColumns {
            id: Some(1),
            hid: Some(10),
            ..Default::default()
        };
        let operation = reconstruct(row.clone()).unwrap();
        assert_eq!(operation.to_row().unwrap(), row);
    }

    #[test]
    fn test_hex_fields_are_lowercase() {
        let row = persisted_swap_operation().to_row().unwrap();
        assert_eq!(row.swap.preimage_in_hex, Some("ab".repeat(32)));
        assert_eq!(
            row.swap.funding_output.server_public_key_in_hex,
            Some("02".repeat(33))
        );

        let row = persisted_incoming_swap_operation().to_row().unwrap();
        assert_eq!(row.htlc.fulfillment_tx_in_hex, Some("0102".to_string()));
        assert_eq!(row.htlc.htlc_tx_in_hex, Some("deadbeef".to_string()));

        let mut upper = row.clone();
        upper.htlc.htlc_tx_in_hex = Some("DEADBEEF".to_string());
        let htlc_tx = reconstruct(upper)
            .unwrap()
            .incoming_swap()
            .and_then(|s| s.htlc.clone())
            .map(|h| h.htlc_tx);
        assert_eq!(htlc_tx, Some(vec![0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn test_both_swaps_set() {
        let mut row = persisted_swap_operation().to_row().unwrap();
        row.incoming_swap = persisted_incoming_swap_operation()
            .to_row()
            .unwrap()
            .incoming_swap;
        assert_permanent_failure(reconstruct(row));
    }

    #[test]
    fn test_htlc_without_incoming_swap() {
        let mut row = plain_row();
        row.htlc = persisted_incoming_swap_operation().to_row().unwrap().htlc;
        assert_permanent_failure(reconstruct(row));
    }

    #[test]
    fn test_corrupt_columns() {
        let mut row = persisted_incoming_swap_operation().to_row().unwrap();
        row.incoming_swap.payment_hash_in_hex = Some("abcd".to_string());
        assert_permanent_failure(reconstruct(row));

        let mut row = persisted_incoming_swap_operation().to_row().unwrap();
        row.htlc.htlc_tx_in_hex = Some("xyz".to_string());
        assert_permanent_failure(reconstruct(row));

        let mut row = persisted_incoming_swap_operation().to_row().unwrap();
        row.htlc.lent_in_satoshis = None;
        assert_permanent_failure(reconstruct(row));

        let mut row = persisted_swap_operation().to_row().unwrap();
        row.swap.sweep_fee_in_satoshis = Some(10);
        row.swap.lightning_fee_in_satoshis = None;
        assert_permanent_failure(reconstruct(row));

        let mut row = persisted_swap_operation().to_row().unwrap();
        row.swap.funding_output.user_public_key_path = None;
        assert_permanent_failure(reconstruct(row));

        let mut row = plain_row();
        row.sender_profile.id = Some(9);
        assert_permanent_failure(reconstruct(row));

        let mut row = plain_row();
        row.confirmations = -1;
        assert_permanent_failure(reconstruct(row));

        let mut row = plain_row();
        row.id = None;
        assert_permanent_failure(reconstruct(row));
    }

    #[test]
    fn test_unknown_codes() {
        let mut row = persisted_swap_operation().to_row().unwrap();
        row.swap.funding_output.debt_type = Some("BORROW".to_string());
        assert_invalid_input(reconstruct(row));

        let mut row = persisted_swap_operation().to_row().unwrap();
        row.swap.funding_output.script_version = Some(100);
        assert_invalid_input(reconstruct(row));

        let mut row = plain_row();
        row.status = 99;
        assert_invalid_input(reconstruct(row));

        let mut row = plain_row();
        row.direction = 5;
        assert_invalid_input(reconstruct(row));
    }

    #[test]
    fn test_swap_without_fees() {
        let mut row = persisted_swap_operation().to_row().unwrap();
        row.swap.sweep_fee_in_satoshis = None;
        row.swap.lightning_fee_in_satoshis = None;
        let operation = reconstruct(row).unwrap();
        assert_eq!(operation.swap().unwrap().fees, None);
        assert_eq!(operation.swap().unwrap().total_fees_in_sat(), 0);
    }

    #[test]
    fn test_flattening_requires_local_ids() {
        let operation = sample_operation(1, OperationDirection::Incoming);
        assert!(operation.to_row().is_err());

        let mut operation = persisted_swap_operation();
        let mut swap = operation.swap().unwrap().clone();
        swap.id = None;
        operation = operation.with_swap(swap);
        assert!(operation.to_row().is_err());
    }
}
