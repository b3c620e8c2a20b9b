use crate::errors::DomainError;
use crate::swap::DebtType;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(PartialEq, Eq, Debug, Clone, Copy, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ScriptVersion {
    V1 = 101,
    V2 = 102,
}

impl ScriptVersion {
    pub fn from_code(code: i64) -> std::result::Result<Self, DomainError> {
        u8::try_from(code)
            .ok()
            .and_then(|c| ScriptVersion::try_from(c).ok())
            .ok_or(DomainError::UnsupportedScriptVersion { version: code })
    }

    pub fn code(self) -> i64 {
        u8::from(self) as i64
    }
}

/// An address of the user's wallet, along with where it was derived from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RefundAddress {
    pub version: u32,
    pub derivation_path: String,
    pub address: String,
}

/// A base58 serialized extended public key and its derivation path.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DerivedPublicKey {
    pub serialized: String,
    pub derivation_path: String,
}

/// The on-chain output that funds an outgoing submarine swap.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SubmarineSwapFundingOutput {
    pub output_address: String,
    /// `None` for amountless invoices until an amount is picked.
    pub output_amount_in_satoshis: Option<u64>,
    pub debt_type: DebtType,
    pub debt_amount_in_satoshis: u64,
    pub confirmations_needed: Option<u32>,
    /// Block height after which a V1 swap can be refunded.
    pub user_lock_time: Option<u32>,
    pub user_refund_address: RefundAddress,
    pub server_payment_hash: [u8; 32],
    pub server_public_key: Vec<u8>,
    pub script_version: ScriptVersion,
    pub expiration_in_blocks: Option<u32>,
    /// Only present for V2 scripts.
    pub user_public_key: Option<DerivedPublicKey>,
    /// Only present for V2 scripts.
    pub muun_public_key: Option<DerivedPublicKey>,
}

impl SubmarineSwapFundingOutput {
    pub fn server_payment_hash_hex(&self) -> String {
        hex::encode(self.server_payment_hash)
    }

    pub fn server_public_key_hex(&self) -> String {
        hex::encode(&self.server_public_key)
    }

    /// Blocks left until a V1 swap can be refunded to the user.
    ///
    /// Returns `None` for V2 scripts, which are refunded collaboratively, or when no lock time is
    /// known.
    pub fn blocks_until_refund(&self, current_height: u32) -> Option<u32> {
        match self.script_version {
            ScriptVersion::V1 => self
                .user_lock_time
                .map(|lock_time| lock_time.saturating_sub(current_height)),
            ScriptVersion::V2 => None,
        }
    }
}
