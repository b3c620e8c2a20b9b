use crate::errors::Result;
use perro::{ensure, invalid_input};
use sha2::{Digest, Sha256};

/// The on-chain HTLC the swap server funds towards the user for an incoming swap.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IncomingSwapHtlc {
    /// Local id. `None` until persisted.
    pub id: Option<i64>,
    pub houston_uuid: String,
    pub expiration_height: u64,
    pub fulfillment_fee_subsidy_in_satoshis: u64,
    pub lent_in_satoshis: u64,
    pub swap_server_public_key: Vec<u8>,
    pub fulfillment_tx: Option<Vec<u8>>,
    pub address: String,
    pub output_amount_in_satoshis: u64,
    pub htlc_tx: Vec<u8>,
}

impl IncomingSwapHtlc {
    pub fn blocks_until_expiration(&self, current_height: u64) -> u64 {
        self.expiration_height.saturating_sub(current_height)
    }

    pub fn is_fulfilled(&self) -> bool {
        self.fulfillment_tx.is_some()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IncomingSwapState {
    /// Known to the backend, but no HTLC has been offered yet.
    Registered,
    /// The swap server funded an HTLC that the user can claim until `expiration_height`.
    HtlcOffered { expiration_height: u64 },
    Fulfilled,
}

/// A lightning payment received through the swap server and settled on-chain.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct IncomingSwap {
    /// Local id. `None` until persisted.
    pub id: Option<i64>,
    pub houston_uuid: String,
    pub payment_hash: [u8; 32],
    /// `None` for fully lent swaps.
    pub htlc: Option<IncomingSwapHtlc>,
    pub sphinx_packet: Option<Vec<u8>>,
    pub collect_in_satoshis: u64,
    pub payment_amount_in_satoshis: u64,
    pub preimage: Option<Vec<u8>>,
}

impl IncomingSwap {
    pub fn state(&self) -> IncomingSwapState {
        if self.is_fulfilled() {
            return IncomingSwapState::Fulfilled;
        }
        match &self.htlc {
            Some(htlc) => IncomingSwapState::HtlcOffered {
                expiration_height: htlc.expiration_height,
            },
            None => IncomingSwapState::Registered,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.preimage.is_some() || self.htlc.as_ref().map_or(false, |h| h.is_fulfilled())
    }

    pub fn verify_preimage(&self, preimage: &[u8]) -> bool {
        Sha256::digest(preimage)[..] == self.payment_hash[..]
    }

    pub fn payment_hash_hex(&self) -> String {
        hex::encode(self.payment_hash)
    }

    pub fn with_preimage(mut self, preimage: Vec<u8>) -> Result<Self> {
        ensure!(
            self.verify_preimage(&preimage),
            invalid_input(format!(
                "Preimage doesn't match payment hash of incoming swap {}",
                self.houston_uuid
            ))
        );
        self.preimage = Some(preimage);
        Ok(self)
    }

    pub fn with_fulfillment_tx(mut self, fulfillment_tx: Vec<u8>) -> Result<Self> {
        let htlc = self.htlc.as_mut().ok_or_else(|| {
            invalid_input(format!(
                "Incoming swap {} has no htlc to fulfill",
                self.houston_uuid
            ))
        })?;
        htlc.fulfillment_tx = Some(fulfillment_tx);
        Ok(self)
    }
}
