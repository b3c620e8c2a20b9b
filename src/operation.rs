use crate::amount::BitcoinAmount;
use crate::errors::DomainError;
use crate::incoming_swap::{IncomingSwap, IncomingSwapState};
use crate::swap::SubmarineSwap;
use crate::user::PublicProfile;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::time::SystemTime;

#[derive(PartialEq, Eq, Debug, Clone, Copy, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OperationDirection {
    Incoming = 0,
    Outgoing = 1,
    /// Sent and received by the same user.
    Cyclical = 2,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OperationStatus {
    Created = 0,
    Signing = 1,
    Signed = 2,
    Broadcasted = 3,
    SwapPending = 4,
    SwapRouting = 5,
    SwapOpeningChannel = 6,
    SwapWaitingChannel = 7,
    SwapPayed = 8,
    SwapFailed = 9,
    SwapExpired = 10,
    Confirmed = 11,
    Settled = 12,
    Dropped = 13,
    Failed = 14,
}

impl OperationStatus {
    pub const PENDING: [OperationStatus; 8] = [
        OperationStatus::Created,
        OperationStatus::Signing,
        OperationStatus::Signed,
        OperationStatus::Broadcasted,
        OperationStatus::SwapPending,
        OperationStatus::SwapRouting,
        OperationStatus::SwapOpeningChannel,
        OperationStatus::SwapWaitingChannel,
    ];

    pub fn is_pending(&self) -> bool {
        Self::PENDING.contains(self)
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            OperationStatus::Confirmed | OperationStatus::Settled | OperationStatus::SwapPayed
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            OperationStatus::Dropped
                | OperationStatus::Failed
                | OperationStatus::SwapFailed
                | OperationStatus::SwapExpired
        )
    }
}

macro_rules! impl_code_conversion {
    ($type:ty, $variant:ident) => {
        impl $type {
            pub fn from_code(code: i64) -> std::result::Result<Self, DomainError> {
                u8::try_from(code)
                    .ok()
                    .and_then(|c| <$type>::try_from(c).ok())
                    .ok_or(DomainError::$variant { code })
            }

            pub fn code(self) -> i64 {
                u8::from(self) as i64
            }
        }
    };
}

impl_code_conversion!(OperationDirection, UnknownOperationDirection);
impl_code_conversion!(OperationStatus, UnknownOperationStatus);

/// An operation carries at most one kind of swap.
#[derive(Debug, PartialEq, Eq, Clone)]
enum OperationKind {
    Plain,
    Swap(Box<SubmarineSwap>),
    IncomingSwap(Box<IncomingSwap>),
}

/// Lifecycle of an incoming swap, taking the owning operation into account.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OperationIncomingSwapState {
    Registered,
    HtlcOffered { expiration_height: u64 },
    Fulfilled,
    /// The operation failed before the swap was fulfilled.
    Failed,
}

impl From<IncomingSwapState> for OperationIncomingSwapState {
    fn from(state: IncomingSwapState) -> Self {
        match state {
            IncomingSwapState::Registered => OperationIncomingSwapState::Registered,
            IncomingSwapState::HtlcOffered { expiration_height } => {
                OperationIncomingSwapState::HtlcOffered { expiration_height }
            }
            IncomingSwapState::Fulfilled => OperationIncomingSwapState::Fulfilled,
        }
    }
}

/// A movement of value in or out of the wallet, as confirmed by the backend.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Operation {
    /// Local id. `None` until persisted.
    pub id: Option<i64>,
    pub hid: i64,
    pub direction: OperationDirection,
    pub is_external: bool,
    pub sender_profile: Option<PublicProfile>,
    pub sender_is_external: bool,
    pub receiver_profile: Option<PublicProfile>,
    pub receiver_is_external: bool,
    pub receiver_address: Option<String>,
    pub receiver_address_derivation_path: Option<String>,
    pub amount: BitcoinAmount,
    pub fee: BitcoinAmount,
    pub confirmations: u64,
    pub hash: Option<String>,
    pub description: Option<String>,
    pub status: OperationStatus,
    pub creation_date: SystemTime,
    pub exchange_rate_window_hid: i64,
    pub is_rbf: bool,
    kind: OperationKind,
}

impl Operation {
    pub fn new(
        hid: i64,
        direction: OperationDirection,
        amount: BitcoinAmount,
        fee: BitcoinAmount,
        status: OperationStatus,
        creation_date: SystemTime,
        exchange_rate_window_hid: i64,
    ) -> Self {
        Self {
            id: None,
            hid,
            direction,
            is_external: false,
            sender_profile: None,
            sender_is_external: false,
            receiver_profile: None,
            receiver_is_external: false,
            receiver_address: None,
            receiver_address_derivation_path: None,
            amount,
            fee,
            confirmations: 0,
            hash: None,
            description: None,
            status,
            creation_date,
            exchange_rate_window_hid,
            is_rbf: false,
            kind: OperationKind::Plain,
        }
    }

    /// Attaches an outgoing swap, replacing any swap previously attached.
    pub fn with_swap(mut self, swap: SubmarineSwap) -> Self {
        self.kind = OperationKind::Swap(Box::new(swap));
        self
    }

    /// Attaches an incoming swap, replacing any swap previously attached.
    pub fn with_incoming_swap(mut self, incoming_swap: IncomingSwap) -> Self {
        self.kind = OperationKind::IncomingSwap(Box::new(incoming_swap));
        self
    }

    pub fn swap(&self) -> Option<&SubmarineSwap> {
        match &self.kind {
            OperationKind::Swap(swap) => Some(&**swap),
            _ => None,
        }
    }

    pub fn incoming_swap(&self) -> Option<&IncomingSwap> {
        match &self.kind {
            OperationKind::IncomingSwap(incoming_swap) => Some(&**incoming_swap),
            _ => None,
        }
    }

    pub fn is_incoming(&self) -> bool {
        self.direction == OperationDirection::Incoming
    }

    pub fn is_outgoing(&self) -> bool {
        self.direction == OperationDirection::Outgoing
    }

    pub fn is_cyclical(&self) -> bool {
        self.direction == OperationDirection::Cyclical
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }

    pub fn is_lending_swap(&self) -> bool {
        self.swap().map_or(false, SubmarineSwap::is_lend)
    }

    pub fn is_incoming_swap(&self) -> bool {
        self.incoming_swap().is_some()
    }

    /// Amount plus fee, in the currencies the amounts were snapshotted in.
    ///
    /// Returns `None` if amount and fee were snapshotted in different currencies.
    pub fn total(&self) -> Option<BitcoinAmount> {
        self.amount.checked_add(&self.fee)
    }

    pub fn incoming_swap_state(&self) -> Option<OperationIncomingSwapState> {
        let state = self.incoming_swap()?.state();
        if self.is_failed() && state != IncomingSwapState::Fulfilled {
            return Some(OperationIncomingSwapState::Failed);
        }
        Some(state.into())
    }

    /// Whether a swap of this operation still waits on a preimage or a fulfillment.
    pub fn is_unsettled(&self) -> bool {
        match &self.kind {
            OperationKind::Plain => false,
            OperationKind::Swap(swap) => !swap.is_settled() && !self.is_failed(),
            OperationKind::IncomingSwap(_) => matches!(
                self.incoming_swap_state(),
                Some(OperationIncomingSwapState::Registered)
                    | Some(OperationIncomingSwapState::HtlcOffered { .. })
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::amount::MonetaryAmount;
    use crate::incoming_swap::tests::{sample_htlc, sample_incoming_swap};
    use crate::swap::tests::sample_swap;
    use crate::swap::DebtType;
    use std::time::Duration;

    pub(crate) fn sample_operation(hid: i64, direction: OperationDirection) -> Operation {
        Operation::new(
            hid,
            direction,
            BitcoinAmount::new(
                10_000,
                MonetaryAmount::new(290, "EUR"),
                MonetaryAmount::from_sats(10_000),
            ),
            BitcoinAmount::new(
                250,
                MonetaryAmount::new(7, "EUR"),
                MonetaryAmount::from_sats(250),
            ),
            OperationStatus::Broadcasted,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_690_000_000),
            12,
        )
    }

    #[test]
    fn test_status_codes() {
        for code in 0..15 {
            let status = OperationStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
            let classes = [status.is_pending(), status.is_completed(), status.is_failed()];
            assert_eq!(classes.iter().filter(|c| **c).count(), 1);
        }
        assert_eq!(
            OperationStatus::from_code(15),
            Err(DomainError::UnknownOperationStatus { code: 15 })
        );
        assert_eq!(
            OperationDirection::from_code(-3),
            Err(DomainError::UnknownOperationDirection { code: -3 })
        );
        assert_eq!(
            OperationDirection::from_code(2),
            Ok(OperationDirection::Cyclical)
        );
    }

    #[test]
    fn test_swap_kinds_are_exclusive() {
        let op = sample_operation(1, OperationDirection::Outgoing)
            .with_swap(sample_swap(DebtType::Lend));
        assert!(op.swap().is_some());
        assert!(op.is_lending_swap());

        let op = op.with_incoming_swap(sample_incoming_swap(None));
        assert!(op.swap().is_none());
        assert!(op.incoming_swap().is_some());
        assert!(!op.is_lending_swap());
    }

    #[test]
    fn test_total() {
        let op = sample_operation(1, OperationDirection::Outgoing);
        let total = op.total().unwrap();
        assert_eq!(total.in_satoshis, 10_250);
        assert_eq!(total.in_input_currency, MonetaryAmount::new(297, "EUR"));
    }

    #[test]
    fn test_incoming_swap_state() {
        let plain = sample_operation(1, OperationDirection::Incoming);
        assert_eq!(plain.incoming_swap_state(), None);
        assert!(!plain.is_unsettled());

        let mut op = sample_operation(2, OperationDirection::Incoming)
            .with_incoming_swap(sample_incoming_swap(Some(sample_htlc())));
        assert_eq!(
            op.incoming_swap_state(),
            Some(OperationIncomingSwapState::HtlcOffered {
                expiration_height: 800_144
            })
        );
        assert!(op.is_unsettled());

        op.status = OperationStatus::Failed;
        assert_eq!(
            op.incoming_swap_state(),
            Some(OperationIncomingSwapState::Failed)
        );
        assert!(!op.is_unsettled());
    }
}
