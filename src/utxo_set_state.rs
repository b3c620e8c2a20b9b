use crate::errors::Result;
use perro::MapToError;
use tokio::sync::watch;

/// Whether the wallet's utxo set can be relied upon.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UtxoSetState {
    /// Every incoming operation is confirmed.
    Confirmed,
    /// Some incoming operation is unconfirmed.
    Pending,
    /// Some unconfirmed incoming operation signals replace-by-fee, so it could still be replaced.
    Rbf,
}

impl UtxoSetState {
    pub fn resolve(rbf_pending_incoming: u64, plain_pending_incoming: u64) -> Self {
        if rbf_pending_incoming > 0 {
            UtxoSetState::Rbf
        } else if plain_pending_incoming > 0 {
            UtxoSetState::Pending
        } else {
            UtxoSetState::Confirmed
        }
    }
}

/// Follows the pending incoming counts and yields a fresh [`UtxoSetState`] when either changes.
#[derive(Clone)]
pub struct UtxoSetStateSelector {
    rbf_pending_incoming: watch::Receiver<u64>,
    plain_pending_incoming: watch::Receiver<u64>,
}

impl UtxoSetStateSelector {
    pub fn new(
        rbf_pending_incoming: watch::Receiver<u64>,
        plain_pending_incoming: watch::Receiver<u64>,
    ) -> Self {
        Self {
            rbf_pending_incoming,
            plain_pending_incoming,
        }
    }

    pub fn current(&self) -> UtxoSetState {
        UtxoSetState::resolve(
            *self.rbf_pending_incoming.borrow(),
            *self.plain_pending_incoming.borrow(),
        )
    }

    /// Waits until a count changes and returns the resulting state.
    ///
    /// Fails once the counts are no longer published, i.e. the store was dropped.
    pub async fn changed(&mut self) -> Result<UtxoSetState> {
        tokio::select! {
            changed = self.rbf_pending_incoming.changed() => changed,
            changed = self.plain_pending_incoming.changed() => changed,
        }
        .map_to_permanent_failure("Pending incoming counts are no longer published")?;

        let rbf = *self.rbf_pending_incoming.borrow_and_update();
        let plain = *self.plain_pending_incoming.borrow_and_update();
        Ok(UtxoSetState::resolve(rbf, plain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(UtxoSetState::resolve(0, 0), UtxoSetState::Confirmed);
        assert_eq!(UtxoSetState::resolve(0, 1), UtxoSetState::Pending);
        assert_eq!(UtxoSetState::resolve(1, 0), UtxoSetState::Rbf);
        assert_eq!(UtxoSetState::resolve(1, 1), UtxoSetState::Rbf);
        assert_eq!(UtxoSetState::resolve(0, 42), UtxoSetState::Pending);
    }

    #[tokio::test]
    async fn test_selector_follows_counts() {
        let (rbf_sender, rbf_receiver) = watch::channel(0);
        let (plain_sender, plain_receiver) = watch::channel(0);
        let mut selector = UtxoSetStateSelector::new(rbf_receiver, plain_receiver);
        assert_eq!(selector.current(), UtxoSetState::Confirmed);

        plain_sender.send(2).unwrap();
        assert_eq!(selector.changed().await.unwrap(), UtxoSetState::Pending);

        rbf_sender.send(1).unwrap();
        assert_eq!(selector.changed().await.unwrap(), UtxoSetState::Rbf);

        rbf_sender.send(0).unwrap();
        plain_sender.send(0).unwrap();
        assert_eq!(selector.changed().await.unwrap(), UtxoSetState::Confirmed);
        assert_eq!(selector.current(), UtxoSetState::Confirmed);
    }

    #[tokio::test]
    async fn test_selector_fails_when_source_is_gone() {
        let (rbf_sender, rbf_receiver) = watch::channel(0);
        let (plain_sender, plain_receiver) = watch::channel(0);
        let mut selector = UtxoSetStateSelector::new(rbf_receiver, plain_receiver);

        drop(rbf_sender);
        drop(plain_sender);
        assert!(selector.changed().await.is_err());
    }
}
