use super::TransactionControl;
use crate::core::{Result, TxError};
use crate::driver::{DriverSession, DriverTransaction};
use log::{debug, warn};
use std::sync::{Arc, Mutex};

/// Underlying driver objects owned by one proxy.
///
/// `transaction` is `Some` exactly while the coordinator transaction is active
/// from the proxy's point of view. Both are `None` after the final close.
pub(crate) struct ProxyState<S: DriverSession> {
    pub(crate) session: Option<S>,
    pub(crate) transaction: Option<S::Transaction>,
}

/// Driver session enlisted with a coordinator transaction.
///
/// Presents the wrapped session's capability surface (see the family adapters
/// in [`crate::driver`]) while:
/// - rejecting `begin_transaction` with [`TxError::ProtocolViolation`]
/// - absorbing `close`
/// - forwarding everything else to the underlying driver transaction, or
///   failing with [`TxError::IllegalState`] when there is none
///
/// Clones share state; the enlistment registry hands out clones of the same
/// proxy for the lifetime of one transaction.
pub struct SessionProxy<S: DriverSession> {
    profile: Arc<str>,
    state: Arc<Mutex<ProxyState<S>>>,
}

impl<S: DriverSession> Clone for SessionProxy<S> {
    fn clone(&self) -> Self {
        Self {
            profile: Arc::clone(&self.profile),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: DriverSession> SessionProxy<S> {
    pub(crate) fn new(session: S, profile: &str) -> Self {
        Self {
            profile: Arc::from(profile),
            state: Arc::new(Mutex::new(ProxyState {
                session: Some(session),
                transaction: None,
            })),
        }
    }

    /// Profile this session was opened for
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Whether both handles refer to the same enlisted proxy
    pub fn same_proxy(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Lifecycle capability bound to this proxy's state
    pub(crate) fn transaction_control(&self) -> TransactionControl<S> {
        TransactionControl::new(Arc::clone(&self.profile), Arc::clone(&self.state))
    }

    /// Forward operation `op` to the underlying driver transaction.
    ///
    /// The driver's result or error is returned unchanged. Without an
    /// underlying transaction the call fails with [`TxError::IllegalState`].
    pub fn invoke<R>(
        &self,
        op: &str,
        f: impl FnOnce(&mut S::Transaction) -> Result<R>,
    ) -> Result<R> {
        let mut state = self.state.lock()?;
        match state.transaction.as_mut() {
            Some(transaction) => f(transaction),
            None => Err(TxError::IllegalState(format!(
                "no underlying transaction to invoke '{}' with (profile '{}')",
                op, self.profile
            ))),
        }
    }
}

impl<S: DriverSession> DriverSession for SessionProxy<S> {
    type Transaction = S::Transaction;

    fn begin_transaction(&mut self) -> Result<Self::Transaction> {
        warn!(
            "Session.begin_transaction called on enlisted session for profile '{}'",
            self.profile
        );
        Err(TxError::ProtocolViolation(format!(
            "Incorrect use of enlisted session ({}): the coordinator controls the transaction, not Session::begin_transaction",
            self.profile
        )))
    }

    fn is_open(&self) -> bool {
        match self.state.lock() {
            Ok(state) => state
                .transaction
                .as_ref()
                .is_some_and(|transaction| transaction.is_open()),
            Err(_) => false,
        }
    }

    /// Released by the coordinator when the transaction ends.
    fn close(&mut self) -> Result<()> {
        debug!(
            "ignoring close on enlisted session for profile '{}'",
            self.profile
        );
        Ok(())
    }
}
