use super::proxy::ProxyState;
use crate::core::{Result, TxError};
use crate::driver::{DriverSession, DriverTransaction};
use log::debug;
use std::sync::{Arc, Mutex};

/// Lifecycle capability over one [`SessionProxy`](super::SessionProxy).
///
/// Only the enlisted resource participant holds one of these; application
/// code never sees it. Every driver failure comes back as
/// [`TxError::TransactionStart`] or [`TxError::TransactionEnd`].
pub struct TransactionControl<S: DriverSession> {
    profile: Arc<str>,
    state: Arc<Mutex<ProxyState<S>>>,
}

impl<S: DriverSession> TransactionControl<S> {
    pub(crate) fn new(profile: Arc<str>, state: Arc<Mutex<ProxyState<S>>>) -> Self {
        Self { profile, state }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Begin the underlying driver transaction and keep it in the proxy.
    pub fn begin_transaction(&self) -> Result<()> {
        let mut state = self.state.lock()?;
        if state.transaction.is_some() {
            return Err(TxError::IllegalState(format!(
                "transaction already active on session for profile '{}'",
                self.profile
            )));
        }
        let session = state.session.as_mut().ok_or_else(|| self.closed_error())?;

        let transaction = session
            .begin_transaction()
            .map_err(|e| TxError::TransactionStart(format!("could not begin transaction: {}", e)))?;
        state.transaction = Some(transaction);

        debug!("began transaction for profile '{}'", self.profile);
        Ok(())
    }

    /// Mark the underlying transaction as successful.
    pub fn success(&self) -> Result<()> {
        let mut state = self.state.lock()?;
        let transaction = state
            .transaction
            .as_mut()
            .ok_or_else(|| self.no_transaction("success"))?;

        transaction.success().map_err(|e| {
            TxError::TransactionEnd(format!("could not mark transaction as successful: {}", e))
        })
    }

    /// Mark the underlying transaction as failed.
    pub fn failure(&self) -> Result<()> {
        let mut state = self.state.lock()?;
        let transaction = state
            .transaction
            .as_mut()
            .ok_or_else(|| self.no_transaction("failure"))?;

        transaction.failure().map_err(|e| {
            TxError::TransactionEnd(format!("could not mark transaction as failed: {}", e))
        })
    }

    /// Close the underlying transaction, then the underlying session.
    ///
    /// Both are cleared even when the driver fails, so neither is leaked or
    /// closed twice. Calling again afterwards is [`TxError::IllegalState`].
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock()?;
        if state.session.is_none() && state.transaction.is_none() {
            return Err(self.closed_error());
        }

        let transaction_closed = match state.transaction.take() {
            Some(mut transaction) => transaction.close(),
            None => Ok(()),
        };
        let session_closed = match state.session.take() {
            Some(mut session) => session.close(),
            None => Ok(()),
        };

        debug!("closed transaction and session for profile '{}'", self.profile);
        transaction_closed
            .and(session_closed)
            .map_err(|e| TxError::TransactionEnd(format!("could not close the transaction: {}", e)))
    }

    pub fn has_transaction(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.transaction.is_some())
            .unwrap_or(false)
    }

    /// True once [`close`](Self::close) has released the session
    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.session.is_none() && state.transaction.is_none())
            .unwrap_or(true)
    }

    fn no_transaction(&self, op: &str) -> TxError {
        TxError::IllegalState(format!(
            "no underlying transaction to invoke '{}' with (profile '{}')",
            op, self.profile
        ))
    }

    fn closed_error(&self) -> TxError {
        TxError::IllegalState(format!(
            "session for profile '{}' is already closed",
            self.profile
        ))
    }
}
