// ============================================================================
// Enlistment
// ============================================================================
//
// Hands out at most one SessionProxy (and enlists at most one participant)
// per profile per coordinator transaction. The proxy is cached in the
// transaction's EnlistmentRegistry under ResourceKey::session(profile).
//
// ============================================================================

pub mod registry;

pub use registry::{EnlistmentRegistry, SharedResource};

use crate::core::{ResourceKey, Result, TxError};
use crate::driver::DriverSession;
use crate::transaction::{
    CoordinatorTransaction, SessionProxy, SessionResource, TransactionCoordinator,
};
use log::warn;
use std::sync::Arc;
use tracing::{Level, event, info_span};

/// Enlist `session` for `profile` with the coordinator's current transaction.
///
/// When the profile is already enlisted in this transaction the cached proxy
/// is returned. A supplied session that ends up unused, on a cache hit or on
/// failure, is closed.
pub fn enlist<S>(
    session: S,
    coordinator: &dyn TransactionCoordinator,
    profile: &str,
    resource_name: &str,
) -> Result<SessionProxy<S>>
where
    S: DriverSession + 'static,
{
    let mut supplied = Some(session);
    let result = enlist_with(coordinator, profile, resource_name, || {
        supplied
            .take()
            .ok_or_else(|| TxError::IllegalState("session already consumed".into()))
    });

    // Not consumed: either the profile was already enlisted or enlistment
    // failed before the session was needed.
    if let Some(mut unused) = supplied {
        event!(
            Level::DEBUG,
            profile = profile,
            "closing supplied session that was not enlisted"
        );
        if let Err(err) = unused.close() {
            warn!("closing unused session for profile '{}' failed: {}", profile, err);
        }
    }
    result
}

/// Like [`enlist`], but opens the driver session only on a registry miss.
pub fn enlist_with<S, F>(
    coordinator: &dyn TransactionCoordinator,
    profile: &str,
    resource_name: &str,
    open: F,
) -> Result<SessionProxy<S>>
where
    S: DriverSession + 'static,
    F: FnOnce() -> Result<S>,
{
    let transaction = current_transaction(coordinator, profile)?;
    enlist_in(transaction.as_ref(), profile, resource_name, 0, open)
}

/// Enlist with an explicit transaction context and participant timeout
/// (seconds, 0 for the coordinator default).
pub fn enlist_in<S, F>(
    transaction: &dyn CoordinatorTransaction,
    profile: &str,
    resource_name: &str,
    timeout_secs: u32,
    open: F,
) -> Result<SessionProxy<S>>
where
    S: DriverSession + 'static,
    F: FnOnce() -> Result<S>,
{
    let xid = transaction.xid();
    let span = info_span!("enlist", profile = profile, resource = resource_name, xid = %xid);
    let _guard = span.enter();

    let (proxy, created) = transaction.resources().get_or_try_insert_with(
        ResourceKey::session(profile),
        || {
            let status = transaction.status();
            if !status.can_enlist() {
                return Err(TxError::Enlistment(format!(
                    "cannot enlist profile '{}' with transaction {} in state {}",
                    profile, xid, status
                )));
            }

            let proxy = SessionProxy::new(open()?, profile);
            let participant = SessionResource::new(proxy.transaction_control(), resource_name)
                .with_timeout(timeout_secs);

            if let Err(err) = transaction.enlist_resource(Arc::new(participant)) {
                if let Err(close_err) = proxy.transaction_control().close() {
                    warn!(
                        "closing session for profile '{}' after failed enlistment: {}",
                        profile, close_err
                    );
                }
                return Err(match err {
                    TxError::Enlistment(_) | TxError::TransactionStart(_) => err,
                    other => TxError::Enlistment(format!(
                        "coordinator rejected resource '{}': {}",
                        resource_name, other
                    )),
                });
            }
            Ok(proxy)
        },
    )?;

    if created {
        event!(Level::INFO, "enlisted session proxy");
    } else {
        event!(Level::DEBUG, "reusing enlisted session proxy");
    }
    Ok(proxy)
}

/// Proxy already enlisted for `profile` in the current transaction, if any.
pub fn lookup<S>(
    coordinator: &dyn TransactionCoordinator,
    profile: &str,
) -> Result<Option<SessionProxy<S>>>
where
    S: DriverSession + 'static,
{
    match coordinator.current_transaction()? {
        Some(transaction) => lookup_in(transaction.as_ref(), profile),
        None => Ok(None),
    }
}

pub fn lookup_in<S>(
    transaction: &dyn CoordinatorTransaction,
    profile: &str,
) -> Result<Option<SessionProxy<S>>>
where
    S: DriverSession + 'static,
{
    transaction.resources().get(&ResourceKey::session(profile))
}

pub(crate) fn current_transaction(
    coordinator: &dyn TransactionCoordinator,
    profile: &str,
) -> Result<Arc<dyn CoordinatorTransaction>> {
    coordinator.current_transaction()?.ok_or_else(|| {
        TxError::Enlistment(format!(
            "no active transaction to enlist profile '{}' with",
            profile
        ))
    })
}
