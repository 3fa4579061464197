pub mod config;

use crate::core::Result;
use crate::driver::DriverSession;
use crate::enlistment;
use crate::transaction::{SessionProxy, TransactionCoordinator};
use config::ProfileConfig;
use std::sync::Arc;

type SessionFactory<S> = Box<dyn Fn(&ProfileConfig) -> Result<S> + Send + Sync>;

/// Source of transaction-scoped sessions for one profile
///
/// Opens a driver session the first time the profile is used inside a
/// coordinator transaction and hands out the same enlisted proxy for every
/// later request in that transaction.
///
/// # Examples
///
/// ```ignore
/// let source = SessionSource::new(config, coordinator, |profile| driver.session(profile))?;
///
/// // inside a coordinator transaction
/// let mut session = source.session()?;
/// session.run("MATCH (m:Movie) RETURN m", &Parameters::new())?;
/// ```
pub struct SessionSource<S: DriverSession> {
    config: ProfileConfig,
    coordinator: Arc<dyn TransactionCoordinator>,
    factory: SessionFactory<S>,
}

impl<S: DriverSession + 'static> SessionSource<S> {
    /// Create a session source; the profile configuration is validated
    pub fn new<F>(
        config: ProfileConfig,
        coordinator: Arc<dyn TransactionCoordinator>,
        factory: F,
    ) -> Result<Self>
    where
        F: Fn(&ProfileConfig) -> Result<S> + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            coordinator,
            factory: Box::new(factory),
        })
    }

    pub fn profile(&self) -> &ProfileConfig {
        &self.config
    }

    /// Session enlisted with the current coordinator transaction
    ///
    /// Fails with [`TxError::Enlistment`](crate::TxError::Enlistment) outside a transaction.
    pub fn session(&self) -> Result<SessionProxy<S>> {
        let transaction =
            enlistment::current_transaction(self.coordinator.as_ref(), &self.config.name)?;

        enlistment::enlist_in(
            transaction.as_ref(),
            &self.config.name,
            &self.config.effective_resource_name(),
            self.config.timeout_secs(),
            || (self.factory)(&self.config),
        )
    }

    /// Session already enlisted in the current transaction, without opening one
    pub fn current(&self) -> Result<Option<SessionProxy<S>>> {
        enlistment::lookup(self.coordinator.as_ref(), &self.config.name)
    }
}
