use super::TransactionControl;
use crate::core::{Result, TxError, Xid};
use crate::driver::DriverSession;
use log::{debug, warn};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// How a branch is associated with a participant on `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartFlag {
    /// First association with a new transaction branch
    New,
    /// Another thread joins an existing association
    Join,
    /// A suspended association resumes
    Resume,
}

/// How an association ends on `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndFlag {
    Success,
    Fail,
    Suspend,
}

/// Outcome of `prepare`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Commit,
    ReadOnly,
}

/// Two-phase-commit participant contract consumed by the coordinator
pub trait ResourceParticipant: Send + Sync {
    fn resource_name(&self) -> &str;

    fn start(&self, xid: &Xid, flag: StartFlag) -> Result<()>;

    fn end(&self, xid: &Xid, flag: EndFlag) -> Result<()>;

    fn prepare(&self, xid: &Xid) -> Result<Vote>;

    fn commit(&self, xid: &Xid, one_phase: bool) -> Result<()>;

    fn rollback(&self, xid: &Xid) -> Result<()>;

    fn forget(&self, _xid: &Xid) -> Result<()> {
        Ok(())
    }

    /// Branches left in doubt after a crash
    fn recover(&self) -> Result<Vec<Xid>> {
        Ok(Vec::new())
    }

    fn is_same_resource_manager(&self, other: &dyn ResourceParticipant) -> bool {
        self.resource_name() == other.resource_name()
    }

    /// Timeout in seconds, 0 meaning the coordinator default
    fn transaction_timeout(&self) -> u32;

    fn set_transaction_timeout(&self, seconds: u32) -> bool;
}

/// Participant driving one enlisted session through its [`TransactionControl`].
///
/// | callback        | effect                         |
/// |-----------------|--------------------------------|
/// | `start(New)`    | `begin_transaction()`          |
/// | `end`, `prepare`| nothing                        |
/// | `commit`        | `success()` then `close()`     |
/// | `rollback`      | `failure()` then `close()`     |
///
/// Nothing is retried here; failures go back to the coordinator.
pub struct SessionResource<S: DriverSession> {
    control: TransactionControl<S>,
    resource_name: String,
    xid: Mutex<Option<Xid>>,
    timeout_secs: AtomicU32,
}

impl<S: DriverSession> SessionResource<S> {
    pub fn new(control: TransactionControl<S>, resource_name: impl Into<String>) -> Self {
        Self {
            control,
            resource_name: resource_name.into(),
            xid: Mutex::new(None),
            timeout_secs: AtomicU32::new(0),
        }
    }

    pub fn with_timeout(self, seconds: u32) -> Self {
        self.timeout_secs.store(seconds, Ordering::SeqCst);
        self
    }

    pub fn control(&self) -> &TransactionControl<S> {
        &self.control
    }

    /// Branch currently associated with this participant
    pub fn associated_xid(&self) -> Option<Xid> {
        self.xid.lock().ok().and_then(|xid| *xid)
    }

    fn check_association(&self, xid: &Xid) -> Result<()> {
        match *self.xid.lock()? {
            Some(current) if current == *xid => Ok(()),
            Some(current) => Err(TxError::IllegalState(format!(
                "resource '{}' is associated with {}, not {}",
                self.resource_name, current, xid
            ))),
            None => Err(TxError::IllegalState(format!(
                "resource '{}' has no transaction branch, got {}",
                self.resource_name, xid
            ))),
        }
    }

    fn release(&self) -> Result<()> {
        *self.xid.lock()? = None;
        Ok(())
    }
}

impl<S: DriverSession> ResourceParticipant for SessionResource<S> {
    fn resource_name(&self) -> &str {
        &self.resource_name
    }

    fn start(&self, xid: &Xid, flag: StartFlag) -> Result<()> {
        debug!("start {} on '{}' ({:?})", xid, self.resource_name, flag);
        match flag {
            StartFlag::New => {
                {
                    let mut current = self.xid.lock()?;
                    if let Some(existing) = *current {
                        return Err(TxError::IllegalState(format!(
                            "resource '{}' already started for {}",
                            self.resource_name, existing
                        )));
                    }
                    *current = Some(*xid);
                }
                // The branch stays associated on failure so the coordinator's
                // rollback can still release the session.
                self.control.begin_transaction()
            }
            StartFlag::Join | StartFlag::Resume => self.check_association(xid),
        }
    }

    fn end(&self, xid: &Xid, flag: EndFlag) -> Result<()> {
        debug!("end {} on '{}' ({:?})", xid, self.resource_name, flag);
        self.check_association(xid)
    }

    fn prepare(&self, xid: &Xid) -> Result<Vote> {
        self.check_association(xid)?;
        Ok(Vote::Commit)
    }

    fn commit(&self, xid: &Xid, one_phase: bool) -> Result<()> {
        self.check_association(xid)?;
        debug!(
            "commit {} on '{}' (one_phase={})",
            xid, self.resource_name, one_phase
        );

        let marked = self.control.success();
        if let Err(err) = &marked {
            warn!("marking {} successful failed, closing anyway: {}", xid, err);
        }
        let closed = self.control.close();
        self.release()?;
        marked.and(closed)
    }

    fn rollback(&self, xid: &Xid) -> Result<()> {
        self.check_association(xid)?;
        debug!("rollback {} on '{}'", xid, self.resource_name);

        let marked = if self.control.has_transaction() {
            self.control.failure()
        } else {
            Ok(())
        };
        if let Err(err) = &marked {
            warn!("marking {} failed did not succeed, closing anyway: {}", xid, err);
        }
        let closed = self.control.close();
        self.release()?;
        marked.and(closed)
    }

    fn transaction_timeout(&self) -> u32 {
        self.timeout_secs.load(Ordering::SeqCst)
    }

    fn set_transaction_timeout(&self, seconds: u32) -> bool {
        self.timeout_secs.store(seconds, Ordering::SeqCst);
        true
    }
}
