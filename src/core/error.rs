use thiserror::Error;

/// Failure reported by a driver through one of the capability traits.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug)]
pub enum TxError {
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Transaction start failure: {0}")]
    TransactionStart(String),

    #[error("Transaction end failure: {0}")]
    TransactionEnd(String),

    #[error("Enlistment failure: {0}")]
    Enlistment(String),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, TxError>;

impl TxError {
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, TxError::ProtocolViolation(_))
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, TxError::IllegalState(_))
    }

    /// Begin/success/failure/close failures, fatal to the enlistment.
    pub fn is_lifecycle_failure(&self) -> bool {
        matches!(
            self,
            TxError::TransactionStart(_) | TxError::TransactionEnd(_)
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for TxError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for TxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
