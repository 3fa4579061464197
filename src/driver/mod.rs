// ============================================================================
// Driver Capability Surfaces
// ============================================================================
//
// The lifecycle half of a NoSQL driver's session and transaction objects.
// Data operations live in one trait per driver family (`graph`, `document`);
// each family also carries the adapter that lets an enlisted `SessionProxy`
// present the same surface as the driver session it wraps.
//
// ============================================================================

pub mod document;
pub mod graph;

use crate::core::Result;

pub use document::{Document, DocumentOperations, DocumentSession};
pub use graph::{GraphSession, GraphStatements, Parameters, Record};

/// Transaction object returned by [`DriverSession::begin_transaction`]
pub trait DriverTransaction: Send {
    /// Mark the transaction as successful (commit on close)
    fn success(&mut self) -> Result<()>;

    /// Mark the transaction as failed (roll back on close)
    fn failure(&mut self) -> Result<()>;

    /// Close the transaction, committing or rolling back per the last mark
    fn close(&mut self) -> Result<()>;

    fn is_open(&self) -> bool;
}

/// Stateful, non-transactional client session exposed by a driver
pub trait DriverSession: Send {
    type Transaction: DriverTransaction;

    fn begin_transaction(&mut self) -> Result<Self::Transaction>;

    fn is_open(&self) -> bool;

    fn close(&mut self) -> Result<()>;
}
