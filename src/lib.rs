// ============================================================================
// nosqltx Library
// ============================================================================
//
// Transaction-scoped NoSQL sessions: a driver session is wrapped in a
// SessionProxy, a participant is enlisted with the external coordinator,
// and the coordinator's commit/rollback callbacks drive the driver
// transaction. Application code only ever sees the proxy.
//
// ============================================================================

pub mod connection;
pub mod core;
pub mod driver;
pub mod enlistment;
pub mod transaction;

// Re-export main types for convenience
pub use crate::core::{DriverError, ResourceKey, Result, TxError, Xid};
pub use driver::{
    Document, DocumentOperations, DocumentSession, DriverSession, DriverTransaction,
    GraphSession, GraphStatements, Parameters, Record,
};
pub use enlistment::{EnlistmentRegistry, enlist, enlist_in, enlist_with, lookup, lookup_in};
pub use transaction::{
    CoordinatorTransaction, EndFlag, ResourceParticipant, SessionProxy, SessionResource,
    StartFlag, TransactionControl, TransactionCoordinator, TransactionStatus, Vote,
};

// Re-export configuration API
pub use connection::{
    SessionSource,
    config::{DriverFamily, ProfileConfig, ProfilesConfig},
};
