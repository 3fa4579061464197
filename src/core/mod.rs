pub mod error;
pub mod types;

pub use error::{DriverError, Result, TxError};
pub use types::{ResourceKey, SESSION_RESOURCE_PREFIX, Xid};
