// ============================================================================
// Transaction-Scoped Session Proxy
// ============================================================================
//
// Binds a driver session to one externally coordinated transaction:
// - SessionProxy: what application code calls; redirects to the driver
//   transaction and refuses direct lifecycle control
// - TransactionControl: begin/success/failure/close, reserved for the
//   coordinator side
// - SessionResource: the participant enlisted with the coordinator,
//   translating its callbacks into TransactionControl calls
//
// Single thread per transaction context is assumed. The proxy state sits
// behind a mutex only so that proxy handles can be shared between the
// registry, the participant and application code.
//
// ============================================================================

pub mod control;
pub mod coordinator;
pub mod participant;
pub mod proxy;


pub use control::TransactionControl;
pub use coordinator::{CoordinatorTransaction, TransactionCoordinator, TransactionStatus};
pub use participant::{EndFlag, ResourceParticipant, SessionResource, StartFlag, Vote};
pub use proxy::SessionProxy;
