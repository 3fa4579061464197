use super::ResourceParticipant;
use crate::core::{Result, Xid};
use crate::enlistment::EnlistmentRegistry;
use std::sync::Arc;

/// Status of a coordinator transaction
///
/// ```text
/// Active ──prepare──> Preparing ──> Committing ──> Committed
///   │                    │
///   └──set_rollback_only─┴──> MarkedRollback ──> RollingBack ──> RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Active,
    MarkedRollback,
    Preparing,
    Committing,
    Committed,
    RollingBack,
    RolledBack,
}

impl TransactionStatus {
    /// New participants are accepted only while active
    pub fn can_enlist(&self) -> bool {
        matches!(self, TransactionStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Committed | TransactionStatus::RolledBack
        )
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionStatus::Active => "ACTIVE",
            TransactionStatus::MarkedRollback => "MARKED_ROLLBACK",
            TransactionStatus::Preparing => "PREPARING",
            TransactionStatus::Committing => "COMMITTING",
            TransactionStatus::Committed => "COMMITTED",
            TransactionStatus::RollingBack => "ROLLING_BACK",
            TransactionStatus::RolledBack => "ROLLED_BACK",
        };
        f.write_str(name)
    }
}

/// One transaction context of the external coordinator
pub trait CoordinatorTransaction: Send + Sync {
    fn xid(&self) -> Xid;

    fn status(&self) -> TransactionStatus;

    /// Register a participant for this transaction's lifecycle callbacks.
    ///
    /// Called while the context's registry lock is held; implementations must
    /// not touch [`resources`](Self::resources) from here.
    fn enlist_resource(&self, participant: Arc<dyn ResourceParticipant>) -> Result<()>;

    /// Resources scoped to this transaction; dropped when it ends
    fn resources(&self) -> &EnlistmentRegistry;
}

/// Transaction manager side of the external coordinator
pub trait TransactionCoordinator: Send + Sync {
    /// Transaction associated with the calling unit of work, if any
    fn current_transaction(&self) -> Result<Option<Arc<dyn CoordinatorTransaction>>>;
}
