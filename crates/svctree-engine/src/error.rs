//! Error types for the svctree engine.

use thiserror::Error;

use svctree_core::ServiceId;
use svctree_state::StoreError;

use crate::factory::FactoryError;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during export, import, or propagation.
///
/// Every variant is fatal to the current invocation; the engine never
/// retries and never acts on partial data.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The store holds no service without an incoming link — either the
    /// dataset is empty or the link rows are malformed.
    #[error("no root services found")]
    NoRoots,

    /// Data-integrity violation: every node must own a weight table.
    #[error("service \"{name}\" ({id}) has no weight table entry")]
    MissingWeight { id: ServiceId, name: String },

    /// Data-integrity violation: every node must own a threshold table.
    #[error("service \"{name}\" ({id}) has no threshold table entry")]
    MissingThreshold { id: ServiceId, name: String },

    #[error("service {0} not found")]
    ServiceNotFound(ServiceId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    /// A compensating delete failed after an import error. The store is left
    /// partially populated and must be inspected by hand.
    #[error(
        "rollback failed after import error ({import}); \
         store left partially populated, manual intervention required: {rollback}"
    )]
    RollbackFailed {
        import: Box<EngineError>,
        rollback: Box<EngineError>,
    },
}
