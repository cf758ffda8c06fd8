//! svctree-engine — the service tree core.
//!
//! Three operations over the node store:
//!
//! - [`export_tree`]: serialize every root's subtree into portable documents.
//! - [`import_tree`]: recreate a tree from documents, compensating for any
//!   failure by deleting everything the attempt created.
//! - [`propagate_all`]: recompute every internal node's status bottom-up from
//!   its children's contribution weights.
//!
//! All traversals use explicit frame stacks — tree depth is unbounded in the
//! data model, so the call stack is never a function of the data.
//!
//! # Concurrency
//!
//! Single-threaded and synchronous. There is no cross-run locking: the
//! caller's scheduler must serialize invocations against the same store.
//! Import's rollback is a compensating-action sequence, not a transaction;
//! a crash between saga steps can leave partially-created nodes behind.
//! Propagation is a pure function of stored state and can always be rerun.

pub mod error;
pub mod export;
pub mod factory;
pub mod import;
pub mod propagate;

pub use error::{EngineError, EngineResult};
pub use export::export_tree;
pub use factory::{DirectStoreFactory, FactoryError, NodeFactory};
pub use import::{RollbackLog, import_tree};
pub use propagate::{PropagationReport, propagate_all};
