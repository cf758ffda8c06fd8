//! Node creation/deletion strategies.
//!
//! Import is one algorithm parameterized by how node rows come into (and go
//! out of) existence: written directly into the store, or delegated to the
//! monitoring platform's management API. Weights, thresholds, and links are
//! always written through the store regardless of strategy.

use thiserror::Error;
use tracing::debug;

use svctree_core::{ServiceDocument, ServiceId};
use svctree_state::{NodeStore, ServiceRecord};

/// Errors raised by a node factory.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("node creation failed: {0}")]
    Create(String),

    #[error("node deletion failed: {0}")]
    Delete(String),
}

/// How import creates — and rollback destroys — node rows.
///
/// `delete_nodes` receives the whole creation log at once so a delegated
/// strategy can issue a single bulk delete call.
pub trait NodeFactory {
    /// Create a node row from the document's scalar fields, returning its id.
    fn create_node(&mut self, doc: &ServiceDocument) -> Result<ServiceId, FactoryError>;

    /// Destroy the node rows for every id, in the given (creation) order.
    fn delete_nodes(&mut self, ids: &[ServiceId]) -> Result<(), FactoryError>;
}

/// Store-only strategy: allocate an id from the store's distributed
/// allocator and insert the node row directly.
pub struct DirectStoreFactory {
    store: NodeStore,
    partition_prefix: u16,
}

impl DirectStoreFactory {
    pub fn new(store: NodeStore, partition_prefix: u16) -> Self {
        Self {
            store,
            partition_prefix,
        }
    }
}

impl NodeFactory for DirectStoreFactory {
    fn create_node(&mut self, doc: &ServiceDocument) -> Result<ServiceId, FactoryError> {
        let id = self
            .store
            .allocate_id(self.partition_prefix, "services", "serviceid")
            .map_err(|e| FactoryError::Create(e.to_string()))?;
        let record = ServiceRecord {
            id: id.clone(),
            name: doc.name.clone(),
            status: doc.status,
            algorithm: doc.algorithm,
            showsla: doc.showsla,
            goodsla: doc.goodsla,
            sortorder: doc.sortorder,
        };
        self.store
            .insert_service(&record)
            .map_err(|e| FactoryError::Create(e.to_string()))?;
        Ok(id)
    }

    fn delete_nodes(&mut self, ids: &[ServiceId]) -> Result<(), FactoryError> {
        for id in ids {
            self.store
                .delete_service(id)
                .map_err(|e| FactoryError::Delete(e.to_string()))?;
            debug!(service = %id, "node row deleted");
        }
        Ok(())
    }
}
