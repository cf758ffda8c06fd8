//! Delegated-creation strategy: node rows live in the platform, not the
//! local store.
//!
//! Import still writes weights, thresholds, and links through the store;
//! only node creation and deletion go through the API. Rollback therefore
//! never deletes local node rows for this variant — there are none.

use svctree_core::{ServiceDocument, ServiceId};
use svctree_engine::{FactoryError, NodeFactory};

use crate::client::ManagementClient;

/// `NodeFactory` backed by the management API.
pub struct ApiFactory {
    client: ManagementClient,
}

impl ApiFactory {
    /// Wrap an already-authenticated client.
    pub fn new(client: ManagementClient) -> Self {
        Self { client }
    }
}

impl NodeFactory for ApiFactory {
    fn create_node(&mut self, doc: &ServiceDocument) -> Result<ServiceId, FactoryError> {
        self.client
            .create_service(doc)
            .map_err(|e| FactoryError::Create(e.to_string()))
    }

    fn delete_nodes(&mut self, ids: &[ServiceId]) -> Result<(), FactoryError> {
        self.client
            .delete_services(ids)
            .map_err(|e| FactoryError::Delete(e.to_string()))
    }
}
