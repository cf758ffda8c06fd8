//! NodeStore — redb-backed persistence for the service tree.
//!
//! Provides typed CRUD over service rows, link rows, weight/threshold tables,
//! and the distributed ID allocator. All values are JSON-serialized into
//! redb's `&[u8]` value columns. The store supports both on-disk and
//! in-memory backends (the latter for testing).

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use svctree_core::{ServiceId, ServiceStatus, ThresholdTable, WeightTable};

use crate::error::{StoreError, StoreResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// One partition step of the allocator: ids are `prefix * 10^11 + counter`,
/// so the leading digits of an id name the deployment that allocated it.
const PARTITION_STRIDE: u64 = 100_000_000_000;

/// Thread-safe node store backed by redb.
#[derive(Clone)]
pub struct NodeStore {
    db: Arc<Database>,
}

impl NodeStore {
    /// Open (or create) a persistent node store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "node store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory node store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory node store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SERVICES).map_err(map_err!(Table))?;
        txn.open_table(LINKS).map_err(map_err!(Table))?;
        txn.open_table(IDS).map_err(map_err!(Table))?;
        txn.open_table(WEIGHTS).map_err(map_err!(Table))?;
        txn.open_table(THRESHOLDS).map_err(map_err!(Table))?;
        txn.open_table(ICONS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Idempotently create the aggregation tables (weights, thresholds,
    /// icons). Import calls this as a precondition so a store produced by
    /// tooling that predates those tables can still be imported into.
    pub fn ensure_aggregation_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(WEIGHTS).map_err(map_err!(Table))?;
        txn.open_table(THRESHOLDS).map_err(map_err!(Table))?;
        txn.open_table(ICONS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Services ───────────────────────────────────────────────────

    /// Insert or replace a service row.
    pub fn insert_service(&self, record: &ServiceRecord) -> StoreResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            table
                .insert(record.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service = %record.id, name = %record.name, "service stored");
        Ok(())
    }

    /// Get a service row by id.
    pub fn get_service(&self, id: &str) -> StoreResult<Option<ServiceRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: ServiceRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Rewrite a service row with only its status changed.
    pub fn update_status(&self, id: &str, status: ServiceStatus) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            let mut record: ServiceRecord = match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => return Err(StoreError::NotFound(format!("service {id}"))),
            };
            record.status = status;
            let value = serde_json::to_vec(&record).map_err(map_err!(Serialize))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service = %id, status = u8::from(status), "status updated");
        Ok(())
    }

    /// Delete a service row by id. Returns true if it existed.
    pub fn delete_service(&self, id: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(service = %id, existed, "service deleted");
        Ok(existed)
    }

    // ── Links ──────────────────────────────────────────────────────

    /// Insert a parent→child link row.
    pub fn insert_link(&self, link: &ServiceLink) -> StoreResult<()> {
        let key = link.table_key();
        let value = serde_json::to_vec(link).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(LINKS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Children of a node, in store iteration order (the `{parent}:` prefix
    /// scan). This order is what exports preserve verbatim.
    pub fn children_of(&self, parent: &str) -> StoreResult<Vec<ServiceRef>> {
        let prefix = format!("{parent}:");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let links = txn.open_table(LINKS).map_err(map_err!(Table))?;
        let services = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in links.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if !key.value().starts_with(&prefix) {
                continue;
            }
            let link: ServiceLink =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            match services.get(link.child.as_str()).map_err(map_err!(Read))? {
                Some(guard) => {
                    let record: ServiceRecord =
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                    results.push(ServiceRef::from(&record));
                }
                None => {
                    return Err(StoreError::NotFound(format!(
                        "service {} referenced by link from {parent}",
                        link.child
                    )));
                }
            }
        }
        Ok(results)
    }

    /// Delete every link where the id appears as parent or child.
    /// Returns the number deleted.
    pub fn delete_links_touching(&self, id: &str) -> StoreResult<u32> {
        // Collect keys in a read transaction first.
        let keys: Vec<String> = {
            let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(LINKS).map_err(map_err!(Table))?;
            let mut keys = Vec::new();
            for entry in table.iter().map_err(map_err!(Read))? {
                let (key, value) = entry.map_err(map_err!(Read))?;
                let link: ServiceLink =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                if link.parent == id || link.child == id {
                    keys.push(key.value().to_string());
                }
            }
            keys
        };
        // Delete in a write transaction.
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let count = keys.len() as u32;
        {
            let mut table = txn.open_table(LINKS).map_err(map_err!(Table))?;
            for key in &keys {
                table.remove(key.as_str()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(count)
    }

    /// Root services: every service with no incoming link, in store
    /// iteration order.
    pub fn roots(&self) -> StoreResult<Vec<ServiceRef>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let links = txn.open_table(LINKS).map_err(map_err!(Table))?;
        let mut linked_children: HashSet<ServiceId> = HashSet::new();
        for entry in links.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let link: ServiceLink =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            linked_children.insert(link.child);
        }
        let services = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in services.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: ServiceRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if !linked_children.contains(&record.id) {
                results.push(ServiceRef::from(&record));
            }
        }
        Ok(results)
    }

    // ── Weights ────────────────────────────────────────────────────

    /// Insert or replace a node's weight table.
    pub fn upsert_weight(&self, id: &str, weight: &WeightTable) -> StoreResult<()> {
        let value = serde_json::to_vec(weight).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(WEIGHTS).map_err(map_err!(Table))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a node's weight table.
    pub fn get_weight(&self, id: &str) -> StoreResult<Option<WeightTable>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WEIGHTS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let weight: WeightTable =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(weight))
            }
            None => Ok(None),
        }
    }

    /// Delete a node's weight table. Returns true if it existed.
    pub fn delete_weight(&self, id: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(WEIGHTS).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    // ── Thresholds ─────────────────────────────────────────────────

    /// Insert or replace a node's threshold table.
    pub fn upsert_threshold(&self, id: &str, threshold: &ThresholdTable) -> StoreResult<()> {
        let value = serde_json::to_vec(threshold).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(THRESHOLDS).map_err(map_err!(Table))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a node's threshold table.
    pub fn get_threshold(&self, id: &str) -> StoreResult<Option<ThresholdTable>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(THRESHOLDS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let threshold: ThresholdTable =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(threshold))
            }
            None => Ok(None),
        }
    }

    /// Delete a node's threshold table. Returns true if it existed.
    pub fn delete_threshold(&self, id: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(THRESHOLDS).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    // ── ID allocator ───────────────────────────────────────────────

    /// Allocate the next id for `(prefix, entity, field)`.
    ///
    /// Counters are scoped per partition prefix so deployments can allocate
    /// independently; the returned id is `prefix * 10^11 + counter`, a
    /// monotonically increasing numeric string whose leading digits name the
    /// allocating deployment. Read-increment-write happens inside a single
    /// write transaction.
    pub fn allocate_id(&self, prefix: u16, entity: &str, field: &str) -> StoreResult<ServiceId> {
        let key = format!("{prefix}:{entity}:{field}");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let allocated;
        {
            let mut table = txn.open_table(IDS).map_err(map_err!(Table))?;
            let counter: u64 = match table.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => 0,
            };
            let next = counter + 1;
            let value = serde_json::to_vec(&next).map_err(map_err!(Serialize))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
            allocated = u64::from(prefix) * PARTITION_STRIDE + next;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, id = allocated, "id allocated");
        Ok(allocated.to_string())
    }
}
