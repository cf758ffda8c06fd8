//! Persisted row types for the svctree node store.

use serde::{Deserialize, Serialize};
use svctree_core::{ServiceId, ServiceStatus};

/// A service node row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRecord {
    pub id: ServiceId,
    pub name: String,
    pub status: ServiceStatus,
    /// Aggregation algorithm selector of the monitoring platform; opaque to
    /// this tool, passed through unchanged.
    pub algorithm: i64,
    pub showsla: bool,
    /// Target SLA percentage.
    pub goodsla: f64,
    pub sortorder: i64,
}

/// A parent→child link row. Each non-root node has exactly one incoming link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceLink {
    pub parent: ServiceId,
    pub child: ServiceId,
    /// Preserved but never interpreted by propagation.
    pub soft: bool,
}

impl ServiceLink {
    /// Composite table key, `{parent}:{child}`.
    pub fn table_key(&self) -> String {
        format!("{}:{}", self.parent, self.child)
    }
}

/// Lightweight handle returned by child and root queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRef {
    pub id: ServiceId,
    pub name: String,
    pub status: ServiceStatus,
}

impl From<&ServiceRecord> for ServiceRef {
    fn from(record: &ServiceRecord) -> Self {
        ServiceRef {
            id: record.id.clone(),
            name: record.name.clone(),
            status: record.status,
        }
    }
}
