//! Portable tree document model.
//!
//! An export file is a JSON array of root [`ServiceDocument`]s. Field names
//! are part of the interchange format and must be read literally — there is
//! no version field, so consumers depend on the exact spelling below.

use serde::{Deserialize, Serialize};

use crate::types::{ServiceStatus, ThresholdTable, WeightTable};

/// One service node and its subtree, as written to/read from an export file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDocument {
    pub name: String,
    pub status: ServiceStatus,
    pub algorithm: i64,
    pub showsla: bool,
    pub goodsla: f64,
    pub sortorder: i64,
    pub weight: WeightTable,
    pub threshold: ThresholdTable,
    pub children: Vec<ServiceDocument>,
}

impl ServiceDocument {
    /// Total number of nodes in this subtree, the document itself included.
    pub fn node_count(&self) -> usize {
        // Worklist instead of recursion: documents can be arbitrarily deep.
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(doc) = pending.pop() {
            count += 1;
            pending.extend(doc.children.iter());
        }
        count
    }
}
