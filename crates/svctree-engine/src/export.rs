//! Tree export — depth-first, pre-order serialization of every root.
//!
//! Export never mutates the store. Any node missing its weight or threshold
//! table aborts the entire export; no partial documents are ever produced.

use tracing::{debug, info};

use svctree_core::ServiceDocument;
use svctree_state::{NodeStore, ServiceRef};

use crate::error::{EngineError, EngineResult};

/// Serialize the whole tree into one document per root.
///
/// Roots are services with no incoming link; a dataset with zero roots is
/// malformed and fatal. Child order follows the store's link iteration
/// order verbatim.
pub fn export_tree(store: &NodeStore) -> EngineResult<Vec<ServiceDocument>> {
    let roots = store.roots()?;
    if roots.is_empty() {
        return Err(EngineError::NoRoots);
    }
    info!(roots = roots.len(), "exporting tree");
    roots
        .iter()
        .map(|root| export_subtree(store, root))
        .collect()
}

/// One partially-built document plus the children still to descend into.
struct ExportFrame {
    doc: ServiceDocument,
    pending: std::vec::IntoIter<ServiceRef>,
}

fn read_frame(store: &NodeStore, node: &ServiceRef) -> EngineResult<ExportFrame> {
    let record = store
        .get_service(&node.id)?
        .ok_or_else(|| EngineError::ServiceNotFound(node.id.clone()))?;
    let weight = store
        .get_weight(&node.id)?
        .ok_or_else(|| EngineError::MissingWeight {
            id: node.id.clone(),
            name: record.name.clone(),
        })?;
    let threshold = store
        .get_threshold(&node.id)?
        .ok_or_else(|| EngineError::MissingThreshold {
            id: node.id.clone(),
            name: record.name.clone(),
        })?;
    let children = store.children_of(&node.id)?;
    debug!(service = %node.id, children = children.len(), "exporting node");
    Ok(ExportFrame {
        doc: ServiceDocument {
            name: record.name,
            status: record.status,
            algorithm: record.algorithm,
            showsla: record.showsla,
            goodsla: record.goodsla,
            sortorder: record.sortorder,
            weight,
            threshold,
            children: Vec::new(),
        },
        pending: children.into_iter(),
    })
}

fn export_subtree(store: &NodeStore, root: &ServiceRef) -> EngineResult<ServiceDocument> {
    // Explicit frame stack; tree depth is unbounded in the data model.
    let mut stack = vec![read_frame(store, root)?];
    loop {
        if let Some(child) = stack.last_mut().and_then(|frame| frame.pending.next()) {
            stack.push(read_frame(store, &child)?);
            continue;
        }
        match stack.pop() {
            Some(done) => match stack.last_mut() {
                Some(parent) => parent.doc.children.push(done.doc),
                None => return Ok(done.doc),
            },
            // Unreachable: the stack is seeded with one frame and the
            // function returns when the last frame completes.
            None => return Err(EngineError::ServiceNotFound(root.id.clone())),
        }
    }
}
