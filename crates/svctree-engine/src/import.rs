//! Tree import — recreate a tree from portable documents, with a
//! compensating rollback saga on any failure.
//!
//! Nodes are created pre-order; each parent→child link is created right
//! after the child's subtree completes, mirroring the export order. Every
//! created id is logged in creation order, and any error at any step —
//! store write, allocator, management-API call — triggers compensating
//! deletes for everything logged so far.
//!
//! Rollback is best-effort, not a database transaction: a crash between
//! saga steps, or a failing compensating delete, can leave partially
//! created rows behind. The latter is surfaced loudly as
//! [`EngineError::RollbackFailed`].

use tracing::{debug, info, warn};

use svctree_core::{ServiceDocument, ServiceId};
use svctree_state::{NodeStore, ServiceLink};

use crate::error::{EngineError, EngineResult};
use crate::factory::NodeFactory;

/// Append-only log of node ids created during one import attempt.
///
/// Owned by the import invocation; handed to the rollback saga on failure.
#[derive(Debug, Default)]
pub struct RollbackLog {
    created: Vec<ServiceId>,
}

impl RollbackLog {
    fn record(&mut self, id: ServiceId) {
        self.created.push(id);
    }

    /// Logged ids, in creation order.
    pub fn ids(&self) -> &[ServiceId] {
        &self.created
    }

    pub fn len(&self) -> usize {
        self.created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }
}

/// Import a whole tree. Returns the ids of the created roots.
///
/// Ensures the aggregation tables exist first (idempotent precondition).
/// On any failure the rollback saga undoes every node created during this
/// attempt, then the import error is returned; if rollback itself fails,
/// [`EngineError::RollbackFailed`] carries both errors and the store needs
/// manual inspection.
pub fn import_tree(
    store: &NodeStore,
    factory: &mut dyn NodeFactory,
    documents: &[ServiceDocument],
) -> EngineResult<Vec<ServiceId>> {
    store.ensure_aggregation_tables()?;
    let mut log = RollbackLog::default();
    match import_roots(store, factory, &mut log, documents) {
        Ok(root_ids) => {
            info!(roots = root_ids.len(), nodes = log.len(), "import complete");
            Ok(root_ids)
        }
        Err(import_err) => {
            warn!(error = %import_err, created = log.len(), "import failed, rolling back");
            match rollback(store, factory, &log) {
                Ok(()) => Err(import_err),
                Err(rollback_err) => Err(EngineError::RollbackFailed {
                    import: Box::new(import_err),
                    rollback: Box::new(rollback_err),
                }),
            }
        }
    }
}

fn import_roots(
    store: &NodeStore,
    factory: &mut dyn NodeFactory,
    log: &mut RollbackLog,
    documents: &[ServiceDocument],
) -> EngineResult<Vec<ServiceId>> {
    documents
        .iter()
        .map(|doc| import_subtree(store, factory, log, doc))
        .collect()
}

/// A created node plus the child documents still to import under it.
struct ImportFrame<'a> {
    id: ServiceId,
    pending: std::slice::Iter<'a, ServiceDocument>,
}

/// Create one node row plus its threshold and weight rows.
fn create_node(
    store: &NodeStore,
    factory: &mut dyn NodeFactory,
    log: &mut RollbackLog,
    doc: &ServiceDocument,
) -> EngineResult<ServiceId> {
    let id = factory.create_node(doc)?;
    // Log before the dependent rows so a failure right after still
    // compensates for this node.
    log.record(id.clone());
    debug!(service = %id, name = %doc.name, "node created");
    store.upsert_threshold(&id, &doc.threshold)?;
    store.upsert_weight(&id, &doc.weight)?;
    Ok(id)
}

fn import_subtree(
    store: &NodeStore,
    factory: &mut dyn NodeFactory,
    log: &mut RollbackLog,
    root: &ServiceDocument,
) -> EngineResult<ServiceId> {
    // Explicit frame stack; tree depth is unbounded in the data model.
    let root_id = create_node(store, factory, log, root)?;
    let mut stack = vec![ImportFrame {
        id: root_id.clone(),
        pending: root.children.iter(),
    }];
    loop {
        if let Some(child) = stack.last_mut().and_then(|frame| frame.pending.next()) {
            let child_id = create_node(store, factory, log, child)?;
            stack.push(ImportFrame {
                id: child_id,
                pending: child.children.iter(),
            });
            continue;
        }
        match stack.pop() {
            Some(done) => match stack.last() {
                Some(parent) => {
                    debug!(parent = %parent.id, child = %done.id, "linking");
                    store.insert_link(&ServiceLink {
                        parent: parent.id.clone(),
                        child: done.id.clone(),
                        soft: false,
                    })?;
                }
                None => return Ok(done.id),
            },
            // Unreachable: the stack is seeded with the root frame and the
            // function returns when that frame completes.
            None => return Ok(root_id),
        }
    }
}

/// Compensating deletes for every logged node, in creation order:
/// threshold row, weight row, links touching the node, then the node rows
/// themselves through the strategy (one bulk call for delegated creation).
fn rollback(
    store: &NodeStore,
    factory: &mut dyn NodeFactory,
    log: &RollbackLog,
) -> EngineResult<()> {
    info!(nodes = log.len(), "rolling back partial import");
    for id in log.ids() {
        store.delete_threshold(id)?;
        store.delete_weight(id)?;
        store.delete_links_touching(id)?;
        debug!(service = %id, "compensating deletes issued");
    }
    factory.delete_nodes(log.ids())?;
    Ok(())
}
