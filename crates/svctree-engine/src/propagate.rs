//! Status propagation — post-order recomputation of every internal node.
//!
//! Leaves contribute `weight[status]` and are never reclassified. Internal
//! nodes sum their children's contributions, reclassify against their
//! threshold table, persist the status when it changed, and contribute
//! `weight[new status]` upward. Root contributions are discarded.
//!
//! Rerunning propagation with no intervening external change performs zero
//! writes: the result is a pure function of stored weights, thresholds,
//! statuses, and tree shape.

use tracing::{debug, info};

use svctree_state::{NodeStore, ServiceRef};

use crate::error::{EngineError, EngineResult};

/// What a propagation run did. `status_writes` is zero on an immediate
/// rerun, which is how callers observe idempotence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PropagationReport {
    pub nodes_visited: u64,
    pub status_writes: u64,
}

/// Recompute the whole tree once, bottom-up.
///
/// Assumes exclusive access to the tree for the duration of the run; there
/// is no locking. Zero roots is fatal, as is any node missing its weight or
/// threshold table.
pub fn propagate_all(store: &NodeStore) -> EngineResult<PropagationReport> {
    let roots = store.roots()?;
    if roots.is_empty() {
        return Err(EngineError::NoRoots);
    }
    info!(roots = roots.len(), "propagating tree");
    let mut report = PropagationReport::default();
    for root in &roots {
        // The root's own contribution has no parent to flow into.
        propagate_subtree(store, root, &mut report)?;
    }
    info!(
        nodes = report.nodes_visited,
        writes = report.status_writes,
        "propagation complete"
    );
    Ok(report)
}

/// One node mid-traversal: children discovered, contributions summed so far.
struct PropFrame {
    node: ServiceRef,
    children: Vec<ServiceRef>,
    next_child: usize,
    sum_weight: f64,
}

fn descend(store: &NodeStore, node: &ServiceRef) -> EngineResult<PropFrame> {
    let children = store.children_of(&node.id)?;
    Ok(PropFrame {
        node: node.clone(),
        children,
        next_child: 0,
        sum_weight: 0.0,
    })
}

fn propagate_subtree(
    store: &NodeStore,
    root: &ServiceRef,
    report: &mut PropagationReport,
) -> EngineResult<()> {
    // Explicit frame stack; tree depth is unbounded in the data model.
    let mut stack = vec![descend(store, root)?];
    loop {
        let next_child = match stack.last_mut() {
            Some(top) if top.next_child < top.children.len() => {
                let child = top.children[top.next_child].clone();
                top.next_child += 1;
                Some(child)
            }
            Some(_) => None,
            None => return Ok(()),
        };
        if let Some(child) = next_child {
            stack.push(descend(store, &child)?);
            continue;
        }
        if let Some(done) = stack.pop() {
            let contribution = finish_node(store, done, report)?;
            match stack.last_mut() {
                Some(parent) => parent.sum_weight += contribution,
                None => return Ok(()),
            }
        }
    }
}

/// Classify a completed frame and return its contribution weight.
fn finish_node(
    store: &NodeStore,
    frame: PropFrame,
    report: &mut PropagationReport,
) -> EngineResult<f64> {
    report.nodes_visited += 1;
    let node = frame.node;

    if frame.children.is_empty() {
        // Leaves keep their status; contribution comes straight from the
        // weight table at the current status.
        let weight = store
            .get_weight(&node.id)?
            .ok_or_else(|| EngineError::MissingWeight {
                id: node.id.clone(),
                name: node.name.clone(),
            })?;
        let contribution = weight.for_status(node.status);
        debug!(service = %node.id, status = u8::from(node.status), contribution, "leaf node");
        return Ok(contribution);
    }

    let threshold = store
        .get_threshold(&node.id)?
        .ok_or_else(|| EngineError::MissingThreshold {
            id: node.id.clone(),
            name: node.name.clone(),
        })?;
    let new_status = threshold.classify(frame.sum_weight);
    if new_status != node.status {
        store.update_status(&node.id, new_status)?;
        report.status_writes += 1;
        debug!(
            service = %node.id,
            from = u8::from(node.status),
            to = u8::from(new_status),
            sum_weight = frame.sum_weight,
            "reclassified"
        );
    }
    // Contribution is indexed by the NEW status, not the pre-update one.
    let weight = store
        .get_weight(&node.id)?
        .ok_or_else(|| EngineError::MissingWeight {
            id: node.id.clone(),
            name: node.name.clone(),
        })?;
    Ok(weight.for_status(new_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use svctree_core::{ServiceStatus, ThresholdTable, WeightTable};
    use svctree_state::{ServiceLink, ServiceRecord};

    fn weight_by_status() -> WeightTable {
        WeightTable {
            normal: 0.0,
            information: 1.0,
            alert: 2.0,
            average: 3.0,
            major: 4.0,
            critical: 5.0,
        }
    }

    fn flat_weight(value: f64) -> WeightTable {
        WeightTable {
            normal: value,
            information: value,
            alert: value,
            average: value,
            major: value,
            critical: value,
        }
    }

    fn thresholds(values: [f64; 6]) -> ThresholdTable {
        ThresholdTable {
            normal: values[0],
            information: values[1],
            alert: values[2],
            average: values[3],
            major: values[4],
            critical: values[5],
        }
    }

    fn add_service(store: &NodeStore, id: &str, name: &str, status: ServiceStatus) {
        store
            .insert_service(&ServiceRecord {
                id: id.to_string(),
                name: name.to_string(),
                status,
                algorithm: 1,
                showsla: false,
                goodsla: 99.0,
                sortorder: 0,
            })
            .unwrap();
    }

    fn add_link(store: &NodeStore, parent: &str, child: &str) {
        store
            .insert_link(&ServiceLink {
                parent: parent.to_string(),
                child: child.to_string(),
                soft: false,
            })
            .unwrap();
    }

    /// Root with leaves whose contributions sum to 25, thresholds
    /// [0,10,20,30,40,50]: the last satisfied slot is 3, so the root's
    /// status becomes 2.
    #[test]
    fn classification_law() {
        let store = NodeStore::open_in_memory().unwrap();
        add_service(&store, "1", "root", ServiceStatus::Normal);
        store.upsert_weight("1", &weight_by_status()).unwrap();
        store
            .upsert_threshold("1", &thresholds([0.0, 10.0, 20.0, 30.0, 40.0, 50.0]))
            .unwrap();
        for (id, name) in [("2", "leaf-a"), ("3", "leaf-b")] {
            add_service(&store, id, name, ServiceStatus::Normal);
            store.upsert_weight(id, &flat_weight(12.5)).unwrap();
            store
                .upsert_threshold(id, &thresholds([0.0; 6]))
                .unwrap();
            add_link(&store, "1", id);
        }

        let report = propagate_all(&store).unwrap();
        assert_eq!(report.nodes_visited, 3);
        assert_eq!(report.status_writes, 1);
        assert_eq!(
            store.get_service("1").unwrap().unwrap().status,
            ServiceStatus::Alert
        );
    }

    /// Same sum against the non-monotonic table [0,10,50,20,40,30]:
    /// satisfied slots are 1, 2 and 4; last wins, status 3.
    #[test]
    fn non_monotonic_thresholds_are_honored_literally() {
        let store = NodeStore::open_in_memory().unwrap();
        add_service(&store, "1", "root", ServiceStatus::Normal);
        store.upsert_weight("1", &weight_by_status()).unwrap();
        store
            .upsert_threshold("1", &thresholds([0.0, 10.0, 50.0, 20.0, 40.0, 30.0]))
            .unwrap();
        add_service(&store, "2", "leaf", ServiceStatus::Normal);
        store.upsert_weight("2", &flat_weight(25.0)).unwrap();
        store.upsert_threshold("2", &thresholds([0.0; 6])).unwrap();
        add_link(&store, "1", "2");

        propagate_all(&store).unwrap();
        assert_eq!(
            store.get_service("1").unwrap().unwrap().status,
            ServiceStatus::Average
        );
    }

    #[test]
    fn second_run_writes_nothing() {
        let store = NodeStore::open_in_memory().unwrap();
        add_service(&store, "1", "root", ServiceStatus::Normal);
        store.upsert_weight("1", &weight_by_status()).unwrap();
        store
            .upsert_threshold("1", &thresholds([0.0, 10.0, 20.0, 30.0, 40.0, 50.0]))
            .unwrap();
        add_service(&store, "2", "leaf", ServiceStatus::Critical);
        store.upsert_weight("2", &flat_weight(45.0)).unwrap();
        store.upsert_threshold("2", &thresholds([0.0; 6])).unwrap();
        add_link(&store, "1", "2");

        let first = propagate_all(&store).unwrap();
        assert_eq!(first.status_writes, 1);
        let second = propagate_all(&store).unwrap();
        assert_eq!(second.status_writes, 0);
        assert_eq!(second.nodes_visited, first.nodes_visited);
    }

    #[test]
    fn leaves_are_never_reclassified() {
        let store = NodeStore::open_in_memory().unwrap();
        add_service(&store, "1", "root", ServiceStatus::Normal);
        store.upsert_weight("1", &weight_by_status()).unwrap();
        store
            .upsert_threshold("1", &thresholds([0.0, 10.0, 20.0, 30.0, 40.0, 50.0]))
            .unwrap();
        // Leaf thresholds would reclassify it to critical if consulted.
        add_service(&store, "2", "leaf", ServiceStatus::Information);
        store.upsert_weight("2", &weight_by_status()).unwrap();
        store
            .upsert_threshold("2", &thresholds([0.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
            .unwrap();
        add_link(&store, "1", "2");

        propagate_all(&store).unwrap();
        assert_eq!(
            store.get_service("2").unwrap().unwrap().status,
            ServiceStatus::Information
        );
    }

    /// A reclassified middle node contributes weight[new status] upward,
    /// which in turn reclassifies its parent.
    #[test]
    fn contribution_uses_post_update_status() {
        let store = NodeStore::open_in_memory().unwrap();
        add_service(&store, "1", "root", ServiceStatus::Normal);
        store.upsert_weight("1", &weight_by_status()).unwrap();
        store
            .upsert_threshold("1", &thresholds([0.0, 40.0, 60.0, 70.0, 80.0, 90.0]))
            .unwrap();
        add_service(&store, "2", "mid", ServiceStatus::Normal);
        // mid's weight jumps to 50 once it reaches critical.
        store
            .upsert_weight(
                "2",
                &WeightTable {
                    normal: 0.0,
                    information: 1.0,
                    alert: 2.0,
                    average: 3.0,
                    major: 4.0,
                    critical: 50.0,
                },
            )
            .unwrap();
        store
            .upsert_threshold("2", &thresholds([0.0, 1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();
        add_service(&store, "3", "leaf", ServiceStatus::Critical);
        store.upsert_weight("3", &flat_weight(10.0)).unwrap();
        store.upsert_threshold("3", &thresholds([0.0; 6])).unwrap();
        add_link(&store, "1", "2");
        add_link(&store, "2", "3");

        propagate_all(&store).unwrap();
        // mid: sum 10 >= all slots, critical; contributes 50, not
        // weight[normal] = 0.
        assert_eq!(
            store.get_service("2").unwrap().unwrap().status,
            ServiceStatus::Critical
        );
        // root: sum 50 satisfies slots 1 and 2, status 1.
        assert_eq!(
            store.get_service("1").unwrap().unwrap().status,
            ServiceStatus::Information
        );
    }

    #[test]
    fn missing_threshold_on_internal_node_is_fatal() {
        let store = NodeStore::open_in_memory().unwrap();
        add_service(&store, "1", "root", ServiceStatus::Normal);
        store.upsert_weight("1", &weight_by_status()).unwrap();
        add_service(&store, "2", "leaf", ServiceStatus::Normal);
        store.upsert_weight("2", &flat_weight(1.0)).unwrap();
        add_link(&store, "1", "2");

        let err = propagate_all(&store).unwrap_err();
        match err {
            EngineError::MissingThreshold { id, .. } => assert_eq!(id, "1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_weight_on_leaf_is_fatal() {
        let store = NodeStore::open_in_memory().unwrap();
        add_service(&store, "1", "root", ServiceStatus::Normal);
        store.upsert_weight("1", &weight_by_status()).unwrap();
        store
            .upsert_threshold("1", &thresholds([0.0; 6]))
            .unwrap();
        add_service(&store, "2", "leaf", ServiceStatus::Normal);
        add_link(&store, "1", "2");

        let err = propagate_all(&store).unwrap_err();
        match err {
            EngineError::MissingWeight { id, .. } => assert_eq!(id, "2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_store_is_fatal() {
        let store = NodeStore::open_in_memory().unwrap();
        assert!(matches!(propagate_all(&store), Err(EngineError::NoRoots)));
    }
}
