use svctree_engine::propagate_all;
use svctree_state::NodeStore;

pub fn run(store: &NodeStore) -> anyhow::Result<()> {
    println!("Updating tree ...");
    let report = propagate_all(store)?;
    println!(
        "Visited {} node(s), updated {} status(es). Finished.",
        report.nodes_visited, report.status_writes
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use svctree_core::{ServiceStatus, ThresholdTable, WeightTable};
    use svctree_state::{ServiceLink, ServiceRecord};

    #[test]
    fn propagates_a_small_tree() {
        let store = NodeStore::open_in_memory().unwrap();
        for (id, name, status) in [
            ("1", "root", ServiceStatus::Normal),
            ("2", "leaf", ServiceStatus::Critical),
        ] {
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
            store
                .upsert_weight(
                    id,
                    &WeightTable {
                        normal: 0.0,
                        information: 1.0,
                        alert: 2.0,
                        average: 3.0,
                        major: 4.0,
                        critical: 55.0,
                    },
                )
                .unwrap();
            store
                .upsert_threshold(
                    id,
                    &ThresholdTable {
                        normal: 0.0,
                        information: 10.0,
                        alert: 20.0,
                        average: 30.0,
                        major: 40.0,
                        critical: 50.0,
                    },
                )
                .unwrap();
        }
        store
            .insert_link(&ServiceLink {
                parent: "1".to_string(),
                child: "2".to_string(),
                soft: false,
            })
            .unwrap();

        run(&store).unwrap();
        // Leaf contributes weight[critical] = 55, which clears every slot.
        assert_eq!(
            store.get_service("1").unwrap().unwrap().status,
            ServiceStatus::Critical
        );
    }

    #[test]
    fn empty_tree_is_an_error() {
        let store = NodeStore::open_in_memory().unwrap();
        assert!(run(&store).is_err());
    }
}
