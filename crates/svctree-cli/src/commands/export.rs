use std::path::Path;

use anyhow::Context;

use svctree_engine::export_tree;
use svctree_state::NodeStore;

pub fn run(store: &NodeStore, path: &Path) -> anyhow::Result<()> {
    println!("Exporting tree to {} ...", path.display());
    let documents = export_tree(store)?;
    let json = serde_json::to_string(&documents)?;
    std::fs::write(path, json)
        .with_context(|| format!("could not write to {}", path.display()))?;
    println!("Finished.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use svctree_core::{ServiceStatus, ThresholdTable, WeightTable};
    use svctree_state::ServiceRecord;

    fn seeded_store() -> NodeStore {
        let store = NodeStore::open_in_memory().unwrap();
        store
            .insert_service(&ServiceRecord {
                id: "1".to_string(),
                name: "root".to_string(),
                status: ServiceStatus::Normal,
                algorithm: 1,
                showsla: true,
                goodsla: 99.9,
                sortorder: 0,
            })
            .unwrap();
        let flat = WeightTable {
            normal: 1.0,
            information: 1.0,
            alert: 1.0,
            average: 1.0,
            major: 1.0,
            critical: 1.0,
        };
        store.upsert_weight("1", &flat).unwrap();
        store
            .upsert_threshold(
                "1",
                &ThresholdTable {
                    normal: 0.0,
                    information: 1.0,
                    alert: 2.0,
                    average: 3.0,
                    major: 4.0,
                    critical: 5.0,
                },
            )
            .unwrap();
        store
    }

    #[test]
    fn writes_a_json_array_to_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        let store = seeded_store();

        run(&store, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
        assert_eq!(parsed[0]["name"], "root");
    }

    #[test]
    fn unwritable_path_fails_without_output() {
        let store = seeded_store();
        let path = Path::new("/nonexistent-dir/tree.json");
        assert!(run(&store, path).is_err());
    }

    #[test]
    fn integrity_violation_produces_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        let store = seeded_store();
        store.delete_weight("1").unwrap();

        assert!(run(&store, &path).is_err());
        assert!(!path.exists());
    }
}
