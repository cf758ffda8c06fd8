use std::path::Path;

use anyhow::Context;

use svctree_api::{ApiFactory, ManagementClient};
use svctree_core::{ServiceDocument, SvctreeConfig};
use svctree_engine::{DirectStoreFactory, import_tree};
use svctree_state::NodeStore;

pub fn run(
    store: &NodeStore,
    config: &SvctreeConfig,
    path: &Path,
    via_api_flag: bool,
) -> anyhow::Result<()> {
    println!("Importing tree from {} ...", path.display());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read from {}", path.display()))?;
    let documents: Vec<ServiceDocument> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid tree document", path.display()))?;

    let root_ids = if via_api_flag || config.via_api() {
        let api = config
            .api
            .as_ref()
            .context("delegated import requires an [api] section in the config")?;
        let mut client = ManagementClient::new(&api.endpoint)?;
        client.authenticate(&api.user, &api.password)?;
        let mut factory = ApiFactory::new(client);
        import_tree(store, &mut factory, &documents)?
    } else {
        let mut factory = DirectStoreFactory::new(store.clone(), config.partition_prefix());
        import_tree(store, &mut factory, &documents)?
    };

    println!("Imported {} root service(s). Finished.", root_ids.len());
    Ok(())
}
