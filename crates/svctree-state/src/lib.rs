//! svctree-state — embedded node store for the service tree.
//!
//! Backed by [redb](https://docs.rs/redb), holds the service rows, the
//! parent→child link rows, the per-node weight and threshold tables, and the
//! distributed ID allocator.
//!
//! # Architecture
//!
//! All values are JSON-serialized into redb's `&[u8]` value columns. Link
//! rows use composite `{parent}:{child}` keys so a prefix scan yields the
//! children of a node; the scan order over those keys is the store-defined
//! child order that exports preserve verbatim.
//!
//! The `NodeStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).
//! Both on-disk and in-memory backends are supported (the latter for
//! testing).

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::NodeStore;
pub use types::*;
