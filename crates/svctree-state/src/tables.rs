//! redb table definitions for the svctree node store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized types).
//! Link keys are composite `{parent_id}:{child_id}`; allocator keys are
//! `{prefix}:{entity}:{field}`.

use redb::TableDefinition;

/// Service rows keyed by `{service_id}`.
pub const SERVICES: TableDefinition<&str, &[u8]> = TableDefinition::new("services");

/// Parent→child link rows keyed by `{parent_id}:{child_id}`.
pub const LINKS: TableDefinition<&str, &[u8]> = TableDefinition::new("services_links");

/// Weight tables keyed by `{service_id}`.
pub const WEIGHTS: TableDefinition<&str, &[u8]> = TableDefinition::new("service_weight");

/// Threshold tables keyed by `{service_id}`.
pub const THRESHOLDS: TableDefinition<&str, &[u8]> = TableDefinition::new("service_threshold");

/// Icon assignments keyed by `{service_id}`. Present for schema parity with
/// the monitoring platform; no icon data flows through this tool.
pub const ICONS: TableDefinition<&str, &[u8]> = TableDefinition::new("service_icon");

/// ID allocator counters keyed by `{prefix}:{entity}:{field}`.
pub const IDS: TableDefinition<&str, &[u8]> = TableDefinition::new("ids");
