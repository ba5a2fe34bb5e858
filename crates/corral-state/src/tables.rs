//! redb table definitions for the corral history store.
//!
//! Values are JSON-serialized `ResourceHistory` documents.

use redb::TableDefinition;

/// Per-resource operation history keyed by `{node}/{resource}`.
pub const HISTORY: TableDefinition<&str, &[u8]> = TableDefinition::new("history");
