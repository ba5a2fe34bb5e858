//! redb-backed store for per-resource operation history.
//!
//! One JSON-serialized `ResourceHistory` per `{node}/{resource}` key. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use corral_core::OperationOutcome;

use crate::error::{StateError, StateResult};
use crate::recorder::{RecordContext, record};
use crate::tables::HISTORY;
use crate::types::{HistoryRecord, ResourceHistory};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe history store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "history store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory history store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(HISTORY).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Resource history ───────────────────────────────────────────

    /// Insert or replace a resource's history on one node.
    pub fn put_resource_history(&self, history: &ResourceHistory) -> StateResult<()> {
        let key = history.table_key();
        let value = serde_json::to_vec(history).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(HISTORY).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, records = history.len(), "resource history stored");
        Ok(())
    }

    pub fn get_resource_history(
        &self,
        node: &str,
        rsc_id: &str,
    ) -> StateResult<Option<ResourceHistory>> {
        let key = format!("{node}/{rsc_id}");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HISTORY).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let history: ResourceHistory =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(history))
            }
            None => Ok(None),
        }
    }

    /// Like `get_resource_history`, but a missing entry is an error.
    pub fn require_resource_history(
        &self,
        node: &str,
        rsc_id: &str,
    ) -> StateResult<ResourceHistory> {
        self.get_resource_history(node, rsc_id)?
            .ok_or_else(|| StateError::NotFound(format!("{node}/{rsc_id}")))
    }

    /// All resource histories recorded on a node.
    pub fn list_for_node(&self, node: &str) -> StateResult<Vec<ResourceHistory>> {
        let prefix = format!("{node}/");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(HISTORY).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let history: ResourceHistory =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(history);
            }
        }
        Ok(results)
    }

    /// Delete a resource's history on a node. Returns true if it existed.
    pub fn delete_resource_history(&self, node: &str, rsc_id: &str) -> StateResult<bool> {
        let key = format!("{node}/{rsc_id}");
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(HISTORY).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, existed, "resource history deleted");
        Ok(existed)
    }

    // ── Recording ──────────────────────────────────────────────────

    /// Record an outcome against the stored history of `ctx.node`.
    ///
    /// Loads the resource's history (or starts an empty one), records the
    /// outcome into it and writes it back. Returns the primary record.
    pub fn record_outcome(
        &self,
        outcome: &OperationOutcome,
        ctx: RecordContext<'_>,
    ) -> StateResult<HistoryRecord> {
        let mut history = self
            .get_resource_history(ctx.node, &outcome.rsc_id)?
            .unwrap_or_else(|| ResourceHistory::new(ctx.node, &outcome.rsc_id));
        let primary = record(&mut history, outcome, ctx)?;
        self.put_resource_history(&history)?;
        Ok(primary)
    }
}
