//! Persisted operation history.
//!
//! A `ResourceHistory` is the record tree for one resource on one node.
//! Records are keyed by id: `<rsc>_last_0`, `<rsc>_last_failure_0`, the
//! literal operation key for recurring operations, or the notify key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use corral_core::{ResourceId, op_key};

/// Record id suffix for the most recent non-recurring operation.
pub const LAST: &str = "last";
/// Record id suffix for the most recent failed operation.
pub const LAST_FAILURE: &str = "last_failure";

/// One recorded operation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    /// Operation key of the executed task (`<rsc>_<task>_<interval>`).
    pub operation_key: String,
    pub operation: String,
    pub origin: String,
    pub feature_set: String,
    pub transition_key: String,
    /// `<status>:<rc>;<transition key>`, compared verbatim to detect replays.
    pub transition_magic: String,
    pub exit_reason: String,
    pub on_node: String,
    pub call_id: i32,
    pub rc: i32,
    pub op_status: i32,
    pub interval_ms: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rc_change: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_digest: Option<String>,
}

impl HistoryRecord {
    /// An empty record, filled in by the recorder.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            operation_key: String::new(),
            operation: String::new(),
            origin: String::new(),
            feature_set: String::new(),
            transition_key: String::new(),
            transition_magic: String::new(),
            exit_reason: String::new(),
            on_node: String::new(),
            call_id: 0,
            rc: 0,
            op_status: 0,
            interval_ms: 0,
            last_run: None,
            last_rc_change: None,
            exec_time: None,
            queue_time: None,
            migrate_source: None,
            migrate_target: None,
            op_digest: None,
        }
    }
}

/// Every recorded operation for one resource on one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHistory {
    pub node: String,
    pub rsc_id: ResourceId,
    pub records: BTreeMap<String, HistoryRecord>,
}

impl ResourceHistory {
    pub fn new(node: &str, rsc_id: &str) -> Self {
        Self {
            node: node.to_string(),
            rsc_id: rsc_id.to_string(),
            records: BTreeMap::new(),
        }
    }

    /// Composite key: `{node}/{resource}`.
    pub fn table_key(&self) -> String {
        format!("{}/{}", self.node, self.rsc_id)
    }

    pub fn get(&self, id: &str) -> Option<&HistoryRecord> {
        self.records.get(id)
    }

    pub fn last(&self) -> Option<&HistoryRecord> {
        self.records.get(&op_key(&self.rsc_id, LAST, 0))
    }

    pub fn last_failure(&self) -> Option<&HistoryRecord> {
        self.records.get(&op_key(&self.rsc_id, LAST_FAILURE, 0))
    }

    /// The record kept for a recurring operation.
    pub fn recurring(&self, task: &str, interval_ms: u32) -> Option<&HistoryRecord> {
        self.records.get(&op_key(&self.rsc_id, task, interval_ms))
    }

    /// Whether some record already carries this transition magic.
    pub fn already_recorded(&self, magic: &str) -> bool {
        self.records.values().any(|r| r.transition_magic == magic)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
