//! Shared types used across corral crates.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Signed placement preference. `-INFINITY` forbids placement.
pub type Score = i32;

/// Largest meaningful score. `-INFINITY` is the ban sentinel.
pub const INFINITY: Score = 1_000_000;

/// Resource identifier (unique within a cycle).
pub type ResourceId = String;

// ── Task names ─────────────────────────────────────────────────────

pub const TASK_START: &str = "start";
pub const TASK_STOP: &str = "stop";
pub const TASK_MONITOR: &str = "monitor";
pub const TASK_RELOAD: &str = "reload";
pub const TASK_NOTIFY: &str = "notify";
pub const TASK_CANCEL: &str = "cancel";
pub const TASK_MIGRATE_TO: &str = "migrate_to";
pub const TASK_MIGRATE_FROM: &str = "migrate_from";
pub const TASK_SHUTDOWN: &str = "do_shutdown";

/// Agent return code for success.
pub const RC_OK: i32 = 0;
/// Agent return code meaning "resource is not running".
pub const RC_NOT_RUNNING: i32 = 7;

// ── Roles ──────────────────────────────────────────────────────────

/// Role a resource is in, or should move to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unknown,
    Stopped,
    Started,
    Slave,
    Master,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Unknown => "Unknown",
            Role::Stopped => "Stopped",
            Role::Started => "Started",
            Role::Slave => "Slave",
            Role::Master => "Master",
        };
        f.write_str(s)
    }
}

// ── Discovery ──────────────────────────────────────────────────────

/// Whether a resource is probed on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverMode {
    #[default]
    Always,
    Never,
    Exclusive,
}

impl DiscoverMode {
    /// Parse the `resource-discovery` attribute. A missing value means `always`.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value {
            None | Some("always") => Some(DiscoverMode::Always),
            Some("never") => Some(DiscoverMode::Never),
            Some("exclusive") => Some(DiscoverMode::Exclusive),
            Some(_) => None,
        }
    }
}

// ── Placement strategy ─────────────────────────────────────────────

/// Cluster-wide placement strategy consulted by the node comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    #[default]
    Default,
    Utilization,
    Minimal,
    Balanced,
}

// ── Operation outcomes ─────────────────────────────────────────────

/// Execution status reported by the executor, independent of the agent rc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    Pending,
    Done,
    Cancelled,
    Timeout,
    NotSupported,
    Error,
    ErrorHard,
    ErrorFatal,
    NotInstalled,
    NotConnected,
    Invalid,
}

impl OpStatus {
    /// Numeric status code as written into transition magic.
    pub fn code(self) -> i32 {
        match self {
            OpStatus::Pending => -1,
            OpStatus::Done => 0,
            OpStatus::Cancelled => 1,
            OpStatus::Timeout => 2,
            OpStatus::NotSupported => 3,
            OpStatus::Error => 4,
            OpStatus::ErrorHard => 5,
            OpStatus::ErrorFatal => 6,
            OpStatus::NotInstalled => 7,
            OpStatus::NotConnected => 8,
            OpStatus::Invalid => 9,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let status = match code {
            -1 => OpStatus::Pending,
            0 => OpStatus::Done,
            1 => OpStatus::Cancelled,
            2 => OpStatus::Timeout,
            3 => OpStatus::NotSupported,
            4 => OpStatus::Error,
            5 => OpStatus::ErrorHard,
            6 => OpStatus::ErrorFatal,
            7 => OpStatus::NotInstalled,
            8 => OpStatus::NotConnected,
            9 => OpStatus::Invalid,
            _ => return None,
        };
        Some(status)
    }
}

/// Result of one executed resource operation, as reported by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub rsc_id: ResourceId,
    /// Task name as executed (`start`, `monitor`, `reload`, ...).
    pub op_type: String,
    /// Recurrence interval in milliseconds; 0 for one-shot operations.
    pub interval_ms: u32,
    pub call_id: i32,
    pub op_status: OpStatus,
    pub rc: i32,
    pub exit_reason: Option<String>,
    /// Instance and meta parameters the operation ran with.
    pub params: HashMap<String, String>,
    /// Epoch seconds the operation last ran.
    pub t_run: u32,
    /// Epoch seconds the rc last changed (recurring operations).
    pub t_rcchange: u32,
    /// Execution time in milliseconds.
    pub exec_time: u32,
    /// Time spent queued in milliseconds.
    pub queue_time: u32,
    /// Caller-supplied transition key, if the operation came from a transition.
    pub transition_key: Option<String>,
}

impl OperationOutcome {
    /// A completed operation with no timing or parameters.
    pub fn new(rsc_id: &str, op_type: &str, interval_ms: u32, call_id: i32) -> Self {
        Self {
            rsc_id: rsc_id.to_string(),
            op_type: op_type.to_string(),
            interval_ms,
            call_id,
            op_status: OpStatus::Done,
            rc: RC_OK,
            exit_reason: None,
            params: HashMap::new(),
            t_run: 0,
            t_rcchange: 0,
            exec_time: 0,
            queue_time: 0,
            transition_key: None,
        }
    }

    /// Whether this outcome counts as a failure against `expected_rc`.
    pub fn did_fail(&self, expected_rc: i32) -> bool {
        match self.op_status {
            OpStatus::Cancelled | OpStatus::Pending => false,
            OpStatus::NotSupported
            | OpStatus::Timeout
            | OpStatus::Error
            | OpStatus::NotConnected
            | OpStatus::Invalid => true,
            _ => self.rc != expected_rc,
        }
    }

    /// Look up a `CRM_meta_`-prefixed parameter by its short name.
    pub fn meta_value(&self, field: &str) -> Option<&str> {
        self.params
            .get(&crate::keys::meta_name(field))
            .map(String::as_str)
    }

    pub fn has_timing(&self) -> bool {
        self.t_run != 0 || self.t_rcchange != 0 || self.exec_time != 0 || self.queue_time != 0
    }
}
