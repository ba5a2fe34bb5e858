//! Operation, notify and transition key formats.
//!
//! These strings are persisted in history records and compared across
//! planning cycles, so their layout is part of the on-disk format.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix marking a parameter as meta-data rather than an agent parameter.
pub const META_PREFIX: &str = "CRM_meta_";

/// Filler uuid used when an outcome arrives without a transition key.
pub const PLACEHOLDER_UUID: &str = "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx";

/// Tasks whose names contain `_` and must not be split when parsing keys.
const COMPOUND_TASKS: &[&str] = &["migrate_to", "migrate_from"];

#[derive(Debug, Error, PartialEq)]
pub enum KeyError {
    #[error("invalid operation key: {0}")]
    InvalidOpKey(String),
    #[error("invalid transition key: {0}")]
    InvalidTransitionKey(String),
    #[error("invalid transition magic: {0}")]
    InvalidMagic(String),
}

/// Full name of a meta parameter, e.g. `notify_type` -> `CRM_meta_notify_type`.
pub fn meta_name(field: &str) -> String {
    format!("{META_PREFIX}{field}")
}

/// `<rsc>_<task>_<interval_ms>`
pub fn op_key(rsc_id: &str, task: &str, interval_ms: u32) -> String {
    format!("{rsc_id}_{task}_{interval_ms}")
}

/// `<rsc>_<notify_type>_notify_<notify_operation>_0`
pub fn notify_key(rsc_id: &str, notify_type: &str, notify_op: &str) -> String {
    format!("{rsc_id}_{notify_type}_notify_{notify_op}_0")
}

/// Split an operation key into `(resource, task, interval_ms)`.
///
/// Splits from the right, since resource ids may themselves contain `_`.
pub fn parse_op_key(key: &str) -> Result<(String, String, u32), KeyError> {
    let invalid = || KeyError::InvalidOpKey(key.to_string());

    let (head, interval) = key.rsplit_once('_').ok_or_else(invalid)?;
    let interval_ms: u32 = interval.parse().map_err(|_| invalid())?;

    let compound = COMPOUND_TASKS.iter().find_map(|task| {
        head.strip_suffix(task)
            .and_then(|rest| rest.strip_suffix('_'))
            .map(|rsc| (rsc, *task))
    });
    let (rsc, task) = match compound {
        Some(split) => split,
        None => head.rsplit_once('_').ok_or_else(invalid)?,
    };

    if rsc.is_empty() || task.is_empty() {
        return Err(invalid());
    }
    Ok((rsc.to_string(), task.to_string(), interval_ms))
}

/// Identity of one action inside one transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionKey {
    pub action_id: i32,
    pub transition_id: i32,
    pub target_rc: i32,
    pub uuid: String,
}

impl TransitionKey {
    /// Deterministic stand-in for outcomes that did not come from a transition.
    pub fn placeholder(call_id: i32, target_rc: i32) -> Self {
        Self {
            action_id: call_id,
            transition_id: -1,
            target_rc,
            uuid: PLACEHOLDER_UUID.to_string(),
        }
    }

    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let invalid = || KeyError::InvalidTransitionKey(key.to_string());
        let mut parts = key.splitn(4, ':');
        let mut number = || -> Result<i32, KeyError> {
            parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(invalid)
        };
        let action_id = number()?;
        let transition_id = number()?;
        let target_rc = number()?;
        let uuid = parts.next().filter(|u| !u.is_empty()).ok_or_else(invalid)?;
        Ok(Self {
            action_id,
            transition_id,
            target_rc,
            uuid: uuid.to_string(),
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.uuid == PLACEHOLDER_UUID
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.action_id, self.transition_id, self.target_rc, self.uuid
        )
    }
}

/// `<status>:<rc>;<transition key>`, binding a result to the transition that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionMagic {
    pub op_status: i32,
    pub rc: i32,
    pub key: String,
}

impl TransitionMagic {
    pub fn new(transition_key: &str, op_status: i32, rc: i32) -> Self {
        Self {
            op_status,
            rc,
            key: transition_key.to_string(),
        }
    }

    pub fn parse(magic: &str) -> Result<Self, KeyError> {
        let invalid = || KeyError::InvalidMagic(magic.to_string());
        let (result, key) = magic.split_once(';').ok_or_else(invalid)?;
        let (status, rc) = result.split_once(':').ok_or_else(invalid)?;
        if key.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            op_status: status.parse().map_err(|_| invalid())?,
            rc: rc.parse().map_err(|_| invalid())?,
            key: key.to_string(),
        })
    }
}

impl fmt::Display for TransitionMagic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{};{}", self.op_status, self.rc, self.key)
    }
}
