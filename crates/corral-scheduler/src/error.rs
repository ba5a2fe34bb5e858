//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur while building or mutating a planning cycle.
#[derive(Debug, Error, PartialEq)]
pub enum SchedulerError {
    #[error("unknown resource handle: {0}")]
    UnknownResource(usize),

    #[error("unknown node handle: {0}")]
    UnknownNode(usize),

    #[error("unknown action handle: {0}")]
    UnknownAction(usize),

    #[error("invalid location constraint {id}: {reason}")]
    InvalidConstraint { id: String, reason: String },

    #[error("resource {rsc} is a {variant}, only primitives can be assigned directly")]
    UnsupportedVariant { rsc: String, variant: String },

    #[error("node {node} is not a candidate for resource {rsc}")]
    NotACandidate { rsc: String, node: String },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
