//! corral-scheduler — the planning cycle: assignment and actions.
//!
//! A [`Cycle`] holds one snapshot of the cluster (nodes, resources,
//! location constraints) and the actions planned against it. This crate:
//!
//! - Assigns primitive resources to ranked candidate nodes, keeping the
//!   node capacity ledger exact across reassignments
//! - Reconciles a resource's pending actions when it cannot be placed
//! - Registers actions with deduplication, flag updates and ordering
//! - Builds derived actions (pseudo, cancel, node shutdown)
//!
//! # Architecture
//!
//! ```text
//! Cycle
//!   ├── NodePool (corral-placement, NodeDetails per node)
//!   ├── resources: Vec<Resource>    (ResourceIdx)
//!   ├── actions: Vec<Action>        (ActionIdx, adjacency by index)
//!   └── constraints: Vec<LocationConstraint> (ConstraintIdx)
//! ```

pub mod action;
pub mod assign;
pub mod constraint;
pub mod cycle;
pub mod error;
pub mod log;
pub mod resource;

pub use action::{
    Action, ActionFlags, ActionIdx, AfterNodeActions, FlagUpdate, OrderEdge, OrderKind,
    ShutdownOrdering,
};
pub use constraint::{ConstraintIdx, LocationConstraint};
pub use cycle::Cycle;
pub use error::{SchedulerError, SchedulerResult};
pub use log::{describe_action, log_action};
pub use resource::{Resource, ResourceIdx, Variant};
