//! corral placement — node eligibility, ranking and capacity accounting.
//!
//! This crate knows about nodes and capacity, not about resources'
//! actions. It orders candidate nodes for one resource and keeps the
//! per-node utilization ledger exact across assign/unassign. Choosing
//! and applying an assignment is `corral-scheduler`'s job.
//!
//! # Components
//!
//! - **`node`** — node details (shared per cycle) and per-list node copies
//! - **`eligibility`** — whether a node may host resources at all
//! - **`ranking`** — deterministic total order over candidate nodes
//! - **`ledger`** — capacity vectors and exact reserve/release

pub mod eligibility;
pub mod ledger;
pub mod node;
pub mod ranking;

pub use eligibility::{can_run_any, is_eligible};
pub use ledger::{CapacityVector, compare_capacity, release, remaining, remaining_total, reserve};
pub use node::{Node, NodeDetails, NodeIdx, NodeKind, NodePool};
pub use ranking::{RankContext, compare_nodes, sort_nodes_by_weight};
