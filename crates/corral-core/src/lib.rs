//! corral-core — shared vocabulary for the corral placement planner.
//!
//! Scores, roles, operation outcomes, operation/transition keys,
//! feature-set versions and planner configuration. Every other corral
//! crate depends on this one; it depends on nothing internal.

pub mod config;
pub mod keys;
pub mod telemetry;
pub mod types;
pub mod version;

pub use config::{ConfigError, HistoryConfig, PlacementConfig, PlannerConfig};
pub use telemetry::init_tracing;
pub use keys::{KeyError, TransitionKey, TransitionMagic, meta_name, notify_key, op_key, parse_op_key};
pub use types::*;
pub use version::{CURRENT_FEATURE_SET, TIMING_FEATURE_SET, at_least, compare_version};
