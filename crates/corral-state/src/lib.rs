//! corral-state — operation history for the corral planner.
//!
//! Turns executed operation outcomes into durable, idempotent history
//! records and keeps them in a [redb](https://docs.rs/redb) store.
//!
//! # Architecture
//!
//! Each resource's records on a node form one `ResourceHistory`, stored as
//! JSON under `{node}/{resource}`. Records carry a transition magic string
//! for replay detection and a digest of the operation's parameters for
//! detecting configuration changes.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod digest;
pub mod error;
pub mod recorder;
pub mod store;
pub mod tables;
pub mod types;

pub use digest::{canonical_form, filter_parameters, operation_digest};
pub use error::{StateError, StateResult};
pub use recorder::{RecordContext, record};
pub use store::StateStore;
pub use types::*;
