//! Capacity vectors and the per-node utilization ledger.
//!
//! A resource's requirements are added to its node's utilization on
//! assignment and subtracted again on release. Vectors are kept in a
//! canonical form (sorted keys, no zero entries) so that a reserve
//! followed by a release restores the ledger to an equal value, whatever
//! keys the resource mentioned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::node::NodeDetails;

/// Quantity per utilization attribute (`cpu`, `memory`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapacityVector(BTreeMap<String, i64>);

impl CapacityVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity for `key`; absent keys are zero.
    pub fn get(&self, key: &str) -> i64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: &str, value: i64) {
        if value == 0 {
            self.0.remove(key);
        } else {
            self.0.insert(key.to_string(), value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, other: &CapacityVector) {
        for (key, value) in other.iter() {
            self.set(key, self.get(key) + value);
        }
    }

    pub fn subtract(&mut self, other: &CapacityVector) {
        for (key, value) in other.iter() {
            self.set(key, self.get(key) - value);
        }
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for CapacityVector {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        let mut vector = CapacityVector::new();
        for (key, value) in iter {
            let key = key.into();
            vector.set(&key, vector.get(&key) + value);
        }
        vector
    }
}

/// Capacity left on a node after everything assigned to it.
pub fn remaining(node: &NodeDetails) -> CapacityVector {
    let mut left = node.capacity.clone();
    left.subtract(&node.utilization);
    left
}

/// Reserve `demand` on `node` and count one more assigned resource.
pub fn reserve(node: &mut NodeDetails, demand: &CapacityVector) {
    node.utilization.add(demand);
    node.num_resources += 1;
    trace!(node = %node.uname, utilization = ?node.utilization, "reserved capacity");
}

/// Exact inverse of [`reserve`].
pub fn release(node: &mut NodeDetails, demand: &CapacityVector) {
    node.utilization.subtract(demand);
    if node.num_resources == 0 {
        warn!(node = %node.uname, "released capacity on a node with no assigned resources");
    }
    node.num_resources = node.num_resources.saturating_sub(1);
    trace!(node = %node.uname, utilization = ?node.utilization, "released capacity");
}

/// Total remaining capacity summed over every attribute.
pub fn remaining_total(node: &NodeDetails) -> i64 {
    remaining(node).iter().map(|(_, v)| v).sum()
}

/// Compare summed remaining capacity.
///
/// Negative when `a` has more left than `b`, positive for the reverse,
/// zero when the totals match. Reducing each node to one scalar keeps the
/// comparison transitive.
pub fn compare_capacity(a: &NodeDetails, b: &NodeDetails) -> i32 {
    match remaining_total(a).cmp(&remaining_total(b)) {
        std::cmp::Ordering::Greater => -1,
        std::cmp::Ordering::Less => 1,
        std::cmp::Ordering::Equal => 0,
    }
}
