//! Location constraints: resource-to-node preferences for one cycle.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use corral_core::{DiscoverMode, Role, Score};
use corral_placement::{Node, NodeIdx};

use crate::cycle::Cycle;
use crate::error::{SchedulerError, SchedulerResult};
use crate::resource::ResourceIdx;

/// Stable handle to a location constraint within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintIdx(pub usize);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConstraint {
    pub id: String,
    pub rsc: ResourceIdx,
    /// Weighted node copies this constraint applies to (empty when node-less).
    pub nodes: Vec<Node>,
    /// Role the constraint is restricted to; `Unknown` applies to every role.
    pub role_filter: Role,
    pub discover_mode: DiscoverMode,
}

impl Cycle {
    /// Create a location constraint and attach it to its resource.
    ///
    /// A constraint without a node must carry weight 0. An unrecognised
    /// discovery mode is logged and treated as `always`.
    pub fn new_location_constraint(
        &mut self,
        id: &str,
        rsc: ResourceIdx,
        weight: Score,
        discover_mode: Option<&str>,
        node: Option<NodeIdx>,
    ) -> SchedulerResult<ConstraintIdx> {
        let invalid = |reason: &str| SchedulerError::InvalidConstraint {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            error!(rsc = rsc.0, "location constraint without an id");
            return Err(invalid("missing id"));
        }
        if self.resource(rsc).is_err() {
            error!(constraint = id, "location constraint for unknown resource");
            return Err(invalid("unknown resource"));
        }
        if node.is_none() && weight != 0 {
            return Err(invalid("weight without a node"));
        }
        if let Some(node) = node {
            self.node_details(node)?;
        }

        let mode = match DiscoverMode::parse(discover_mode) {
            Some(mode) => mode,
            None => {
                error!(
                    constraint = id,
                    value = discover_mode.unwrap_or_default(),
                    "invalid resource-discovery value in location constraint"
                );
                DiscoverMode::Always
            }
        };

        let constraint = LocationConstraint {
            id: id.to_string(),
            rsc,
            nodes: node.map(|n| vec![Node::new(n, weight)]).unwrap_or_default(),
            role_filter: Role::Unknown,
            discover_mode: mode,
        };
        self.constraints.push(constraint);
        let idx = ConstraintIdx(self.constraints.len() - 1);

        let resource = self.resource_mut(rsc)?;
        if mode == DiscoverMode::Exclusive {
            resource.exclusive_discover = true;
        }
        resource.locations.push(idx);
        debug!(constraint = id, rsc = %resource.id, weight, ?mode, "location constraint created");
        Ok(idx)
    }
}
