//! Manageable resources within one planning cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use corral_core::{ResourceId, Role};
use corral_placement::{CapacityVector, Node};

use crate::action::ActionIdx;
use crate::constraint::ConstraintIdx;

/// Stable handle to a resource within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdx(pub usize);

/// Resource shape. Only primitives are placed directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Primitive,
    Group,
    Clone,
    Bundle,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Variant::Primitive => "primitive",
            Variant::Group => "group",
            Variant::Clone => "clone",
            Variant::Bundle => "bundle",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub variant: Variant,
    /// Capacity this resource consumes on whichever node hosts it.
    pub utilization: CapacityVector,
    /// Private copy of the node this resource is assigned to.
    pub allocated_to: Option<Node>,
    /// Scored candidate nodes, as produced by the constraint scoring engine.
    pub allowed_nodes: Vec<Node>,
    pub role: Role,
    pub next_role: Role,
    /// Not (re)assigned yet in this cycle.
    pub provisional: bool,
    /// Only probe on nodes named by an `exclusive` location constraint.
    pub exclusive_discover: bool,
    pub actions: Vec<ActionIdx>,
    pub locations: Vec<ConstraintIdx>,
}

impl Resource {
    pub fn new(id: &str, variant: Variant) -> Self {
        Self {
            id: id.to_string(),
            variant,
            utilization: CapacityVector::new(),
            allocated_to: None,
            allowed_nodes: Vec::new(),
            role: Role::Stopped,
            next_role: Role::Unknown,
            provisional: true,
            exclusive_discover: false,
            actions: Vec::new(),
            locations: Vec::new(),
        }
    }

    pub fn primitive(id: &str) -> Self {
        Self::new(id, Variant::Primitive)
    }

    pub fn with_utilization(mut self, utilization: CapacityVector) -> Self {
        self.utilization = utilization;
        self
    }

    pub fn with_allowed_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.allowed_nodes = nodes;
        self
    }

    pub fn is_assigned(&self) -> bool {
        self.allocated_to.is_some()
    }
}
