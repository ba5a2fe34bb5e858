//! Cluster nodes as seen by one planning cycle.
//!
//! A node has two halves. [`NodeDetails`] is shared state for the whole
//! cycle (health, capacity, what is assigned to it) and lives in the
//! [`NodePool`]. [`Node`] is a cheap per-list copy that points at the
//! details and carries a list-specific weight, so every resource can hold
//! its own scored view of the same node.

use serde::{Deserialize, Serialize};

use corral_core::{ResourceId, Score};

use crate::ledger::CapacityVector;

/// Stable handle to a node's details within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIdx(pub usize);

/// How a node joined the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Full cluster member.
    #[default]
    Member,
    /// Remote node reached through a connection resource.
    Remote,
    /// Remote node hosted inside a resource (VM, container).
    Guest,
}

/// Per-cycle node state shared by every copy of the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetails {
    /// Cluster-wide node uuid.
    pub id: String,
    /// Node name; also the final ranking tie-break.
    pub uname: String,
    pub kind: NodeKind,
    pub online: bool,
    pub unclean: bool,
    pub standby: bool,
    /// A shutdown has been requested for this node.
    pub shutdown: bool,
    pub maintenance: bool,
    /// Total capacity per utilization attribute.
    pub capacity: CapacityVector,
    /// Capacity currently reserved by assigned resources.
    pub utilization: CapacityVector,
    /// Number of resources assigned to this node in the current cycle.
    pub num_resources: u32,
    /// Resources assigned to this node in the current cycle.
    pub allocated: Vec<ResourceId>,
}

impl NodeDetails {
    /// An online, healthy member node with no capacity attributes.
    pub fn new(id: &str, uname: &str) -> Self {
        Self {
            id: id.to_string(),
            uname: uname.to_string(),
            kind: NodeKind::Member,
            online: true,
            unclean: false,
            standby: false,
            shutdown: false,
            maintenance: false,
            capacity: CapacityVector::new(),
            utilization: CapacityVector::new(),
            num_resources: 0,
            allocated: Vec::new(),
        }
    }

    pub fn with_capacity(mut self, capacity: CapacityVector) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn is_guest(&self) -> bool {
        self.kind == NodeKind::Guest
    }
}

/// A node as it appears in one list (allowed nodes, constraint, assignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub details: NodeIdx,
    pub weight: Score,
    /// Resources placed through this particular copy.
    pub count: u32,
}

impl Node {
    pub fn new(details: NodeIdx, weight: Score) -> Self {
        Self {
            details,
            weight,
            count: 0,
        }
    }

    /// Whether both copies refer to the same physical node.
    pub fn same_node(&self, other: &Node) -> bool {
        self.details == other.details
    }
}

/// Arena of node details for one cycle.
#[derive(Debug, Clone, Default)]
pub struct NodePool {
    nodes: Vec<NodeDetails>,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, details: NodeDetails) -> NodeIdx {
        self.nodes.push(details);
        NodeIdx(self.nodes.len() - 1)
    }

    pub fn get(&self, idx: NodeIdx) -> Option<&NodeDetails> {
        self.nodes.get(idx.0)
    }

    pub fn get_mut(&mut self, idx: NodeIdx) -> Option<&mut NodeDetails> {
        self.nodes.get_mut(idx.0)
    }

    pub fn find_by_uname(&self, uname: &str) -> Option<NodeIdx> {
        self.nodes
            .iter()
            .position(|n| n.uname == uname)
            .map(NodeIdx)
    }

    /// Name of the node behind `idx`, or `"<unknown>"` for a stale handle.
    pub fn uname(&self, idx: NodeIdx) -> &str {
        self.get(idx).map_or("<unknown>", |n| n.uname.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIdx, &NodeDetails)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIdx(i), n))
    }

    /// One copy of every node at the given weight.
    pub fn all_at(&self, weight: Score) -> Vec<Node> {
        (0..self.nodes.len())
            .map(|i| Node::new(NodeIdx(i), weight))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_hands_out_sequential_handles() {
        let mut pool = NodePool::new();
        let a = pool.add(NodeDetails::new("1", "alpha"));
        let b = pool.add(NodeDetails::new("2", "beta"));

        assert_eq!(a, NodeIdx(0));
        assert_eq!(b, NodeIdx(1));
        assert_eq!(pool.find_by_uname("beta"), Some(b));
        assert_eq!(pool.uname(a), "alpha");
        assert_eq!(pool.uname(NodeIdx(9)), "<unknown>");
    }

    #[test]
    fn copies_share_details_but_not_weight() {
        let mut pool = NodePool::new();
        let idx = pool.add(NodeDetails::new("1", "alpha"));
        let one = Node::new(idx, 10);
        let two = Node::new(idx, -5);

        assert!(one.same_node(&two));
        assert_ne!(one.weight, two.weight);
    }

    #[test]
    fn all_at_covers_every_node() {
        let mut pool = NodePool::new();
        pool.add(NodeDetails::new("1", "alpha"));
        pool.add(NodeDetails::new("2", "beta"));

        let nodes = pool.all_at(0);
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.weight == 0));
    }
}
