//! Whether a node may host resources at all.

use tracing::trace;

use crate::node::{Node, NodeDetails, NodePool};

/// A node is eligible when it is online, not shutting down, not unclean,
/// not in standby and not in maintenance. A missing node is never eligible.
pub fn is_eligible(node: Option<&NodeDetails>) -> bool {
    let Some(node) = node else {
        return false;
    };

    if !node.online || node.shutdown || node.unclean || node.standby || node.maintenance {
        trace!(
            node = %node.uname,
            online = node.online,
            unclean = node.unclean,
            standby = node.standby,
            maintenance = node.maintenance,
            "node cannot run resources"
        );
        return false;
    }
    true
}

/// Whether at least one node in the list is eligible and not vetoed by weight.
pub fn can_run_any(nodes: &[Node], pool: &NodePool) -> bool {
    nodes
        .iter()
        .any(|n| n.weight >= 0 && is_eligible(pool.get(n.details)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::INFINITY;

    fn healthy(name: &str) -> NodeDetails {
        NodeDetails::new(name, name)
    }

    #[test]
    fn missing_node_is_ineligible() {
        assert!(!is_eligible(None));
    }

    #[test]
    fn healthy_node_is_eligible() {
        assert!(is_eligible(Some(&healthy("n1"))));
    }

    #[test]
    fn each_condition_disqualifies() {
        let checks: [fn(&mut NodeDetails); 5] = [
            |n| n.online = false,
            |n| n.shutdown = true,
            |n| n.unclean = true,
            |n| n.standby = true,
            |n| n.maintenance = true,
        ];
        for mutate in checks {
            let mut node = healthy("n1");
            mutate(&mut node);
            assert!(!is_eligible(Some(&node)));
        }
    }

    #[test]
    fn can_run_any_needs_non_negative_weight() {
        let mut pool = NodePool::new();
        let a = pool.add(healthy("a"));
        let mut standby = healthy("b");
        standby.standby = true;
        let b = pool.add(standby);

        assert!(!can_run_any(&[], &pool));
        assert!(!can_run_any(&[Node::new(a, -INFINITY)], &pool));
        assert!(!can_run_any(&[Node::new(b, 100)], &pool));
        assert!(can_run_any(&[Node::new(b, 100), Node::new(a, 0)], &pool));
    }
}
