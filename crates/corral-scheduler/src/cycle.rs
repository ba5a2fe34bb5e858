//! The planning cycle: every piece of state one scheduler run works on.
//!
//! A `Cycle` owns the node pool, resources, actions and location
//! constraints for a single snapshot. Everything refers to everything
//! else by arena handle (`NodeIdx`, `ResourceIdx`, `ActionIdx`,
//! `ConstraintIdx`), so the action graph may contain cycles without any
//! ownership cycles. Dropping the `Cycle` releases the whole snapshot.

use corral_core::{PlacementStrategy, PlannerConfig};
use corral_placement::{Node, NodeDetails, NodeIdx, NodePool, sort_nodes_by_weight};

use crate::action::{Action, ActionIdx};
use crate::constraint::LocationConstraint;
use crate::error::{SchedulerError, SchedulerResult};
use crate::resource::{Resource, ResourceIdx};

#[derive(Debug, Default)]
pub struct Cycle {
    pub config: PlannerConfig,
    pub nodes: NodePool,
    pub(crate) resources: Vec<Resource>,
    pub(crate) actions: Vec<Action>,
    pub(crate) constraints: Vec<LocationConstraint>,
}

impl Cycle {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn strategy(&self) -> PlacementStrategy {
        self.config.placement.strategy
    }

    // ── Nodes ──────────────────────────────────────────────────────

    pub fn add_node(&mut self, details: NodeDetails) -> NodeIdx {
        self.nodes.add(details)
    }

    pub(crate) fn node_details(&self, idx: NodeIdx) -> SchedulerResult<&NodeDetails> {
        self.nodes.get(idx).ok_or(SchedulerError::UnknownNode(idx.0))
    }

    // ── Resources ──────────────────────────────────────────────────

    pub fn add_resource(&mut self, resource: Resource) -> ResourceIdx {
        self.resources.push(resource);
        ResourceIdx(self.resources.len() - 1)
    }

    pub fn resource(&self, idx: ResourceIdx) -> SchedulerResult<&Resource> {
        self.resources
            .get(idx.0)
            .ok_or(SchedulerError::UnknownResource(idx.0))
    }

    pub fn resource_mut(&mut self, idx: ResourceIdx) -> SchedulerResult<&mut Resource> {
        self.resources
            .get_mut(idx.0)
            .ok_or(SchedulerError::UnknownResource(idx.0))
    }

    pub fn find_resource(&self, id: &str) -> Option<ResourceIdx> {
        self.resources
            .iter()
            .position(|r| r.id == id)
            .map(ResourceIdx)
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceIdx, &Resource)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceIdx(i), r))
    }

    // ── Actions ────────────────────────────────────────────────────

    pub fn action(&self, idx: ActionIdx) -> SchedulerResult<&Action> {
        self.actions
            .get(idx.0)
            .ok_or(SchedulerError::UnknownAction(idx.0))
    }

    pub(crate) fn action_mut(&mut self, idx: ActionIdx) -> SchedulerResult<&mut Action> {
        self.actions
            .get_mut(idx.0)
            .ok_or(SchedulerError::UnknownAction(idx.0))
    }

    pub fn actions(&self) -> impl Iterator<Item = (ActionIdx, &Action)> {
        self.actions
            .iter()
            .enumerate()
            .map(|(i, a)| (ActionIdx(i), a))
    }

    pub fn constraints(&self) -> &[LocationConstraint] {
        &self.constraints
    }

    // ── Ranking ────────────────────────────────────────────────────

    /// The resource's allowed nodes, best host first.
    pub fn ranked_candidates(&self, rsc: ResourceIdx) -> SchedulerResult<Vec<Node>> {
        let resource = self.resource(rsc)?;
        let mut candidates = resource.allowed_nodes.clone();
        let active = resource.allocated_to.map(|n| n.details);
        sort_nodes_by_weight(&mut candidates, active, &self.nodes, self.strategy());
        Ok(candidates)
    }

    /// Rank the resource's allowed nodes and assign it to the best one.
    ///
    /// Returns whether the resource ended up assigned. The ranked list
    /// (with updated per-copy counts) replaces the resource's allowed nodes.
    pub fn place(&mut self, rsc: ResourceIdx) -> SchedulerResult<bool> {
        let mut candidates = self.ranked_candidates(rsc)?;
        let chosen = candidates.first().map(|n| n.details);
        let assigned = self.assign(rsc, &mut candidates, chosen, false)?;
        self.resource_mut(rsc)?.allowed_nodes = candidates;
        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::INFINITY;

    #[test]
    fn handles_are_checked() {
        let cycle = Cycle::default();
        assert_eq!(
            cycle.resource(ResourceIdx(3)).unwrap_err(),
            SchedulerError::UnknownResource(3)
        );
        assert_eq!(
            cycle.action(ActionIdx(0)).unwrap_err(),
            SchedulerError::UnknownAction(0)
        );
    }

    #[test]
    fn ranked_candidates_prefer_weight() {
        let mut cycle = Cycle::default();
        let a = cycle.add_node(NodeDetails::new("1", "alpha"));
        let b = cycle.add_node(NodeDetails::new("2", "beta"));
        let rsc = cycle.add_resource(
            Resource::primitive("web").with_allowed_nodes(vec![Node::new(a, 0), Node::new(b, 50)]),
        );

        let ranked = cycle.ranked_candidates(rsc).unwrap();
        assert_eq!(ranked[0].details, b);
        assert_eq!(cycle.find_resource("web"), Some(rsc));
    }

    #[test]
    fn place_assigns_best_candidate() {
        let mut cycle = Cycle::default();
        let a = cycle.add_node(NodeDetails::new("1", "alpha"));
        let b = cycle.add_node(NodeDetails::new("2", "beta"));
        let rsc = cycle.add_resource(
            Resource::primitive("web").with_allowed_nodes(vec![Node::new(a, 10), Node::new(b, 0)]),
        );

        assert!(cycle.place(rsc).unwrap());
        let resource = cycle.resource(rsc).unwrap();
        assert_eq!(resource.allocated_to.map(|n| n.details), Some(a));
        assert_eq!(resource.allowed_nodes[0].count, 1);
    }

    #[test]
    fn place_with_only_banned_nodes_stops_resource() {
        let mut cycle = Cycle::default();
        let a = cycle.add_node(NodeDetails::new("1", "alpha"));
        let rsc = cycle.add_resource(
            Resource::primitive("web").with_allowed_nodes(vec![Node::new(a, -INFINITY)]),
        );

        assert!(!cycle.place(rsc).unwrap());
        assert!(!cycle.resource(rsc).unwrap().is_assigned());
    }
}
