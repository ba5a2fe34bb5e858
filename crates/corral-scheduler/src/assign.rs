//! Resource assignment. Binds a resource to a node, or to nothing.
//!
//! Assigning always releases the previous assignment first, so the node
//! ledger sees an exact release/reserve pair for every move. Failing to
//! find a node is a normal outcome: the resource is left stopped with its
//! pending actions reconciled to match.

use tracing::{debug, info};

use corral_core::{RC_NOT_RUNNING, Role, TASK_START, TASK_STOP};
use corral_placement::{Node, NodeIdx, is_eligible, release, reserve};

use crate::action::{ActionFlags, FlagUpdate};
use crate::cycle::Cycle;
use crate::error::{SchedulerError, SchedulerResult};
use crate::resource::{ResourceIdx, Variant};

impl Cycle {
    /// Assign `rsc` to the `chosen` candidate, or leave it unassigned.
    ///
    /// Unless `force` is set, a chosen node with negative weight, or one
    /// that is ineligible and not a guest node, is vetoed. Guest nodes are
    /// accepted while down because their host is itself being scheduled.
    /// The chosen entry in `candidates` has its count bumped.
    ///
    /// Returns `Ok(true)` when the resource ends up assigned.
    pub fn assign(
        &mut self,
        rsc: ResourceIdx,
        candidates: &mut [Node],
        chosen: Option<NodeIdx>,
        force: bool,
    ) -> SchedulerResult<bool> {
        let resource = self.resource(rsc)?;
        if resource.variant != Variant::Primitive {
            return Err(SchedulerError::UnsupportedVariant {
                rsc: resource.id.clone(),
                variant: resource.variant.to_string(),
            });
        }
        let rsc_id = resource.id.clone();

        let mut chosen = match chosen {
            Some(node) => {
                let position = candidates
                    .iter()
                    .position(|n| n.details == node)
                    .ok_or_else(|| SchedulerError::NotACandidate {
                        rsc: rsc_id.clone(),
                        node: self.nodes.uname(node).to_string(),
                    })?;
                Some(position)
            }
            None => None,
        };

        if let (false, Some(position)) = (force, chosen) {
            let node = candidates[position];
            let details = self.node_details(node.details)?;
            let eligible = is_eligible(Some(details));
            if node.weight < 0 || (!eligible && !details.is_guest()) {
                debug!(
                    rsc = %rsc_id,
                    node = %details.uname,
                    eligible,
                    weight = node.weight,
                    "all nodes for resource are unavailable, unclean or shutting down"
                );
                self.resource_mut(rsc)?.next_role = Role::Stopped;
                chosen = None;
            }
        }

        self.deallocate(rsc)?;

        let Some(position) = chosen else {
            debug!(rsc = %rsc_id, candidates = candidates.len(), "could not allocate a node");
            let resource = self.resource_mut(rsc)?;
            resource.provisional = true;
            resource.next_role = Role::Stopped;
            self.reconcile_unassigned(rsc)?;
            return Ok(false);
        };

        let node = candidates[position];
        let resource = self.resource_mut(rsc)?;
        resource.provisional = false;
        resource.allocated_to = Some(node);
        let demand = resource.utilization.clone();

        let details = self
            .nodes
            .get_mut(node.details)
            .ok_or(SchedulerError::UnknownNode(node.details.0))?;
        details.allocated.push(rsc_id.clone());
        reserve(details, &demand);
        candidates[position].count += 1;

        debug!(rsc = %rsc_id, node = %details.uname, "assigned resource");
        Ok(true)
    }

    /// Undo the resource's current assignment, if it has one.
    pub fn deallocate(&mut self, rsc: ResourceIdx) -> SchedulerResult<()> {
        let resource = self.resource(rsc)?;
        let Some(old) = resource.allocated_to else {
            return Ok(());
        };
        let rsc_id = resource.id.clone();
        let demand = resource.utilization.clone();

        let details = self
            .nodes
            .get_mut(old.details)
            .ok_or(SchedulerError::UnknownNode(old.details.0))?;
        info!(rsc = %rsc_id, node = %details.uname, "deallocating resource");
        if let Some(pos) = details.allocated.iter().position(|id| *id == rsc_id) {
            details.allocated.remove(pos);
        }
        release(details, &demand);

        let resource = self.resource_mut(rsc)?;
        resource.allocated_to = None;
        resource.provisional = true;
        Ok(())
    }

    /// Bring a resource's pending actions in line with it being stopped.
    ///
    /// Stops become optional, starts become unrunnable, recurring monitors
    /// are cancelled unless they expect "not running" (those still describe
    /// the stopped state correctly).
    fn reconcile_unassigned(&mut self, rsc: ResourceIdx) -> SchedulerResult<()> {
        let actions = self.resource(rsc)?.actions.clone();
        for idx in actions {
            let action = self.action(idx)?;
            debug!(action = %action.uuid, "reconciling action of unassigned resource");

            let update = if action.task == TASK_STOP {
                Some((ActionFlags::OPTIONAL, FlagUpdate::Set))
            } else if action.task == TASK_START
                || (action.is_recurring() && action.target_rc() != Some(RC_NOT_RUNNING))
            {
                Some((ActionFlags::RUNNABLE, FlagUpdate::Clear))
            } else {
                None
            };
            if let Some((flags, update)) = update {
                self.update_action_flags(idx, flags, update)?;
            }
        }
        Ok(())
    }
}
