//! Scheduled actions, their flags, and builders for derived actions.
//!
//! Actions live in the cycle's arena and point at each other through
//! `ActionIdx` adjacency lists. Resource actions are listed on their
//! resource; cluster-scoped actions (node shutdown) belong to the cycle
//! alone.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use corral_core::{TASK_CANCEL, TASK_SHUTDOWN, op_key, parse_op_key};
use corral_placement::{Node, NodeIdx, is_eligible};

use crate::cycle::Cycle;
use crate::error::SchedulerResult;
use crate::resource::ResourceIdx;

/// Meta key: task name an action refers to (cancel ops).
pub const META_TASK: &str = "operation";
/// Meta key: interval in milliseconds an action refers to.
pub const META_INTERVAL: &str = "interval";
/// Meta key: rc the executor should expect from this action.
pub const META_TARGET_RC: &str = "op_target_rc";
/// Meta key: the transition need not wait for this action's acknowledgment.
pub const META_NO_WAIT: &str = "op_no_wait";

/// Stable handle to an action within one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionIdx(pub usize);

/// Independent boolean flags on an action.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionFlags(u32);

impl ActionFlags {
    pub const NONE: ActionFlags = ActionFlags(0);
    /// Only needed if something else requires it.
    pub const OPTIONAL: ActionFlags = ActionFlags(1 << 0);
    /// All prerequisites can be satisfied.
    pub const RUNNABLE: ActionFlags = ActionFlags(1 << 1);
    /// Marker for graph sequencing; never sent to an executor.
    pub const PSEUDO: ActionFlags = ActionFlags(1 << 2);
    /// Already handled by the graph builder.
    pub const PROCESSED: ActionFlags = ActionFlags(1 << 3);
    /// Written into the serialized transition graph.
    pub const DUMPED: ActionFlags = ActionFlags(1 << 4);
    /// Ordering edges have been deduplicated.
    pub const DEDUP: ActionFlags = ActionFlags(1 << 5);

    const NAMES: [(ActionFlags, &'static str); 6] = [
        (Self::OPTIONAL, "optional"),
        (Self::RUNNABLE, "runnable"),
        (Self::PSEUDO, "pseudo"),
        (Self::PROCESSED, "processed"),
        (Self::DUMPED, "dumped"),
        (Self::DEDUP, "dedup"),
    ];

    pub fn contains(self, other: ActionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ActionFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: ActionFlags) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ActionFlags {
    type Output = ActionFlags;

    fn bitor(self, rhs: ActionFlags) -> ActionFlags {
        ActionFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ActionFlags {
    fn bitor_assign(&mut self, rhs: ActionFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ActionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{{{}}}", names.join("|"))
    }
}

/// Whether a flag update sets or clears the given flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagUpdate {
    Set,
    Clear,
}

/// Strength of an ordering edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    /// Order only if both actions happen anyway.
    Optional,
    /// The later action requires the earlier one.
    Mandatory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEdge {
    pub action: ActionIdx,
    pub kind: OrderKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionIdx,
    /// Operation key, e.g. `db_monitor_10000`.
    pub uuid: String,
    /// Owning resource; `None` for cluster-scoped actions.
    pub rsc: Option<ResourceIdx>,
    pub task: String,
    /// For cancel ops: the task being cancelled.
    pub cancel_task: Option<String>,
    /// Private copy of the node the action runs on.
    pub node: Option<Node>,
    pub interval_ms: u32,
    pub flags: ActionFlags,
    pub meta: BTreeMap<String, String>,
    /// Actions that must happen before this one.
    pub actions_before: Vec<OrderEdge>,
    /// Actions that must happen after this one.
    pub actions_after: Vec<OrderEdge>,
}

impl Action {
    pub fn is_set(&self, flags: ActionFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn is_recurring(&self) -> bool {
        self.interval_ms > 0
    }

    pub fn target_rc(&self) -> Option<i32> {
        self.meta.get(META_TARGET_RC).and_then(|rc| rc.parse().ok())
    }
}

/// Orders a node's shutdown after the actions that need the node.
pub trait ShutdownOrdering {
    fn order_shutdown(&self, cycle: &mut Cycle, node: NodeIdx, shutdown: ActionIdx) -> SchedulerResult<()>;
}

/// Orders every resource action placed on the node before its shutdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct AfterNodeActions;

impl ShutdownOrdering for AfterNodeActions {
    fn order_shutdown(&self, cycle: &mut Cycle, node: NodeIdx, shutdown: ActionIdx) -> SchedulerResult<()> {
        let before: Vec<ActionIdx> = cycle
            .actions()
            .filter(|(idx, a)| {
                *idx != shutdown && a.rsc.is_some() && a.node.is_some_and(|n| n.details == node)
            })
            .map(|(idx, _)| idx)
            .collect();
        for action in before {
            cycle.order_actions(action, shutdown, OrderKind::Optional)?;
        }
        Ok(())
    }
}

impl Cycle {
    /// Find or register an action.
    ///
    /// An action with the same key, task and node is reused; asking for a
    /// non-optional copy of an optional action makes it mandatory. New
    /// resource actions are runnable only on an eligible node (guest nodes
    /// are assumed to come up).
    pub fn custom_action(
        &mut self,
        rsc: Option<ResourceIdx>,
        key: &str,
        task: &str,
        node: Option<Node>,
        optional: bool,
    ) -> SchedulerResult<ActionIdx> {
        let same_node = |a: &Action| match (a.node, node) {
            (None, None) => true,
            (Some(x), Some(y)) => x.same_node(&y),
            _ => false,
        };
        let existing = match rsc {
            Some(r) => self
                .resource(r)?
                .actions
                .iter()
                .copied()
                .find(|idx| {
                    self.actions
                        .get(idx.0)
                        .is_some_and(|a| a.uuid == key && a.task == task && same_node(a))
                }),
            None => self
                .actions
                .iter()
                .find(|a| a.rsc.is_none() && a.uuid == key && a.task == task && same_node(a))
                .map(|a| a.id),
        };

        if let Some(idx) = existing {
            if !optional {
                self.update_action_flags(idx, ActionFlags::OPTIONAL, FlagUpdate::Clear)?;
            }
            return Ok(idx);
        }

        if let Some(n) = node {
            self.node_details(n.details)?;
        }

        let mut flags = ActionFlags::NONE;
        if optional {
            flags |= ActionFlags::OPTIONAL;
        }
        let runnable = match (rsc, node) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(_), Some(n)) => self
                .nodes
                .get(n.details)
                .is_some_and(|d| is_eligible(Some(d)) || d.is_guest()),
        };
        if runnable {
            flags |= ActionFlags::RUNNABLE;
        }

        let interval_ms = parse_op_key(key).map(|(_, _, i)| i).unwrap_or(0);
        let idx = ActionIdx(self.actions.len());
        self.actions.push(Action {
            id: idx,
            uuid: key.to_string(),
            rsc,
            task: task.to_string(),
            cancel_task: None,
            node,
            interval_ms,
            flags,
            meta: BTreeMap::new(),
            actions_before: Vec::new(),
            actions_after: Vec::new(),
        });
        if let Some(r) = rsc {
            self.resource_mut(r)?.actions.push(idx);
        }
        trace!(action = key, ?flags, "action registered");
        Ok(idx)
    }

    /// Set or clear flags on an action. Returns whether anything changed.
    pub fn update_action_flags(
        &mut self,
        idx: ActionIdx,
        flags: ActionFlags,
        update: FlagUpdate,
    ) -> SchedulerResult<bool> {
        let action = self.action_mut(idx)?;
        let before = action.flags;
        match update {
            FlagUpdate::Set => action.flags.insert(flags),
            FlagUpdate::Clear => action.flags.remove(flags),
        }
        let changed = before != action.flags;
        if changed {
            trace!(action = %action.uuid, ?flags, ?update, now = ?action.flags, "action flags updated");
        }
        Ok(changed)
    }

    /// Record that `first` must precede `then`. Duplicate edges are ignored.
    pub fn order_actions(&mut self, first: ActionIdx, then: ActionIdx, kind: OrderKind) -> SchedulerResult<()> {
        self.action(then)?;
        let after = OrderEdge { action: then, kind };
        let first_action = self.action_mut(first)?;
        if first_action.actions_after.contains(&after) {
            return Ok(());
        }
        first_action.actions_after.push(after);
        self.action_mut(then)?.actions_before.push(OrderEdge {
            action: first,
            kind,
        });
        Ok(())
    }

    /// Node-less marker action for `rsc`.
    ///
    /// Pseudo actions have no executor step, so they are always runnable;
    /// `runnable` is accepted for symmetry with real actions and ignored.
    pub fn pseudo_action(
        &mut self,
        rsc: ResourceIdx,
        task: &str,
        optional: bool,
        runnable: bool,
    ) -> SchedulerResult<ActionIdx> {
        let key = op_key(&self.resource(rsc)?.id, task, 0);
        let idx = self.custom_action(Some(rsc), &key, task, None, optional)?;
        self.update_action_flags(idx, ActionFlags::PSEUDO | ActionFlags::RUNNABLE, FlagUpdate::Set)?;
        trace!(action = %key, requested_runnable = runnable, "pseudo action");
        Ok(idx)
    }

    /// Action telling the executor to stop the recurring `task` at `interval_ms` on `node`.
    pub fn cancel_op(
        &mut self,
        rsc: ResourceIdx,
        task: &str,
        interval_ms: u32,
        node: Node,
    ) -> SchedulerResult<ActionIdx> {
        let key = op_key(&self.resource(rsc)?.id, task, interval_ms);
        let idx = self.custom_action(Some(rsc), &key, TASK_CANCEL, Some(node), false)?;

        let action = self.action_mut(idx)?;
        action.task = TASK_CANCEL.to_string();
        action.cancel_task = Some(task.to_string());
        action.interval_ms = interval_ms;
        action.meta.insert(META_TASK.to_string(), task.to_string());
        action
            .meta
            .insert(META_INTERVAL.to_string(), interval_ms.to_string());
        Ok(idx)
    }

    /// Shutdown action for `node`, ordered after the node's other actions.
    pub fn shutdown_op(
        &mut self,
        node: NodeIdx,
        ordering: &dyn ShutdownOrdering,
    ) -> SchedulerResult<ActionIdx> {
        let uname = self.node_details(node)?.uname.clone();
        let key = format!("{TASK_SHUTDOWN}-{uname}");
        let idx = self.custom_action(None, &key, TASK_SHUTDOWN, Some(Node::new(node, 0)), false)?;

        info!(node = %uname, "scheduling shutdown of node");
        ordering.order_shutdown(self, node, idx)?;
        self.action_mut(idx)?
            .meta
            .insert(META_NO_WAIT.to_string(), "true".to_string());
        Ok(idx)
    }
}
