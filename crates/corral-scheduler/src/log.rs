//! Human-readable action summaries for trace logs.

use tracing::trace;

use corral_core::TASK_SHUTDOWN;

use crate::action::{ActionFlags, ActionIdx, OrderEdge};
use crate::cycle::Cycle;
use crate::error::SchedulerResult;

/// One-line summary of an action.
///
/// Looks like `Optional Action 3: (Provisional) db_start_0 on alpha`.
/// Pseudo actions carry no node; a real action without one shows `<none>`.
pub fn describe_action(cycle: &Cycle, idx: ActionIdx) -> SchedulerResult<String> {
    let action = cycle.action(idx)?;

    let desc = if action.is_set(ActionFlags::OPTIONAL) {
        "Optional "
    } else if action.is_set(ActionFlags::PSEUDO) {
        "Pseudo "
    } else if action.is_set(ActionFlags::RUNNABLE) {
        ""
    } else {
        "!!Non-Startable!! "
    };

    let node = if action.is_set(ActionFlags::PSEUDO) {
        None
    } else {
        Some(match action.node {
            Some(n) => cycle.nodes.uname(n.details),
            None => "<none>",
        })
    };
    let on = node.map(|uname| format!(" on {uname}")).unwrap_or_default();

    if action.task == TASK_SHUTDOWN {
        return Ok(format!("{desc}Action {}: {}{on}", idx.0, action.task));
    }

    let provisional = match action.rsc {
        Some(r) if cycle.resource(r)?.provisional => "(Provisional) ",
        _ => "",
    };
    Ok(format!("{desc}Action {}: {provisional}{}{on}", idx.0, action.uuid))
}

/// Trace an action, optionally with the actions ordered around it.
pub fn log_action(cycle: &Cycle, idx: ActionIdx, details: bool) -> SchedulerResult<()> {
    let summary = describe_action(cycle, idx)?;
    let action = cycle.action(idx)?;
    match action.rsc {
        Some(r) => trace!(rsc = %cycle.resource(r)?.id, "{summary}"),
        None => trace!("{summary}"),
    }
    if !details {
        return Ok(());
    }

    let log_edges = |label: &str, edges: &[OrderEdge]| -> SchedulerResult<()> {
        for edge in edges {
            let other = describe_action(cycle, edge.action)?;
            trace!(kind = ?edge.kind, "\t{label}: {other}");
        }
        Ok(())
    };
    log_edges("before", &action.actions_before)?;
    log_edges("after", &action.actions_after)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{AfterNodeActions, FlagUpdate, OrderKind};
    use crate::resource::Resource;
    use corral_core::TASK_START;
    use corral_placement::{Node, NodeDetails};

    fn cycle() -> (Cycle, crate::resource::ResourceIdx, Node) {
        let mut cycle = Cycle::default();
        let node = cycle.add_node(NodeDetails::new("1", "alpha"));
        let rsc = cycle.add_resource(Resource::primitive("db"));
        (cycle, rsc, Node::new(node, 0))
    }

    #[test]
    fn provisional_resource_action() {
        let (mut cycle, rsc, node) = cycle();
        let idx = cycle
            .custom_action(Some(rsc), "db_start_0", TASK_START, Some(node), true)
            .unwrap();
        assert_eq!(
            describe_action(&cycle, idx).unwrap(),
            "Optional Action 0: (Provisional) db_start_0 on alpha"
        );

        cycle.resource_mut(rsc).unwrap().provisional = false;
        cycle
            .update_action_flags(idx, ActionFlags::OPTIONAL, FlagUpdate::Clear)
            .unwrap();
        assert_eq!(
            describe_action(&cycle, idx).unwrap(),
            "Action 0: db_start_0 on alpha"
        );
    }

    #[test]
    fn non_startable_and_pseudo() {
        let (mut cycle, rsc, node) = cycle();
        cycle.resource_mut(rsc).unwrap().provisional = false;
        let start = cycle
            .custom_action(Some(rsc), "db_start_0", TASK_START, Some(node), false)
            .unwrap();
        cycle
            .update_action_flags(start, ActionFlags::RUNNABLE, FlagUpdate::Clear)
            .unwrap();
        assert_eq!(
            describe_action(&cycle, start).unwrap(),
            "!!Non-Startable!! Action 0: db_start_0 on alpha"
        );

        let pseudo = cycle.pseudo_action(rsc, "running", false, true).unwrap();
        assert_eq!(
            describe_action(&cycle, pseudo).unwrap(),
            "Pseudo Action 1: db_running_0"
        );
    }

    #[test]
    fn shutdown_shows_task_and_node() {
        let (mut cycle, rsc, node) = cycle();
        let stop = cycle
            .custom_action(Some(rsc), "db_stop_0", "stop", Some(node), false)
            .unwrap();
        let shutdown = cycle.shutdown_op(node.details, &AfterNodeActions).unwrap();
        assert_eq!(
            describe_action(&cycle, shutdown).unwrap(),
            "Action 1: do_shutdown on alpha"
        );

        cycle.order_actions(stop, shutdown, OrderKind::Mandatory).unwrap();
        log_action(&cycle, shutdown, true).unwrap();
        log_action(&cycle, stop, false).unwrap();
    }

    #[test]
    fn unknown_action_is_an_error() {
        let (cycle, _, _) = cycle();
        assert!(describe_action(&cycle, ActionIdx(9)).is_err());
    }
}
