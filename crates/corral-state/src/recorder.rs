//! Turns executed operation outcomes into history records.
//!
//! One call writes one record, or two when a non-recurring operation
//! fails: the failure is kept under `last_failure` and `last` is brought
//! up to date as well. Writing the same outcome again overwrites the same
//! records with the same values.

use tracing::{debug, trace};

use corral_core::{
    HistoryConfig, OpStatus, OperationOutcome, TASK_MIGRATE_FROM, TASK_MIGRATE_TO, TASK_MONITOR, TASK_NOTIFY,
    TASK_RELOAD, TASK_START, TIMING_FEATURE_SET, TransitionKey, TransitionMagic, at_least,
    notify_key, op_key,
};

use crate::digest::operation_digest;
use crate::error::{StateError, StateResult};
use crate::types::{HistoryRecord, LAST, LAST_FAILURE, ResourceHistory};

/// Where, and as whom, an outcome is being recorded.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    /// Feature set of the planner writing the record.
    pub feature_set: &'a str,
    /// The rc the operation was expected to return.
    pub expected_rc: i32,
    /// Node the operation ran on.
    pub node: &'a str,
    /// Free-form description of who is recording.
    pub origin: &'a str,
}

impl<'a> RecordContext<'a> {
    /// Feature set and origin from the planner's `[history]` settings.
    pub fn from_config(history: &'a HistoryConfig, expected_rc: i32, node: &'a str) -> Self {
        Self {
            feature_set: &history.feature_set,
            expected_rc,
            node,
            origin: &history.origin,
        }
    }
}

/// Values shared by every record written for one outcome.
struct Normalized {
    task: String,
    operation_key: String,
    op_status: i32,
    rc: i32,
    transition_key: String,
    magic: String,
    exit_reason: Option<String>,
}

/// Record `outcome` into `history` and return the primary record.
pub fn record(
    history: &mut ResourceHistory,
    outcome: &OperationOutcome,
    ctx: RecordContext<'_>,
) -> StateResult<HistoryRecord> {
    let invalid = |reason: &str| StateError::InvalidOutcome {
        rsc: outcome.rsc_id.clone(),
        reason: reason.to_string(),
    };
    if outcome.rsc_id.is_empty() {
        return Err(invalid("empty resource id"));
    }
    if outcome.rsc_id != history.rsc_id {
        return Err(invalid("outcome belongs to a different resource"));
    }

    debug!(
        origin = ctx.origin,
        rsc = %outcome.rsc_id,
        op = %outcome.op_type,
        status = ?outcome.op_status,
        interval_ms = outcome.interval_ms,
        "updating resource history"
    );

    // A reload that worked leaves the resource as a start would; one that
    // did not is only useful as a status observation.
    let task = if outcome.op_type == TASK_RELOAD {
        if outcome.op_status == OpStatus::Done {
            TASK_START
        } else {
            TASK_MONITOR
        }
    } else {
        outcome.op_type.as_str()
    };
    let operation_key = op_key(&outcome.rsc_id, task, outcome.interval_ms);

    let mut op_status = outcome.op_status;
    let mut rc = outcome.rc;
    let mut exit_reason = None;
    let mut secondary = None;

    let primary = if task == TASK_NOTIFY {
        let (Some(n_type), Some(n_op)) = (
            outcome.meta_value("notify_type"),
            outcome.meta_value("notify_operation"),
        ) else {
            return Err(invalid("notify outcome without notify_type/notify_operation"));
        };
        // Notification failures are never resource failures.
        if op_status != OpStatus::Pending {
            op_status = OpStatus::Done;
            rc = 0;
        }
        notify_key(&outcome.rsc_id, n_type, n_op)
    } else if outcome.did_fail(ctx.expected_rc) {
        if outcome.interval_ms == 0 {
            secondary = Some(op_key(&outcome.rsc_id, LAST, 0));
        }
        exit_reason = outcome.exit_reason.clone();
        op_key(&outcome.rsc_id, LAST_FAILURE, 0)
    } else if outcome.interval_ms > 0 {
        operation_key.clone()
    } else {
        op_key(&outcome.rsc_id, LAST, 0)
    };

    let transition_key = match &outcome.transition_key {
        Some(key) => key.clone(),
        None => {
            debug!(
                op = %operation_key,
                call_id = outcome.call_id,
                origin = ctx.origin,
                "generating placeholder transition key"
            );
            TransitionKey::placeholder(outcome.call_id, ctx.expected_rc).to_string()
        }
    };
    let magic = TransitionMagic::new(&transition_key, op_status.code(), rc).to_string();

    let normalized = Normalized {
        task: task.to_string(),
        operation_key,
        op_status: op_status.code(),
        rc,
        transition_key,
        magic,
        exit_reason,
    };

    let written = write_record(history, &primary, outcome, &normalized, ctx);
    if let Some(id) = secondary {
        write_record(history, &id, outcome, &normalized, ctx);
    }
    Ok(written)
}

/// Update (or create) the record `id` and return a copy of it.
fn write_record(
    history: &mut ResourceHistory,
    id: &str,
    outcome: &OperationOutcome,
    n: &Normalized,
    ctx: RecordContext<'_>,
) -> HistoryRecord {
    let record = history
        .records
        .entry(id.to_string())
        .or_insert_with(|| HistoryRecord::new(id));

    record.operation_key = n.operation_key.clone();
    record.operation = n.task.clone();
    record.origin = ctx.origin.to_string();
    record.feature_set = ctx.feature_set.to_string();
    record.transition_key = n.transition_key.clone();
    record.transition_magic = n.magic.clone();
    record.exit_reason = n.exit_reason.clone().unwrap_or_default();
    record.on_node = ctx.node.to_string();
    record.call_id = outcome.call_id;
    record.rc = n.rc;
    record.op_status = n.op_status;
    record.interval_ms = outcome.interval_ms;

    // Nothing from an earlier outcome survives under the same key.
    record.last_run = None;
    record.last_rc_change = None;
    record.exec_time = None;
    record.queue_time = None;
    record.migrate_source = None;
    record.migrate_target = None;
    record.op_digest = None;

    if at_least(ctx.feature_set, TIMING_FEATURE_SET) && outcome.has_timing() {
        trace!(
            op = %n.operation_key,
            last = outcome.t_run,
            change = outcome.t_rcchange,
            exec = outcome.exec_time,
            queue = outcome.queue_time,
            "timing data"
        );
        if outcome.interval_ms == 0 {
            record.last_run = Some(outcome.t_run);
            record.last_rc_change = Some(outcome.t_run);
        } else if outcome.t_rcchange != 0 {
            record.last_rc_change = Some(outcome.t_rcchange);
        } else {
            record.last_rc_change = Some(outcome.t_run);
        }
        record.exec_time = Some(outcome.exec_time);
        record.queue_time = Some(outcome.queue_time);
    }

    if outcome.op_type == TASK_MIGRATE_TO || outcome.op_type == TASK_MIGRATE_FROM {
        record.migrate_source = outcome.meta_value("migrate_source").map(str::to_string);
        record.migrate_target = outcome.meta_value("migrate_target").map(str::to_string);
    }

    if !outcome.params.is_empty() {
        record.op_digest = Some(operation_digest(&outcome.params, ctx.feature_set));
    }

    record.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::{CURRENT_FEATURE_SET, RC_OK};

    fn ctx() -> RecordContext<'static> {
        RecordContext {
            feature_set: CURRENT_FEATURE_SET,
            expected_rc: RC_OK,
            node: "alpha",
            origin: "test",
        }
    }

    fn test_outcome(task: &str, interval_ms: u32, call_id: i32) -> OperationOutcome {
        let mut outcome = OperationOutcome::new("db", task, interval_ms, call_id);
        outcome.params.insert("ip".to_string(), "10.0.0.5".to_string());
        outcome
    }

    #[test]
    fn successful_start_writes_only_last() {
        let mut history = ResourceHistory::new("alpha", "db");
        let record = record(&mut history, &test_outcome("start", 0, 4), ctx()).unwrap();

        assert_eq!(record.id, "db_last_0");
        assert_eq!(record.operation_key, "db_start_0");
        assert_eq!(history.len(), 1);
        assert!(history.last_failure().is_none());

        let key = TransitionKey::placeholder(4, RC_OK).to_string();
        assert_eq!(record.transition_key, key);
        assert_eq!(record.transition_magic, format!("0:0;{key}"));
        assert!(record.op_digest.is_some());
    }

    #[test]
    fn failed_one_shot_writes_failure_and_last() {
        let mut history = ResourceHistory::new("alpha", "db");
        let mut outcome = test_outcome("monitor", 0, 9);
        outcome.rc = 1;
        outcome.exit_reason = Some("not configured".to_string());

        let primary = record(&mut history, &outcome, ctx()).unwrap();
        assert_eq!(primary.id, "db_last_failure_0");
        assert_eq!(primary.exit_reason, "not configured");

        let failure = history.last_failure().unwrap();
        let last = history.last().unwrap();
        assert_eq!(failure.call_id, 9);
        assert_eq!(last.call_id, 9);
        assert_eq!(last.rc, 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn failed_recurring_writes_only_failure() {
        let mut history = ResourceHistory::new("alpha", "db");
        let mut outcome = test_outcome("monitor", 10000, 12);
        outcome.rc = 7;

        record(&mut history, &outcome, ctx()).unwrap();
        assert!(history.last_failure().is_some());
        assert!(history.last().is_none());
        assert!(history.recurring("monitor", 10000).is_none());
    }

    #[test]
    fn recurring_success_keeps_its_own_record() {
        let mut history = ResourceHistory::new("alpha", "db");
        let mut outcome = test_outcome("monitor", 10000, 12);
        outcome.t_run = 100;
        outcome.t_rcchange = 80;
        outcome.exec_time = 5;

        let record = record(&mut history, &outcome, ctx()).unwrap();
        assert_eq!(record.id, "db_monitor_10000");
        assert_eq!(record.last_run, None);
        assert_eq!(record.last_rc_change, Some(80));
        assert_eq!(record.exec_time, Some(5));
        assert_eq!(record.queue_time, Some(0));
        assert!(history.last().is_none());
    }

    #[test]
    fn one_shot_timing_uses_run_time_for_both() {
        let mut history = ResourceHistory::new("alpha", "db");
        let mut outcome = test_outcome("start", 0, 3);
        outcome.t_run = 100;
        outcome.t_rcchange = 90;

        let record = record(&mut history, &outcome, ctx()).unwrap();
        assert_eq!(record.last_run, Some(100));
        assert_eq!(record.last_rc_change, Some(100));

        let old = RecordContext {
            feature_set: "2.0",
            ..ctx()
        };
        let mut fresh = ResourceHistory::new("alpha", "db");
        let record = super::record(&mut fresh, &outcome, old).unwrap();
        assert_eq!(record.last_run, None);
        assert_eq!(record.exec_time, None);
    }

    #[test]
    fn replaying_an_outcome_is_idempotent() {
        let mut history = ResourceHistory::new("alpha", "db");
        let outcome = test_outcome("start", 0, 4);

        let first = record(&mut history, &outcome, ctx()).unwrap();
        let snapshot = history.clone();
        let second = record(&mut history, &outcome, ctx()).unwrap();

        assert_eq!(first, second);
        assert_eq!(history, snapshot);
        assert!(history.already_recorded(&first.transition_magic));
    }

    #[test]
    fn reload_is_recorded_as_start_or_monitor() {
        let mut history = ResourceHistory::new("alpha", "db");
        let ok = record(&mut history, &test_outcome("reload", 0, 1), ctx()).unwrap();
        assert_eq!(ok.operation, "start");
        assert_eq!(ok.operation_key, "db_start_0");

        let mut failed = test_outcome("reload", 0, 2);
        failed.op_status = OpStatus::Error;
        let rec = record(&mut history, &failed, ctx()).unwrap();
        assert_eq!(rec.operation, "monitor");
        assert_eq!(rec.id, "db_last_failure_0");
    }

    #[test]
    fn notify_failures_are_normalized() {
        let mut history = ResourceHistory::new("alpha", "db");
        let mut outcome = test_outcome("notify", 0, 6);
        outcome.rc = 1;
        outcome
            .params
            .insert("CRM_meta_notify_type".to_string(), "pre".to_string());
        outcome
            .params
            .insert("CRM_meta_notify_operation".to_string(), "start".to_string());

        let record = record(&mut history, &outcome, ctx()).unwrap();
        assert_eq!(record.id, "db_pre_notify_start_0");
        assert_eq!(record.rc, 0);
        assert_eq!(record.op_status, 0);
        assert!(history.last_failure().is_none());
    }

    #[test]
    fn notify_without_meta_is_rejected() {
        let mut history = ResourceHistory::new("alpha", "db");
        let err = record(&mut history, &test_outcome("notify", 0, 6), ctx()).unwrap_err();
        assert!(matches!(err, StateError::InvalidOutcome { .. }));
        assert!(history.is_empty());
    }

    #[test]
    fn mismatched_resource_is_rejected() {
        let mut history = ResourceHistory::new("alpha", "web");
        assert!(record(&mut history, &test_outcome("start", 0, 1), ctx()).is_err());
    }

    #[test]
    fn supplied_transition_key_is_kept() {
        let mut history = ResourceHistory::new("alpha", "db");
        let mut outcome = test_outcome("stop", 0, 8);
        outcome.transition_key = Some("3:17:0:5b2a".to_string());

        let record = record(&mut history, &outcome, ctx()).unwrap();
        assert_eq!(record.transition_magic, "0:0;3:17:0:5b2a");
        assert_eq!(TransitionMagic::parse(&record.transition_magic).unwrap().key, "3:17:0:5b2a");
    }

    #[test]
    fn migration_records_source_and_target() {
        let mut history = ResourceHistory::new("alpha", "db");
        let mut outcome = test_outcome(TASK_MIGRATE_TO, 0, 2);
        outcome.params.insert("CRM_meta_migrate_source".to_string(), "alpha".to_string());
        outcome.params.insert("CRM_meta_migrate_target".to_string(), "beta".to_string());

        let record = record(&mut history, &outcome, ctx()).unwrap();
        assert_eq!(record.migrate_source.as_deref(), Some("alpha"));
        assert_eq!(record.migrate_target.as_deref(), Some("beta"));
    }

    #[test]
    fn later_outcome_replaces_every_field_of_the_record() {
        let mut history = ResourceHistory::new("alpha", "db");
        let mut migrate = test_outcome(TASK_MIGRATE_TO, 0, 2);
        migrate.params.insert("CRM_meta_migrate_source".to_string(), "alpha".to_string());
        migrate.params.insert("CRM_meta_migrate_target".to_string(), "beta".to_string());
        migrate.t_run = 100;
        record(&mut history, &migrate, ctx()).unwrap();

        let start = OperationOutcome::new("db", TASK_START, 0, 3);
        let record = record(&mut history, &start, ctx()).unwrap();
        assert_eq!(record.id, "db_last_0");
        assert_eq!(record.call_id, 3);
        assert_eq!(record.migrate_source, None);
        assert_eq!(record.migrate_target, None);
        assert_eq!(record.op_digest, None);
        assert_eq!(record.last_run, None);
        assert_eq!(history.last(), Some(&record));
    }
}
