//! Deterministic ordering of candidate nodes for one resource.
//!
//! Criteria, in order:
//! 1. effective weight (ineligible nodes count as `-INFINITY`), higher first
//! 2. `minimal` strategy: skip straight to the name tie-break
//! 3. `balanced` strategy: more summed remaining capacity first
//! 4. fewer assigned resources first
//! 5. the resource's current node first
//! 6. node name, ascending
//!
//! The name tie-break makes this a total order, so sorting the same
//! candidates always yields the same plan.

use std::cmp::Ordering;

use tracing::trace;

use corral_core::{INFINITY, PlacementStrategy, Score};

use crate::eligibility::is_eligible;
use crate::ledger::compare_capacity;
use crate::node::{Node, NodeDetails, NodeIdx, NodePool};

/// Everything the comparator needs besides the two nodes.
#[derive(Debug, Clone, Copy)]
pub struct RankContext<'a> {
    pub pool: &'a NodePool,
    /// Node the resource is currently assigned to, if any.
    pub active: Option<NodeIdx>,
    pub strategy: PlacementStrategy,
}

fn effective_weight(node: &Node, details: Option<&NodeDetails>) -> Score {
    if is_eligible(details) {
        node.weight
    } else {
        -INFINITY
    }
}

/// `Less` when `a` is the better host.
pub fn compare_nodes(a: &Node, b: &Node, ctx: &RankContext<'_>) -> Ordering {
    let (Some(da), Some(db)) = (ctx.pool.get(a.details), ctx.pool.get(b.details)) else {
        // Stale handles sort last, among themselves by handle.
        return match (ctx.pool.get(a.details), ctx.pool.get(b.details)) {
            (None, None) => a.details.cmp(&b.details),
            (None, _) => Ordering::Greater,
            _ => Ordering::Less,
        };
    };

    let (wa, wb) = (effective_weight(a, Some(da)), effective_weight(b, Some(db)));
    if wa != wb {
        trace!(a = %da.uname, wa, b = %db.uname, wb, "ranked by weight");
        return wb.cmp(&wa);
    }

    if ctx.strategy != PlacementStrategy::Minimal {
        if ctx.strategy == PlacementStrategy::Balanced {
            let result = compare_capacity(da, db);
            if result != 0 {
                trace!(a = %da.uname, b = %db.uname, result, "ranked by capacity");
                return result.cmp(&0);
            }
        }

        if da.num_resources != db.num_resources {
            trace!(
                a = %da.uname, a_resources = da.num_resources,
                b = %db.uname, b_resources = db.num_resources,
                "ranked by resource count"
            );
            return da.num_resources.cmp(&db.num_resources);
        }

        if let Some(active) = ctx.active {
            if a.details == active && b.details != active {
                trace!(a = %da.uname, b = %db.uname, "ranked by current assignment");
                return Ordering::Less;
            }
            if b.details == active && a.details != active {
                trace!(a = %da.uname, b = %db.uname, "ranked by current assignment");
                return Ordering::Greater;
            }
        }
    }

    trace!(a = %da.uname, b = %db.uname, "ranked by name");
    da.uname.cmp(&db.uname)
}

/// Sort candidates best-first for a resource currently on `active`.
pub fn sort_nodes_by_weight(
    nodes: &mut [Node],
    active: Option<NodeIdx>,
    pool: &NodePool,
    strategy: PlacementStrategy,
) {
    let ctx = RankContext {
        pool,
        active,
        strategy,
    };
    nodes.sort_by(|a, b| compare_nodes(a, b, &ctx));
}
