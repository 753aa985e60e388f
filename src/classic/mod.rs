/*! Classical single-criticality EDF tests

These tests ignore criticality levels altogether: every task is
charged its LO-mode WCET at its nominal deadline. They decide EDF
schedulability exactly, with QPA, on a dedicated processor or on a
single periodic resource, and serve as a baseline for the
mixed-criticality analysis. */

use thiserror::Error;
use tracing::debug;

use crate::demand::{Aggregate, Basic};
use crate::fixed_point::{self, SearchFailure, SearchResult};
use crate::qpa::{self, QpaError};
use crate::supply::{Dedicated, Periodic, SupplyBound};
use crate::task::TaskSet;
use crate::time::{divide_with_ceil, Duration, Share, BANDWIDTH_TOLERANCE};

const QPA_ITERATION_LIMIT: usize = 1_000_000;

/// Error type returned when a classical test cannot reach a verdict.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ClassicError {
    #[error("busy window: {0}")]
    BusyWindow(#[from] SearchFailure),
    #[error(transparent)]
    Qpa(#[from] QpaError),
}

fn utilization(tasks: &TaskSet) -> Share {
    tasks.tasks().map(|t| t.utilization_lo()).sum()
}

fn demand(tasks: &TaskSet) -> Aggregate<Basic> {
    tasks
        .tasks()
        .map(|t| Basic {
            period: t.period(),
            deadline: t.deadline(),
            cost: t.wcet_lo(),
        })
        .collect()
}

/// The bound `L_a` on the first deadline miss (equation (4) of Zhang &
/// Burns), or `None` if the utilization is not below one.
pub fn la_bound(tasks: &TaskSet) -> Option<Share> {
    let u = utilization(tasks);
    if u >= 1.0 {
        return None;
    }
    let max_deadline = tasks.tasks().map(|t| t.deadline()).max().unwrap_or(0);
    let weighted: Share = tasks
        .tasks()
        .map(|t| (t.period() as Share - t.deadline() as Share) * t.utilization_lo())
        .sum();
    Some((max_deadline as Share).max(weighted / (1.0 - u)))
}

/// The length of the synchronous busy period on the given supply.
pub fn busy_window<S>(tasks: &TaskSet, supply: &S, limit: Duration) -> SearchResult
where
    S: SupplyBound + ?Sized,
{
    fixed_point::search(supply, limit, |delta| {
        tasks
            .tasks()
            .map(|t| divide_with_ceil(delta, t.period()) * t.wcet_lo())
            .sum()
    })
}

/// Exact EDF test on a dedicated uniprocessor.
///
/// The busy-window search gives up beyond `limit`.
pub fn dedicated_uniproc(tasks: &TaskSet, limit: Duration) -> Result<bool, ClassicError> {
    let u = utilization(tasks);
    if u > 1.0 {
        return Ok(false);
    }
    let lb = busy_window(tasks, &Dedicated, limit)?;
    let horizon = match la_bound(tasks) {
        Some(la) => lb.min(la.ceil() as Duration),
        None => lb,
    };
    debug!(utilization = u, horizon, "dedicated EDF test");
    Ok(qpa::check(
        &demand(tasks),
        &Dedicated,
        horizon,
        QPA_ITERATION_LIMIT,
        None,
    )?)
}

/// Exact EDF test on a single periodic resource.
pub fn periodic_resource(tasks: &TaskSet, supply: &Periodic) -> Result<bool, ClassicError> {
    let u = utilization(tasks);
    let w = supply.bandwidth();
    if w - u <= BANDWIDTH_TOLERANCE {
        return Ok(false);
    }
    let slack: Share = tasks
        .tasks()
        .map(|t| t.utilization_lo() * t.period().saturating_sub(t.deadline()) as Share)
        .sum();
    let blackout = 2.0 * w * supply.blackout() as Share;
    let horizon = ((slack + blackout) / (w - u)).ceil() as Duration;
    debug!(utilization = u, horizon, "periodic-resource EDF test");
    Ok(qpa::check(
        &demand(tasks),
        supply,
        horizon,
        QPA_ITERATION_LIMIT,
        None,
    )?)
}
