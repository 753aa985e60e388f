/*! Quick processor-demand analysis (QPA)

QPA (Zhang & Burns) decides whether a demand-bound function stays
below a supply-bound function for every window shorter than a given
horizon, without visiting every window length. Starting from the last
step of the demand below the horizon, it walks backwards: wherever the
supply exceeds the demand, it jumps straight to the earliest window in
which the supply covers the current demand; wherever the two are equal,
it falls back to the previous step of the demand. */

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::demand::DemandBound;
use crate::supply::SupplyBound;
use crate::time::{Duration, Instant, Service};

/// Internal failures of the backwards search. Neither occurs for
/// well-formed demand and supply bounds.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum QpaError {
    /// The next window examined was not shorter than the current one.
    #[error("QPA made no progress at t = {at}")]
    Stalled { at: Instant },
    /// The search moved more often than allowed.
    #[error("QPA did not terminate within {limit} iterations")]
    IterationLimit { limit: usize },
}

/// One window examined by the search, recorded for visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TracePoint {
    pub t: Duration,
    pub demand: Service,
    pub supply: Service,
}

/// Check that `demand(L) <= supply(L)` for every `L < horizon`.
///
/// If `trace` is given, every window examined is appended to it. The
/// search gives up with [QpaError::IterationLimit] after
/// `iteration_limit` moves.
pub fn check<D, S>(
    demand: &D,
    supply: &S,
    horizon: Duration,
    iteration_limit: usize,
    mut trace: Option<&mut Vec<TracePoint>>,
) -> Result<bool, QpaError>
where
    D: DemandBound + ?Sized,
    S: SupplyBound + ?Sized,
{
    let mut candidates: Vec<Duration> = demand
        .steps_iter()
        .take_while(|step| *step < horizon)
        .collect();
    candidates.dedup();

    // below the first step, the supply trivially covers the demand
    let floor = supply.provided_service(candidates.first().copied().unwrap_or(0));
    let mut t = candidates.last().copied().unwrap_or(0);
    let mut moves = 0;

    loop {
        let dbf = demand.demand(t);
        let sbf = supply.provided_service(t);
        trace!(t, demand = dbf, supply = sbf, "QPA step");
        if let Some(points) = trace.as_deref_mut() {
            points.push(TracePoint {
                t,
                demand: dbf,
                supply: sbf,
            });
        }

        if sbf < dbf || dbf <= floor {
            return Ok(dbf <= floor);
        }

        moves += 1;
        if moves > iteration_limit {
            return Err(QpaError::IterationLimit {
                limit: iteration_limit,
            });
        }

        let next = if sbf > dbf {
            supply.service_time(dbf)
        } else {
            // the largest step strictly before t
            match candidates.partition_point(|c| *c < t).checked_sub(1) {
                Some(i) => candidates[i],
                None => return Ok(dbf <= floor),
            }
        };
        if next >= t {
            return Err(QpaError::Stalled { at: t });
        }
        t = next;
    }
}

/// Naive reference: compare demand and supply at every window length.
#[cfg(test)]
pub(crate) fn brute_force<D, S>(demand: &D, supply: &S, horizon: Duration) -> bool
where
    D: DemandBound + ?Sized,
    S: SupplyBound + ?Sized,
{
    (0..horizon).all(|delta| demand.demand(delta) <= supply.provided_service(delta))
}
