use crate::supply::SupplyBound;
use crate::time::{Duration, Service};

use thiserror::Error;

/// Error type returned when a fixed point search fails.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq, PartialOrd)]
pub enum SearchFailure {
    /// No fixed point found below the given divergence threshold.
    #[error("no fixed point less than {limit} found")]
    DivergenceLimitExceeded { limit: Duration },
}

pub type SearchResult = Result<Duration, SearchFailure>;

/// Iterative search for the least positive fixed point of
/// `L = service_time(workload(L))` up to a given `divergence_limit`,
/// assuming a given processor supply and a generic workload bound.
///
/// Zero workload is trivially served in an empty window.
pub fn search<SBF, RHS>(
    supply: &SBF,
    divergence_limit: Duration,
    workload_bound: RHS,
) -> SearchResult
where
    SBF: SupplyBound + ?Sized,
    RHS: Fn(Duration) -> Service,
{
    let mut assumed_length = 1;
    while assumed_length <= divergence_limit {
        let demand = workload_bound(assumed_length);
        let length_bound = supply.service_time(demand);
        if length_bound <= assumed_length {
            // we have converged
            return Ok(length_bound);
        }
        assumed_length = length_bound;
    }
    // if we get here, we failed to converge => no solution
    Err(SearchFailure::DivergenceLimitExceeded {
        limit: divergence_limit,
    })
}

/// Very slow, naive search for the same fixed point. Do not use ---
/// use [search] instead.
#[cfg(test)]
pub(crate) fn brute_force_search<SBF, RHS>(
    supply: &SBF,
    divergence_limit: Duration,
    workload_bound: RHS,
) -> SearchResult
where
    SBF: SupplyBound + ?Sized,
    RHS: Fn(Duration) -> Service,
{
    for l in 1..=divergence_limit {
        let rhs = workload_bound(l);
        // corner case: zero demand is trivially satisfied immediately
        if rhs == 0 {
            return Ok(0);
        } else if supply.provided_service(l) >= rhs {
            return Ok(l);
        }
    }
    Err(SearchFailure::DivergenceLimitExceeded {
        limit: divergence_limit,
    })
}
