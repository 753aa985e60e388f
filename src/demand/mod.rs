/*! Demand-bound functions of mixed-criticality tasks

This module provides the trait [DemandBound], which models the notion
of a *demand-bound function* (DBF): the total execution that must
complete within any window of a given length. The per-task shapes
([Basic], [RateScaled], [Residual]) are combined with [Aggregate] into
the demand of one of the four schedulability [Condition]s. */

use auto_impl::auto_impl;

use crate::time::{Duration, Service};

/// The general interface for processor demand with hard deadlines.
/// This can represent the demand of a single task, or the cumulative
/// demand of multiple tasks.
#[auto_impl(&, Box, Rc)]
pub trait DemandBound {
    /// Bound the total amount of service that must be completed within
    /// any window of length `delta`.
    fn demand(&self, delta: Duration) -> Service;

    /// Yield a non-decreasing iterator over the window lengths at which
    /// the demand may change, i.e., every `L` such that
    /// `demand(L) != demand(L - 1)` occurs in the sequence. The sequence
    /// is unbounded for periodic sources of demand.
    fn steps_iter<'a>(&'a self) -> Box<dyn Iterator<Item = Duration> + 'a>;

    /// The first window length at which the demand may become non-zero.
    fn first_step(&self) -> Option<Duration> {
        self.steps_iter().next()
    }
}

/// Number of jobs of a periodic source with the given relative
/// `deadline` that both arrive and are due within a window of
/// length `delta`.
pub(crate) fn jobs(delta: Duration, deadline: Duration, period: Duration) -> u64 {
    if delta < deadline {
        0
    } else {
        (delta - deadline) / period + 1
    }
}

mod aggregate;
mod basic;
mod condition;
mod rate_scaled;
mod residual;

pub use aggregate::Aggregate;
pub use basic::Basic;
pub use condition::Condition;
pub use rate_scaled::RateScaled;
pub use residual::Residual;
