/*! Analysis horizons of the four conditions

For each [Condition], demand can exceed supply for the first time only
within windows shorter than a bound `l_max`, which follows from the
long-run slopes of the demand and the supply. The bound exists only if
the supply's bandwidth strictly exceeds the utilization the condition
charges against it. */

use serde::Serialize;
use thiserror::Error;

use crate::demand::Condition;
use crate::supply::{Periodic, Platform, SupplyBound};
use crate::task::{Task, TaskSet};
use crate::time::{Duration, Share, BANDWIDTH_TOLERANCE};

/// Error type returned when a condition's supply cannot keep up with
/// its demand in the long run.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("insufficient bandwidth for condition {condition}")]
pub struct InsufficientBandwidth {
    pub condition: Condition,
}

/// The horizon of each condition, for one assignment of virtual deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Horizons {
    pub a: Duration,
    pub b: Duration,
    pub c: Duration,
    pub d: Duration,
}

impl Horizons {
    pub fn get(&self, condition: Condition) -> Duration {
        match condition {
            Condition::A => self.a,
            Condition::B => self.b,
            Condition::C => self.c,
            Condition::D => self.d,
        }
    }
}

fn max_over<'a>(tasks: impl Iterator<Item = &'a Task>, f: impl Fn(&Task) -> Share) -> Share {
    tasks.map(f).fold(0.0, Share::max)
}

/// Slack terms `max (T - deadline)` of the task subsets, never below
/// zero. A negative slack does not bound the demand of windows shorter
/// than the deadline.
struct Slack {
    lo: Share,
    hi_virtual: Share,
    lo_rate: Share,
    hi_residual: Share,
}

impl Slack {
    fn of(tasks: &TaskSet) -> Self {
        let signed = |a: Duration, b: Duration| a as Share - b as Share;
        Slack {
            lo: max_over(tasks.lo_tasks(), |t| signed(t.period(), t.deadline())),
            hi_virtual: max_over(tasks.hi_tasks(), |t| {
                signed(t.period(), t.effective_virtual_deadline())
            }),
            lo_rate: max_over(tasks.lo_tasks(), |t| {
                signed(t.period(), t.deadline()) + t.period() as Share / t.rate()
            }),
            hi_residual: max_over(tasks.hi_tasks(), |t| {
                signed(t.period(), t.deadline() - t.effective_virtual_deadline())
            }),
        }
    }
}

/// The blackout term `2w(π - θ)` of a periodic supply.
fn blackout_term(supply: &Periodic) -> Share {
    2.0 * supply.bandwidth() * supply.blackout() as Share
}

fn bound(
    condition: Condition,
    numerator: Share,
    denominator: Share,
) -> Result<Duration, InsufficientBandwidth> {
    if denominator <= BANDWIDTH_TOLERANCE {
        return Err(InsufficientBandwidth { condition });
    }
    Ok((numerator / denominator).ceil().max(0.0) as Duration)
}

/// Compute the horizon of `condition`, using the virtual deadlines
/// currently assigned to the HI tasks.
pub fn horizon(
    condition: Condition,
    tasks: &TaskSet,
    platform: &Platform,
) -> Result<Duration, InsufficientBandwidth> {
    let c1 = tasks.utilization_lo_lo();
    let c2 = tasks.utilization_lo_hi();
    let c3 = tasks.rate_utilization_lo();
    let c4 = tasks.utilization_hi_hi();
    let m = Slack::of(tasks);
    let supply = condition.supply(platform);
    let w = supply.bandwidth();
    let blackout = blackout_term(&supply);

    let (numerator, denominator) = match condition {
        Condition::A => (c1 * m.lo + c2 * m.hi_virtual + blackout, w - c1 - c2),
        Condition::B => (c3 * m.lo_rate + c4 * m.hi_residual + blackout, w - c3 - c4),
        Condition::C => (c2 * m.hi_virtual + c3 * m.lo_rate + blackout, w - c2 - c3),
        Condition::D => (c4 * m.hi_residual + blackout, w - c4),
    };
    bound(condition, numerator, denominator)
}

/// Compute the horizons of all four conditions, failing on the first
/// condition (in evaluation order) without sufficient bandwidth.
pub fn horizons(tasks: &TaskSet, platform: &Platform) -> Result<Horizons, InsufficientBandwidth> {
    Ok(Horizons {
        a: horizon(Condition::A, tasks, platform)?,
        b: horizon(Condition::B, tasks, platform)?,
        c: horizon(Condition::C, tasks, platform)?,
        d: horizon(Condition::D, tasks, platform)?,
    })
}
