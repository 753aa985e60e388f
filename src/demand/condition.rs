use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::{Aggregate, Basic, DemandBound, RateScaled, Residual};
use crate::supply::{Periodic, Platform};
use crate::task::{Task, TaskSet};

/// One of the four demand/supply conditions a task set must satisfy
/// for a given assignment of virtual deadlines.
///
/// - `A`: LO mode on the nominal supply, HI tasks due at their virtual deadlines.
/// - `B`: mode-switch carry-over on the nominal supply.
/// - `C`: degraded LO tasks and HI tasks in LO mode on the critical supply.
/// - `D`: HI-mode residual demand on the critical supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub enum Condition {
    A,
    B,
    C,
    D,
}

fn basic(task: &Task, deadline: u64) -> Box<dyn DemandBound> {
    Box::new(Basic {
        period: task.period(),
        deadline,
        cost: task.wcet_lo(),
    })
}

fn rate_scaled(task: &Task) -> Box<dyn DemandBound> {
    Box::new(RateScaled {
        period: task.period(),
        deadline: task.deadline(),
        cost: task.wcet_lo(),
        rate: task.rate(),
    })
}

fn residual(task: &Task) -> Box<dyn DemandBound> {
    Box::new(Residual {
        period: task.period(),
        deadline: task.deadline(),
        virtual_deadline: task.effective_virtual_deadline(),
        wcet_lo: task.wcet_lo(),
        wcet_hi: task.wcet_hi(),
    })
}

impl Condition {
    /// All conditions, in the order in which they are evaluated.
    pub fn all() -> [Condition; 4] {
        [Condition::A, Condition::B, Condition::C, Condition::D]
    }

    /// Build the total demand of `tasks` under this condition, using
    /// the virtual deadlines currently assigned.
    pub fn demand(self, tasks: &TaskSet) -> Aggregate<Box<dyn DemandBound>> {
        let lo = tasks.lo_tasks();
        let hi = tasks.hi_tasks();
        match self {
            Condition::A => lo
                .map(|t| basic(t, t.deadline()))
                .chain(hi.map(|t| basic(t, t.effective_virtual_deadline())))
                .collect(),
            Condition::B => lo.map(rate_scaled).chain(hi.map(residual)).collect(),
            Condition::C => lo
                .map(rate_scaled)
                .chain(hi.map(|t| basic(t, t.effective_virtual_deadline())))
                .collect(),
            Condition::D => hi.map(residual).collect(),
        }
    }

    /// The supply this condition is checked against.
    pub fn supply(self, platform: &Platform) -> Periodic {
        match self {
            Condition::A | Condition::B => platform.nominal(),
            Condition::C | Condition::D => platform.critical(),
        }
    }
}
