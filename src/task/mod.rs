/*! The mixed-criticality task model.

This module provides the [Task] record, which describes a periodic
task with two execution-time budgets (one per criticality mode), and
the [TaskSet] collection, which keeps track of the aggregate
utilizations needed by the analysis. */

use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{Duration, Service, Share, Time};

mod set;

pub use set::{TaskId, TaskSet};

/// Error type returned when a task cannot be constructed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    /// The task has a non-zero release offset.
    #[error("offsets not supported (task released at offset {0})")]
    UnsupportedOffset(Time),
    /// The criticality label is neither `LO` nor `HI`.
    #[error("unrecognized criticality label {0:?}")]
    InconsistentCriticalityLabel(String),
    #[error("task period must be non-zero")]
    ZeroPeriod,
    #[error("HI-mode WCET {hi} is less than LO-mode WCET {lo}")]
    WcetOrder { lo: Service, hi: Service },
    #[error("rate {0} is outside of (0, 1]")]
    RateOutOfRange(Share),
}

/// The two criticality levels supported by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Criticality {
    /// Low assurance: the task is degraded after a mode switch.
    #[display(fmt = "LO")]
    Lo,
    /// High assurance: the task may overrun its LO-mode budget up to
    /// its HI-mode budget.
    #[display(fmt = "HI")]
    Hi,
}

impl FromStr for Criticality {
    type Err = TaskError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_uppercase().as_str() {
            "LO" => Ok(Criticality::Lo),
            "HI" => Ok(Criticality::Hi),
            _ => Err(TaskError::InconsistentCriticalityLabel(label.to_string())),
        }
    }
}

/// A periodic mixed-criticality task with an arbitrary relative deadline.
///
/// All parameters are fixed at construction. The only exception is the
/// *virtual deadline* of HI tasks, which is scratch state of the
/// deadline-scaling search: it is overwritten in every bisection step
/// and carries no meaning once the search has returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    wcet_lo: Service,
    wcet_hi: Service,
    period: Duration,
    deadline: Duration,
    criticality: Criticality,
    rate: Share,
    utilization_lo: Share,
    utilization_hi: Share,
    virtual_deadline: Option<Duration>,
}

impl Task {
    /// Construct a new task with rate 1, i.e., LO tasks keep their full
    /// LO-mode budget after a mode switch.
    pub fn new(
        wcet_lo: Service,
        wcet_hi: Service,
        period: Duration,
        deadline: Duration,
        criticality: Criticality,
    ) -> Result<Self, TaskError> {
        if period == 0 {
            return Err(TaskError::ZeroPeriod);
        }
        if wcet_hi < wcet_lo {
            return Err(TaskError::WcetOrder {
                lo: wcet_lo,
                hi: wcet_hi,
            });
        }
        Ok(Task {
            wcet_lo,
            wcet_hi,
            period,
            deadline,
            criticality,
            rate: 1.0,
            utilization_lo: wcet_lo as Share / period as Share,
            utilization_hi: wcet_hi as Share / period as Share,
            virtual_deadline: None,
        })
    }

    /// Returns the task with the fraction `rate` of its LO-mode budget
    /// guaranteed after a switch to HI mode.
    pub fn with_rate(self, rate: Share) -> Result<Self, TaskError> {
        // written this way to reject NaN as well
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(TaskError::RateOutOfRange(rate));
        }
        Ok(Task { rate, ..self })
    }

    pub fn wcet_lo(&self) -> Service {
        self.wcet_lo
    }

    pub fn wcet_hi(&self) -> Service {
        self.wcet_hi
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn criticality(&self) -> Criticality {
        self.criticality
    }

    pub fn rate(&self) -> Share {
        self.rate
    }

    pub fn is_hi(&self) -> bool {
        self.criticality == Criticality::Hi
    }

    pub fn utilization_lo(&self) -> Share {
        self.utilization_lo
    }

    pub fn utilization_hi(&self) -> Share {
        self.utilization_hi
    }

    /// The LO-mode utilization that survives a mode switch.
    pub fn rate_utilization(&self) -> Share {
        self.rate * self.utilization_lo
    }

    /// The virtual deadline assigned by the current bisection step, if any.
    pub fn virtual_deadline(&self) -> Option<Duration> {
        self.virtual_deadline
    }

    /// The virtual deadline, falling back to the nominal deadline
    /// (scaling factor 1) if none has been assigned.
    pub fn effective_virtual_deadline(&self) -> Duration {
        self.virtual_deadline.unwrap_or(self.deadline)
    }

    /// Scale the nominal deadline by `x`, rounding down to whole ticks.
    /// LO tasks have no virtual deadline; the call is a no-op for them.
    pub(crate) fn scale_deadline(&mut self, x: Share) {
        if self.is_hi() {
            let scaled = (x * self.deadline as Share).floor().max(0.0) as Duration;
            self.virtual_deadline = Some(scaled.min(self.deadline));
        }
    }
}

fn default_rate() -> Share {
    1.0
}

/// The serialized form of a task, as found in input files.
///
/// Unlike [Task], this record may describe tasks the analysis cannot
/// handle; the conversion via [TryFrom] rejects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub wcet_lo: Service,
    pub wcet_hi: Service,
    pub period: Duration,
    pub deadline: Duration,
    /// `"LO"` or `"HI"`.
    pub criticality: String,
    #[serde(default = "default_rate")]
    pub rate: Share,
    #[serde(default)]
    pub offset: Time,
}

impl TryFrom<TaskSpec> for Task {
    type Error = TaskError;

    fn try_from(spec: TaskSpec) -> Result<Self, Self::Error> {
        if spec.offset != 0 {
            return Err(TaskError::UnsupportedOffset(spec.offset));
        }
        let criticality = spec.criticality.parse()?;
        Task::new(
            spec.wcet_lo,
            spec.wcet_hi,
            spec.period,
            spec.deadline,
            criticality,
        )?
        .with_rate(spec.rate)
    }
}
