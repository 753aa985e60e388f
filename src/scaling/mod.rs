/*! Deadline-scaling search

HI tasks are analyzed in LO mode against *virtual deadlines* obtained by
scaling their nominal deadlines with a common factor `x`. Small factors
favor the conditions that look at HI tasks before a mode switch, large
factors favor those that look after it. This module searches for a
factor under which all four conditions hold, by bisection over `(0, 1]`.
*/

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Options;
use crate::demand::Condition;
use crate::horizon::{self, Horizons, InsufficientBandwidth};
use crate::qpa::{self, QpaError, TracePoint};
use crate::supply::Platform;
use crate::task::TaskSet;
use crate::time::Share;

mod table;

pub use table::{DecisionTable, Transition, Verdicts};

/// The result of the search. Negative results are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Outcome {
    /// All conditions hold with virtual deadlines scaled by this factor.
    Success(Share),
    /// Some condition (or, for `None`, the task set as a whole) needs
    /// more bandwidth than the platform offers.
    InfeasibleBandwidth { condition: Option<Condition> },
    /// The LO tasks' rates make the conditions irreconcilable.
    RateUnsuitable,
    /// The bisection step fell below the requested precision.
    PrecisionExhausted,
    /// The decision table has no rule for these verdicts.
    UndeterminedPattern(Verdicts),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn scaling_factor(&self) -> Option<Share> {
        match self {
            Outcome::Success(x) => Some(*x),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(x) => write!(f, "schedulable with scaling factor {}", x),
            Outcome::InfeasibleBandwidth {
                condition: Some(condition),
            } => write!(f, "insufficient bandwidth for condition {}", condition),
            Outcome::InfeasibleBandwidth { condition: None } => {
                write!(f, "total utilization exceeds 1")
            }
            Outcome::RateUnsuitable => write!(f, "unsuitable rates"),
            Outcome::PrecisionExhausted => write!(f, "precision exhausted"),
            Outcome::UndeterminedPattern(verdicts) => {
                write!(f, "undetermined pattern ({})", verdicts)
            }
        }
    }
}

/// Error type returned when the search itself fails.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum AnalysisError {
    #[error("epsilon must be positive, got {0}")]
    InvalidEpsilon(Share),
    #[error("condition {condition}: {source}")]
    Qpa {
        condition: Condition,
        #[source]
        source: QpaError,
    },
}

/// The windows examined while checking one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionTrace {
    pub condition: Condition,
    pub horizon: u64,
    pub holds: bool,
    pub points: Vec<TracePoint>,
}

/// Everything computed in one bisection step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationTrace {
    pub x: Share,
    pub horizons: Horizons,
    pub verdicts: Verdicts,
    pub conditions: Vec<ConditionTrace>,
}

/// The outcome of a search, how many bisection steps it took, and
/// (with [Options::debug]) what each step looked at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub outcome: Outcome,
    pub iterations: usize,
    pub trace: Vec<IterationTrace>,
}

fn report(options: &Options, analysis: &Analysis) {
    if options.verbose {
        info!(iterations = analysis.iterations, "{}", analysis.outcome);
    } else {
        debug!(iterations = analysis.iterations, "{}", analysis.outcome);
    }
}

fn check_conditions(
    tasks: &TaskSet,
    platform: &Platform,
    horizons: &Horizons,
    options: &Options,
    mut trace: Option<&mut Vec<ConditionTrace>>,
) -> Result<Verdicts, AnalysisError> {
    let mut verdicts = [false; 4];
    for (holds, condition) in verdicts.iter_mut().zip(Condition::all()) {
        let demand = condition.demand(tasks);
        let supply = condition.supply(platform);
        let horizon = horizons.get(condition);
        let mut points = Vec::new();
        *holds = qpa::check(
            &demand,
            &supply,
            horizon,
            options.qpa_iteration_limit,
            trace.is_some().then_some(&mut points),
        )
        .map_err(|source| AnalysisError::Qpa { condition, source })?;
        debug!(%condition, horizon, holds = *holds, "condition checked");

        if let Some(conditions) = trace.as_deref_mut() {
            conditions.push(ConditionTrace {
                condition,
                horizon,
                holds: *holds,
                points,
            });
        }
    }
    Ok(Verdicts::from(verdicts))
}

/// Search for a scaling factor of the HI tasks' deadlines under which
/// `tasks` is schedulable on `platform`.
///
/// The task set is consumed since the search overwrites its virtual
/// deadlines. At most `⌊log2(0.5 / epsilon)⌋ + 1` bisection steps are
/// taken.
pub fn solve(
    mut tasks: TaskSet,
    platform: &Platform,
    options: &Options,
) -> Result<Analysis, AnalysisError> {
    if !(options.epsilon > 0.0) {
        return Err(AnalysisError::InvalidEpsilon(options.epsilon));
    }

    let mut analysis = Analysis {
        outcome: Outcome::PrecisionExhausted,
        iterations: 0,
        trace: Vec::new(),
    };

    if tasks.total_utilization() > 1.0 {
        analysis.outcome = Outcome::InfeasibleBandwidth { condition: None };
        report(options, &analysis);
        return Ok(analysis);
    }

    let mut delta = 0.5;
    let mut x = delta;
    while delta >= options.epsilon {
        analysis.iterations += 1;
        delta /= 2.0;
        tasks.assign_virtual_deadlines(x);

        let horizons = match horizon::horizons(&tasks, platform) {
            Ok(horizons) => horizons,
            Err(InsufficientBandwidth { condition }) => {
                analysis.outcome = Outcome::InfeasibleBandwidth {
                    condition: Some(condition),
                };
                break;
            }
        };

        let mut conditions = Vec::new();
        let verdicts = check_conditions(
            &tasks,
            platform,
            &horizons,
            options,
            options.debug.then_some(&mut conditions),
        )?;

        if options.verbose {
            info!(iteration = analysis.iterations, x, ?horizons, %verdicts, "bisection step");
        } else {
            debug!(iteration = analysis.iterations, x, ?horizons, %verdicts, "bisection step");
        }
        if options.debug {
            analysis.trace.push(IterationTrace {
                x,
                horizons,
                verdicts,
                conditions,
            });
        }

        match options.decision_table.classify(verdicts) {
            Transition::Accept => {
                analysis.outcome = Outcome::Success(x);
                break;
            }
            Transition::Decrease => x -= delta,
            Transition::Increase => x += delta,
            Transition::RateUnsuitable => {
                analysis.outcome = Outcome::RateUnsuitable;
                break;
            }
            Transition::Undetermined => {
                analysis.outcome = Outcome::UndeterminedPattern(verdicts);
                break;
            }
        }
    }

    report(options, &analysis);
    Ok(analysis)
}

#[cfg(test)]
mod tests;
