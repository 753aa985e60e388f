//! Generators for synthetic mixed-criticality task sets.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::{Criticality, Task, TaskError, TaskSet};
use crate::time::{Duration, Service, Share};

/// Error type returned when generator parameters are unusable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("period range {0:?} is empty or contains zero")]
    InvalidPeriods(RangeInclusive<Duration>),
    #[error("criticality probability {0} is not in [0, 1]")]
    InvalidProbability(Share),
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Parameters of the UUniFast-based generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UUniFastParams {
    pub num_tasks: usize,
    /// LO-mode utilization of the whole task set.
    pub total_utilization: Share,
    /// Probability that a task is HI.
    pub crit_prob: Share,
    /// HI-mode WCET of HI tasks as a multiple of their LO-mode WCET.
    pub wcet_ratio: Share,
    /// Relative deadline as a fraction of the period.
    pub deadline_ratio: Share,
    /// Rate of LO tasks after a mode switch.
    pub rate: Share,
    pub periods: RangeInclusive<Duration>,
}

/// How task sets are generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationStrategy {
    UUniFast(UUniFastParams),
}

impl GenerationStrategy {
    /// Draw one task set.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TaskSet, GeneratorError> {
        match self {
            GenerationStrategy::UUniFast(params) => generate_uunifast(params, rng),
        }
    }
}

/// Split `total` into `n` utilizations uniformly distributed over the
/// simplex (Bini & Buttazzo's UUniFast).
pub fn uunifast<R: Rng + ?Sized>(rng: &mut R, n: usize, total: Share) -> Vec<Share> {
    let mut utilizations = Vec::with_capacity(n);
    let mut sum = total;
    for i in 1..n {
        let next = sum * rng.gen::<Share>().powf(1.0 / (n - i) as Share);
        utilizations.push(sum - next);
        sum = next;
    }
    if n > 0 {
        utilizations.push(sum);
    }
    utilizations
}

fn generate_uunifast<R: Rng + ?Sized>(
    params: &UUniFastParams,
    rng: &mut R,
) -> Result<TaskSet, GeneratorError> {
    if params.periods.is_empty() || *params.periods.start() == 0 {
        return Err(GeneratorError::InvalidPeriods(params.periods.clone()));
    }
    if !(0.0..=1.0).contains(&params.crit_prob) {
        return Err(GeneratorError::InvalidProbability(params.crit_prob));
    }

    let mut tasks = TaskSet::new();
    for u in uunifast(rng, params.num_tasks, params.total_utilization) {
        let period = rng.gen_range(params.periods.clone());
        let wcet_lo = ((u * period as Share).round() as Service).max(1);
        let criticality = if rng.gen_bool(params.crit_prob) {
            Criticality::Hi
        } else {
            Criticality::Lo
        };
        let wcet_hi = match criticality {
            Criticality::Hi => (wcet_lo as Share * params.wcet_ratio).ceil() as Service,
            Criticality::Lo => wcet_lo,
        };
        let deadline = wcet_hi.max((params.deadline_ratio * period as Share).ceil() as Duration);

        let task = Task::new(wcet_lo, wcet_hi, period, deadline, criticality)?;
        let task = match criticality {
            Criticality::Lo => task.with_rate(params.rate)?,
            Criticality::Hi => task,
        };
        tasks.add(task);
    }
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn params() -> UUniFastParams {
        UUniFastParams {
            num_tasks: 10,
            total_utilization: 0.5,
            crit_prob: 0.5,
            wcet_ratio: 2.0,
            deadline_ratio: 0.8,
            rate: 0.1,
            periods: 10..=100,
        }
    }

    #[test]
    fn uunifast_sums_to_total() {
        let mut rng = StdRng::seed_from_u64(1);
        for n in 1..20 {
            let utils = uunifast(&mut rng, n, 0.7);
            assert_eq!(utils.len(), n);
            assert!(utils.iter().all(|u| *u >= 0.0));
            assert_approx_eq!(utils.iter().sum::<f64>(), 0.7);
        }
        assert!(uunifast(&mut rng, 0, 0.7).is_empty());
    }

    #[test]
    fn generated_tasks_follow_parameters() {
        let mut rng = StdRng::seed_from_u64(2);
        let strategy = GenerationStrategy::UUniFast(params());
        let mut hi = 0;
        for _ in 0..50 {
            let ts = strategy.generate(&mut rng).unwrap();
            assert_eq!(ts.len(), 10);
            for task in ts.tasks() {
                assert!((10..=100).contains(&task.period()));
                assert!(task.wcet_lo() >= 1);
                assert!(task.deadline() >= task.wcet_hi());
                assert!(task.deadline() >= (0.8 * task.period() as f64).ceil() as u64);
                if task.is_hi() {
                    hi += 1;
                    assert_eq!(task.wcet_hi(), task.wcet_lo() * 2);
                    assert_approx_eq!(task.rate(), 1.0);
                } else {
                    assert_eq!(task.wcet_hi(), task.wcet_lo());
                    assert_approx_eq!(task.rate(), 0.1);
                }
            }
        }
        // roughly half of 500 tasks
        assert!((150..=350).contains(&hi));
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let strategy = GenerationStrategy::UUniFast(params());
        let a = strategy.generate(&mut StdRng::seed_from_u64(3)).unwrap();
        let b = strategy.generate(&mut StdRng::seed_from_u64(3)).unwrap();
        let a: Vec<_> = a.tasks().cloned().collect();
        let b: Vec<_> = b.tasks().cloned().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_parameters() {
        let mut rng = StdRng::seed_from_u64(4);
        let bad = |p: UUniFastParams| GenerationStrategy::UUniFast(p);

        let mut p = params();
        p.periods = 0..=10;
        assert!(matches!(
            bad(p).generate(&mut rng),
            Err(GeneratorError::InvalidPeriods(_))
        ));

        let mut p = params();
        p.crit_prob = 1.5;
        assert_eq!(
            bad(p).generate(&mut rng).unwrap_err(),
            GeneratorError::InvalidProbability(1.5)
        );

        let mut p = params();
        p.crit_prob = 0.0;
        p.rate = 0.0;
        assert_eq!(
            bad(p).generate(&mut rng).unwrap_err(),
            GeneratorError::Task(TaskError::RateOutOfRange(0.0))
        );
    }
}
