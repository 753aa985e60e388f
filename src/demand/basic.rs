use super::{jobs, DemandBound};
use crate::time::{Duration, Service};

/// The classic demand-bound function of a periodic task: every job
/// that arrives and is due within the window contributes its full cost.
///
/// The deadline and cost are those of the mode under analysis, e.g.,
/// a HI task's virtual deadline and LO-mode WCET.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Basic {
    pub period: Duration,
    pub deadline: Duration,
    pub cost: Service,
}

impl DemandBound for Basic {
    fn demand(&self, delta: Duration) -> Service {
        jobs(delta, self.deadline, self.period) * self.cost
    }

    fn steps_iter<'a>(&'a self) -> Box<dyn Iterator<Item = Duration> + 'a> {
        let (deadline, period) = (self.deadline, self.period);
        Box::new((0..).map(move |k| deadline + k * period))
    }

    fn first_step(&self) -> Option<Duration> {
        Some(self.deadline)
    }
}
