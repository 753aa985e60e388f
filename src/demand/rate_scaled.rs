use super::{jobs, DemandBound};
use crate::time::{Duration, Service, Share};

/// Demand of a LO task whose service is degraded to a fraction `rate`
/// of its jobs after a criticality-mode switch.
///
/// Of the jobs due within the window, `⌈rate × n⌉` are counted, each
/// with the LO-mode WCET. Not every step of the sequence changes the
/// demand when `rate < 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateScaled {
    pub period: Duration,
    pub deadline: Duration,
    pub cost: Service,
    pub rate: Share,
}

impl DemandBound for RateScaled {
    fn demand(&self, delta: Duration) -> Service {
        let n = jobs(delta, self.deadline, self.period);
        (self.rate * n as Share).ceil() as Service * self.cost
    }

    fn steps_iter<'a>(&'a self) -> Box<dyn Iterator<Item = Duration> + 'a> {
        let (deadline, period) = (self.deadline, self.period);
        Box::new((0..).map(move |k| deadline + k * period))
    }

    fn first_step(&self) -> Option<Duration> {
        Some(self.deadline)
    }
}
