use super::{jobs, DemandBound};
use crate::time::{Duration, Service};

/// Demand a HI task still has to complete after a mode switch: its
/// full HI-mode demand minus the LO-mode execution the carry-over job
/// may already have received before its virtual deadline.
///
/// With `o = deadline - virtual_deadline`, the full demand counts
/// `wcet_hi` for each job due within `o`-shifted windows. Within each
/// period, the already-served portion shrinks by one unit per tick
/// over the phase window starting at `o`, so the function ramps
/// rather than steps there. Every instant of such a ramp is reported
/// by [DemandBound::steps_iter].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Residual {
    pub period: Duration,
    pub deadline: Duration,
    pub virtual_deadline: Duration,
    pub wcet_lo: Service,
    pub wcet_hi: Service,
}

impl Residual {
    fn offset(&self) -> Duration {
        self.deadline - self.virtual_deadline
    }

    fn served(&self, delta: Duration) -> Service {
        let o = self.offset();
        let n = delta % self.period;
        if o <= n && n <= self.deadline {
            (self.wcet_lo + o).saturating_sub(n)
        } else {
            0
        }
    }

    /// Last phase within a period at which the demand can change.
    fn ramp_end(&self) -> Duration {
        let o = self.offset();
        if self.wcet_lo > 0 && o < self.period {
            self.deadline
                .min(self.period - 1)
                .min(o + self.wcet_lo - 1)
                + 1
        } else {
            o
        }
    }
}

impl DemandBound for Residual {
    fn demand(&self, delta: Duration) -> Service {
        let full = jobs(delta, self.offset(), self.period) * self.wcet_hi;
        full.saturating_sub(self.served(delta))
    }

    fn steps_iter<'a>(&'a self) -> Box<dyn Iterator<Item = Duration> + 'a> {
        let (o, end, period) = (self.offset(), self.ramp_end(), self.period);
        Box::new((0..).flat_map(move |k| (o..=end).map(move |n| k * period + n)))
    }

    fn first_step(&self) -> Option<Duration> {
        Some(self.offset())
    }
}
