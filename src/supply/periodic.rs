use super::{SupplyBound, SupplyError};
use crate::time::{Duration, Service, Share};

/// The classic periodic resource model.
///
/// The client(s) of this supply is/are guaranteed (at least)
/// `budget` time units of processor service every `period` time
/// units, at arbitrary positions within each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    period: Duration,
    budget: Service,
}

impl Periodic {
    /// Construct a new periodic supply, where `0 < budget <= period`.
    pub fn new(budget: Service, period: Duration) -> Result<Self, SupplyError> {
        if period == 0 {
            return Err(SupplyError::ZeroPeriod);
        }
        if budget == 0 || budget > period {
            return Err(SupplyError::InvalidBudget { budget, period });
        }
        Ok(Periodic { period, budget })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn budget(&self) -> Service {
        self.budget
    }

    /// Length of the longest interval without any service is twice this.
    pub fn blackout(&self) -> Duration {
        self.period - self.budget
    }
}

impl SupplyBound for Periodic {
    fn provided_service(&self, delta: Duration) -> Service {
        // Supply bound function of the periodic resource model,
        // as given by Shin & Lee (RTSS 2003).

        let slack = self.blackout();
        if slack > delta {
            return 0;
        }
        // implicit floor due to integer division
        let full_periods = (delta - slack) / self.period;
        let x = slack + slack + full_periods * self.period;
        let fractional_period = if x < delta { delta - x } else { 0 };

        full_periods * self.budget + fractional_period
    }

    fn service_time(&self, demand: Service) -> Duration {
        let slack = self.blackout();

        if demand == 0 {
            return 0;
        }

        // implicit floor due to integer division
        let full_periods = demand / self.budget;
        let full_budget = full_periods * self.budget;
        let fractional_budget = if full_budget < demand {
            slack + demand - full_budget
        } else {
            0
        };

        slack + self.period * full_periods + fractional_budget
    }

    fn bandwidth(&self) -> Share {
        self.budget as Share / self.period as Share
    }
}
