use super::{Periodic, SupplyBound, SupplyError};
use crate::time::{Duration, Service, Share};

/// A partition with one replenishment period and two budgets: the
/// nominal budget `θ_N`, which applies in LO mode, and the critical
/// budget `θ_C`, which applies after a switch to HI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    nominal: Periodic,
    critical: Periodic,
}

impl Platform {
    /// Construct a platform with `0 < nominal_budget, critical_budget <= period`.
    pub fn new(
        period: Duration,
        nominal_budget: Service,
        critical_budget: Service,
    ) -> Result<Self, SupplyError> {
        Ok(Platform {
            nominal: Periodic::new(nominal_budget, period)?,
            critical: Periodic::new(critical_budget, period)?,
        })
    }

    /// A platform that owns the whole processor in both modes.
    pub fn dedicated(period: Duration) -> Result<Self, SupplyError> {
        Self::new(period, period, period)
    }

    pub fn period(&self) -> Duration {
        self.nominal.period()
    }

    /// The supply `R_N = (π, θ_N)`.
    pub fn nominal(&self) -> Periodic {
        self.nominal
    }

    /// The supply `R_C = (π, θ_C)`.
    pub fn critical(&self) -> Periodic {
        self.critical
    }

    pub fn nominal_bandwidth(&self) -> Share {
        self.nominal.bandwidth()
    }

    pub fn critical_bandwidth(&self) -> Share {
        self.critical.bandwidth()
    }
}
