/*! Models of resource supply (dedicated processors, periodic partitions)

This module provides the trait [SupplyBound], which models the notion of
a *supply-bound function* (SBF) together with its inverse, as well as the
[Platform] that hands out a nominal and a critical periodic supply. */

use auto_impl::auto_impl;
use thiserror::Error;

use crate::time::{Duration, Service, Share};

/// Generic interface for models of processor supply.
#[auto_impl(&, Box, Rc)]
pub trait SupplyBound {
    /// Bound the minimum amount of service provided during an
    /// interval of length `delta`.
    fn provided_service(&self, delta: Duration) -> Service;

    /// Bound the minimum interval length during which the supply
    /// provides at least `demand` amount of service.
    fn service_time(&self, demand: Service) -> Duration {
        let mut t = demand;
        loop {
            let supply = self.provided_service(t);
            if supply >= demand {
                return t;
            }
            // jump ahead by how much is still missing
            t += demand - supply;
        }
    }

    /// The long-run fraction of time during which service is provided.
    fn bandwidth(&self) -> Share;
}

/// Error type returned when supply parameters are inconsistent.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SupplyError {
    #[error("resource period must be non-zero")]
    ZeroPeriod,
    #[error("budget {budget} must be positive and at most the period {period}")]
    InvalidBudget { budget: Service, period: Duration },
}

mod dedicated;
mod periodic;
mod platform;

pub use dedicated::Dedicated;
pub use periodic::Periodic;
pub use platform::Platform;
