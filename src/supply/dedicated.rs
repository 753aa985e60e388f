use super::SupplyBound;
use crate::time::{Duration, Service, Share};

/// A trivial model to represent a 100%-available, dedicated processor.
///
/// The classical single-criticality tests run on this supply.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dedicated;

impl SupplyBound for Dedicated {
    fn provided_service(&self, delta: Duration) -> Service {
        delta
    }

    fn service_time(&self, demand: Service) -> Duration {
        demand
    }

    fn bandwidth(&self) -> Share {
        1.0
    }
}
