use itertools::Itertools;

use super::DemandBound;
use crate::time::{Duration, Service};

/// A wrapper type for representing the total demand of a vector of
/// individual demand sources (e.g., all tasks of one condition).
#[derive(Clone, Debug)]
pub struct Aggregate<T> {
    individual: Vec<T>,
}

impl<T> Aggregate<T> {
    pub fn new(components: Vec<T>) -> Self {
        Aggregate {
            individual: components,
        }
    }

    pub fn len(&self) -> usize {
        self.individual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individual.is_empty()
    }
}

impl<T> FromIterator<T> for Aggregate<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Aggregate::new(iter.into_iter().collect())
    }
}

impl<T: DemandBound> DemandBound for Aggregate<T> {
    fn demand(&self, delta: Duration) -> Service {
        self.individual.iter().map(|dbf| dbf.demand(delta)).sum()
    }

    fn steps_iter<'a>(&'a self) -> Box<dyn Iterator<Item = Duration> + 'a> {
        Box::new(
            self.individual
                .iter()
                .map(|dbf| dbf.steps_iter())
                .kmerge()
                .dedup(),
        )
    }

    fn first_step(&self) -> Option<Duration> {
        self.individual
            .iter()
            .filter_map(|dbf| dbf.first_step())
            .min()
    }
}
