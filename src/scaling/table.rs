use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The outcome of the four condition checks for one scaling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display(fmt = "A={} B={} C={} D={}", a, b, c, d)]
pub struct Verdicts {
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub d: bool,
}

impl From<[bool; 4]> for Verdicts {
    fn from([a, b, c, d]: [bool; 4]) -> Self {
        Verdicts { a, b, c, d }
    }
}

impl Verdicts {
    pub fn all_hold(&self) -> bool {
        self.a && self.b && self.c && self.d
    }
}

/// What the bisection does next, given the verdicts at the current
/// scaling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// All conditions hold.
    Accept,
    /// Shrink the scaling factor by the current step.
    Decrease,
    /// Grow the scaling factor by the current step.
    Increase,
    /// The rate-dependent conditions pull in opposite directions.
    RateUnsuitable,
    /// No rule applies to this combination of verdicts.
    Undetermined,
}

/// Mapping from verdict combinations to bisection moves.
///
/// Conditions A and C get easier as virtual deadlines grow, while B and
/// D get harder. B and C also depend on the LO tasks' rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionTable {
    /// Four moving patterns only; everything else is undetermined.
    #[default]
    Canonical,
    /// Every pattern in which only conditions of one direction fail
    /// moves the search. On top of those moves, `A=true B=false C=false
    /// D=true` is reported as an unsuitable rate rather than left
    /// undetermined.
    Dense,
}

impl DecisionTable {
    pub fn classify(self, verdicts: Verdicts) -> Transition {
        use Transition::*;

        if verdicts.all_hold() {
            return Accept;
        }
        let Verdicts { a, b, c, d } = verdicts;
        match self {
            DecisionTable::Canonical => match (a, b, c, d) {
                (true, true, true, false) => Decrease,
                (true, false, true, true) => Increase,
                (false, true, false, true) => Increase,
                (true, false, false, true) => Decrease,
                _ => Undetermined,
            },
            DecisionTable::Dense => match (a, b, c, d) {
                (true, true, true, false)
                | (true, false, true, true)
                | (true, false, true, false) => Decrease,
                (true, true, false, true)
                | (false, true, true, true)
                | (false, true, false, true) => Increase,
                (true, false, false, true) => RateUnsuitable,
                _ => Undetermined,
            },
        }
    }
}
