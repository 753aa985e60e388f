use assert_approx_eq::assert_approx_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classic;
use crate::config::Options;
use crate::demand::Condition;
use crate::horizon::Horizons;
use crate::scaling::{solve, AnalysisError, DecisionTable, Outcome, Transition, Verdicts};
use crate::supply::Platform;
use crate::task::{Criticality, Task, TaskSet};

fn example_set() -> TaskSet {
    vec![
        Task::new(2, 2, 10, 10, Criticality::Lo)
            .unwrap()
            .with_rate(0.9)
            .unwrap(),
        Task::new(4, 5, 10, 6, Criticality::Hi).unwrap(),
    ]
    .into_iter()
    .collect()
}

fn verdicts(a: bool, b: bool, c: bool, d: bool) -> Verdicts {
    Verdicts { a, b, c, d }
}

#[test]
fn example_is_schedulable() {
    let platform = Platform::dedicated(60).unwrap();
    let analysis = solve(example_set(), &platform, &Options::default()).unwrap();
    assert_eq!(analysis.outcome, Outcome::Success(0.75));
    assert_eq!(analysis.iterations, 2);
    assert!(analysis.trace.is_empty());
    assert!(analysis.outcome.is_success());
    assert_eq!(analysis.outcome.scaling_factor(), Some(0.75));
}

#[test]
fn debug_trace() {
    let platform = Platform::dedicated(60).unwrap();
    let options = Options {
        debug: true,
        ..Options::default()
    };
    let analysis = solve(example_set(), &platform, &options).unwrap();
    assert_eq!(analysis.trace.len(), 2);

    let first = &analysis.trace[0];
    assert_approx_eq!(first.x, 0.5);
    assert_eq!(
        first.horizons,
        Horizons {
            a: 7,
            b: 18,
            c: 12,
            d: 7
        }
    );
    assert_eq!(first.verdicts, verdicts(false, true, false, true));

    let second = &analysis.trace[1];
    assert_approx_eq!(second.x, 0.75);
    assert_eq!(
        second.horizons,
        Horizons {
            a: 7,
            b: 19,
            c: 11,
            d: 8
        }
    );
    assert!(second.verdicts.all_hold());

    for step in &analysis.trace {
        let conditions: Vec<_> = step.conditions.iter().map(|c| c.condition).collect();
        assert_eq!(conditions, Condition::all().to_vec());
        for c in &step.conditions {
            assert_eq!(c.horizon, step.horizons.get(c.condition));
            assert!(!c.points.is_empty());
        }
    }
    // A fails at x = 0.5: the HI job due at 3 cannot be served in time
    let a = &first.conditions[0];
    assert!(!a.holds);
    assert!(a.points.iter().any(|p| p.demand > p.supply));
}

#[test]
fn trace_serializes() {
    let platform = Platform::dedicated(60).unwrap();
    let options = Options {
        debug: true,
        ..Options::default()
    };
    let analysis = solve(example_set(), &platform, &options).unwrap();
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["iterations"], 2);
    assert_eq!(json["outcome"]["Success"], 0.75);
    assert_eq!(json["trace"][0]["conditions"][1]["condition"], "B");
}

#[test]
fn total_utilization_above_one() {
    // a single HI task needing more than the whole period in HI mode
    let ts: TaskSet = vec![Task::new(10, 70, 60, 60, Criticality::Hi).unwrap()]
        .into_iter()
        .collect();
    let platform = Platform::dedicated(60).unwrap();
    let analysis = solve(ts, &platform, &Options::default()).unwrap();
    assert_eq!(
        analysis.outcome,
        Outcome::InfeasibleBandwidth { condition: None }
    );
    assert_eq!(analysis.iterations, 0);
}

#[test]
fn insufficient_nominal_budget() {
    let platform = Platform::new(60, 30, 60).unwrap();
    let analysis = solve(example_set(), &platform, &Options::default()).unwrap();
    assert_eq!(
        analysis.outcome,
        Outcome::InfeasibleBandwidth {
            condition: Some(Condition::A)
        }
    );
    assert_eq!(analysis.iterations, 1);
}

#[test]
fn nominal_budget_sweep() {
    let options = Options::default();
    let mut schedulable = false;
    for nominal in 1..=60 {
        let platform = Platform::new(60, nominal, 60).unwrap();
        let outcome = solve(example_set(), &platform, &options).unwrap().outcome;

        // more nominal budget never hurts
        if schedulable {
            assert!(outcome.is_success(), "lost schedulability at {}", nominal);
        }
        schedulable = outcome.is_success();

        match nominal {
            1..=40 => assert!(matches!(
                outcome,
                Outcome::InfeasibleBandwidth { condition: Some(_) }
            )),
            41..=58 => assert_eq!(
                outcome,
                Outcome::UndeterminedPattern(verdicts(false, false, false, true))
            ),
            59 => assert_eq!(
                outcome,
                Outcome::UndeterminedPattern(verdicts(false, false, true, true))
            ),
            _ => assert_eq!(outcome, Outcome::Success(0.75)),
        }
    }
}

#[test]
fn dense_table_on_example() {
    let platform = Platform::dedicated(60).unwrap();
    let options = Options {
        decision_table: DecisionTable::Dense,
        ..Options::default()
    };
    let analysis = solve(example_set(), &platform, &options).unwrap();
    assert_eq!(analysis.outcome, Outcome::Success(0.75));
}

#[test]
fn precision() {
    let platform = Platform::dedicated(60).unwrap();

    let coarse = Options {
        epsilon: 0.6,
        ..Options::default()
    };
    let analysis = solve(example_set(), &platform, &coarse).unwrap();
    assert_eq!(analysis.outcome, Outcome::PrecisionExhausted);
    assert_eq!(analysis.iterations, 0);

    for epsilon in [0.0, -1.0, f64::NAN] {
        let options = Options {
            epsilon,
            ..Options::default()
        };
        assert!(matches!(
            solve(example_set(), &platform, &options),
            Err(AnalysisError::InvalidEpsilon(_))
        ));
    }
}

#[test]
fn precision_exhausted_while_oscillating() {
    // A fails for small scaling factors and B for large ones, so the
    // search alternates until the step drops below epsilon.
    let ts: TaskSet = vec![
        Task::new(2, 2, 7, 3, Criticality::Lo)
            .unwrap()
            .with_rate(0.5)
            .unwrap(),
        Task::new(1, 1, 3, 3, Criticality::Lo)
            .unwrap()
            .with_rate(0.6)
            .unwrap(),
        Task::new(1, 1, 7, 6, Criticality::Hi).unwrap(),
    ]
    .into_iter()
    .collect();
    let platform = Platform::new(2, 2, 1).unwrap();
    let options = Options {
        debug: true,
        ..Options::default()
    };

    let analysis = solve(ts, &platform, &options).unwrap();
    assert_eq!(analysis.outcome, Outcome::PrecisionExhausted);
    assert_eq!(analysis.iterations, 6);

    let xs: Vec<_> = analysis.trace.iter().map(|step| step.x).collect();
    let expected = [0.5, 0.75, 0.625, 0.6875, 0.65625, 0.671875];
    assert_eq!(xs.len(), expected.len());
    for (x, e) in xs.iter().zip(expected) {
        assert_approx_eq!(*x, e);
    }
    for (i, step) in analysis.trace.iter().enumerate() {
        let pattern = if i % 2 == 0 {
            verdicts(false, true, false, true)
        } else {
            verdicts(true, false, false, true)
        };
        assert_eq!(step.verdicts, pattern, "step {}", i);
    }
}

fn random_task_set(rng: &mut StdRng, hi_probability: f64) -> TaskSet {
    let n = rng.gen_range(1..=5);
    (0..n)
        .map(|_| {
            let period = rng.gen_range(5..=30);
            let deadline = rng.gen_range(period / 2..=period);
            let wcet_lo = rng.gen_range(1..=(period / 4).max(1));
            let hi = rng.gen_bool(hi_probability);
            let wcet_hi = if hi { wcet_lo * rng.gen_range(1..=3) } else { wcet_lo };
            let criticality = if hi { Criticality::Hi } else { Criticality::Lo };
            Task::new(wcet_lo, wcet_hi, period, deadline, criticality)
                .unwrap()
                .with_rate(rng.gen_range(1..=10) as f64 / 10.0)
                .unwrap()
        })
        .collect()
}

#[test]
fn nominal_budget_sweep_random_sets() {
    let mut rng = StdRng::seed_from_u64(13);
    let options = Options::default();
    for _ in 0..40 {
        let ts = random_task_set(&mut rng, 0.5);
        let period = rng.gen_range(2..=20);
        let critical = rng.gen_range(1..=period);
        let mut schedulable = false;
        for nominal in 1..=critical {
            let platform = Platform::new(period, nominal, critical).unwrap();
            let outcome = solve(ts.clone(), &platform, &options).unwrap().outcome;
            if schedulable {
                assert!(
                    outcome.is_success(),
                    "lost schedulability at nominal budget {} of ({}, {})",
                    nominal,
                    period,
                    critical
                );
            }
            schedulable = outcome.is_success();
        }
    }
}

#[test]
fn bisection_terminates() {
    let mut rng = StdRng::seed_from_u64(3);
    for epsilon in [0.2, 0.1, 0.01, 0.001] {
        let bound = (0.5f64 / epsilon).log2().floor() as usize + 1;
        for _ in 0..30 {
            let ts = random_task_set(&mut rng, 0.5);
            let period = rng.gen_range(2..=20);
            let nominal = rng.gen_range(1..=period);
            let critical = rng.gen_range(nominal..=period);
            let platform = Platform::new(period, nominal, critical).unwrap();
            let options = Options {
                epsilon,
                ..Options::default()
            };
            let analysis = solve(ts, &platform, &options).unwrap();
            assert!(analysis.iterations <= bound);
            if let Outcome::Success(x) = analysis.outcome {
                assert!(x > 0.0 && x <= 1.0);
            }
        }
    }
}

#[test]
fn identical_inputs_identical_results() {
    let mut rng = StdRng::seed_from_u64(5);
    let options = Options {
        debug: true,
        ..Options::default()
    };
    for _ in 0..30 {
        let ts = random_task_set(&mut rng, 0.5);
        let platform = Platform::new(10, rng.gen_range(5..=10), 10).unwrap();
        let first = solve(ts.clone(), &platform, &options).unwrap();
        let second = solve(ts, &platform, &options).unwrap();
        assert_eq!(first, second);
    }

    // identifiers follow insertion order and do not matter
    let reversed: TaskSet = example_set().tasks().rev().cloned().collect();
    let platform = Platform::dedicated(60).unwrap();
    assert_eq!(
        solve(reversed, &platform, &Options::default())
            .unwrap()
            .outcome,
        Outcome::Success(0.75)
    );
}

#[test]
fn all_lo_matches_classic_test() {
    let mut rng = StdRng::seed_from_u64(9);
    let mut successes = 0;
    for _ in 0..200 {
        let ts = random_task_set(&mut rng, 0.0);
        let period = rng.gen_range(1..=10);
        let nominal = rng.gen_range(1..=period);
        let critical = rng.gen_range(nominal..=period);
        let platform = Platform::new(period, nominal, critical).unwrap();

        // Without HI tasks, B and C see at most the demand of A on at
        // least the supply of A, and D sees no demand at all.
        let expected = classic::periodic_resource(&ts, &platform.nominal()).unwrap();
        let outcome = solve(ts, &platform, &Options::default()).unwrap().outcome;
        assert_eq!(outcome.is_success(), expected);
        if expected {
            successes += 1;
            // virtual deadlines play no role
            assert_eq!(outcome, Outcome::Success(0.5));
        }
    }
    assert!(successes > 0);
}

#[test]
fn canonical_table() {
    let table = DecisionTable::Canonical;
    assert_eq!(table.classify(verdicts(true, true, true, true)), Transition::Accept);
    assert_eq!(table.classify(verdicts(true, true, true, false)), Transition::Decrease);
    assert_eq!(table.classify(verdicts(true, false, true, true)), Transition::Increase);
    assert_eq!(table.classify(verdicts(false, true, false, true)), Transition::Increase);
    assert_eq!(table.classify(verdicts(true, false, false, true)), Transition::Decrease);
}

#[test]
fn dense_table() {
    let table = DecisionTable::Dense;
    assert_eq!(table.classify(verdicts(true, true, true, true)), Transition::Accept);
    assert_eq!(table.classify(verdicts(true, false, true, true)), Transition::Decrease);
    assert_eq!(table.classify(verdicts(true, false, true, false)), Transition::Decrease);
    assert_eq!(table.classify(verdicts(true, true, false, true)), Transition::Increase);
    assert_eq!(table.classify(verdicts(false, true, true, true)), Transition::Increase);
    assert_eq!(table.classify(verdicts(true, false, false, true)), Transition::RateUnsuitable);
}

#[test]
fn undetermined_patterns() {
    // Combinations without a rule are reported rather than guessed;
    // this count documents how many such gaps each table has.
    let count = |table: DecisionTable| {
        (0..16u8)
            .map(|bits| Verdicts::from([bits & 8 != 0, bits & 4 != 0, bits & 2 != 0, bits & 1 != 0]))
            .filter(|v| table.classify(*v) == Transition::Undetermined)
            .count()
    };
    assert_eq!(count(DecisionTable::Canonical), 11);
    assert_eq!(count(DecisionTable::Dense), 8);
    assert_eq!(
        DecisionTable::Canonical.classify(verdicts(false, false, false, false)),
        Transition::Undetermined
    );
}
