use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use itertools::iproduct;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mc_resource_analysis::config::{AnalysisFile, Options, SweepConfig};
use mc_resource_analysis::generator::{GenerationStrategy, UUniFastParams};
use mc_resource_analysis::scaling::{self, DecisionTable, Outcome};
use mc_resource_analysis::supply::Platform;
use mc_resource_analysis::time::{Duration, Share};

#[derive(Parser)]
#[command(version, about = "Mixed-criticality schedulability on periodic resources")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze the task set described in a TOML file
    Analyze {
        file: PathBuf,
        /// Print the windows examined in every step as JSON
        #[arg(long)]
        debug: bool,
        /// Log progress at info level
        #[arg(long)]
        verbose: bool,
        /// Precision of the deadline-scaling search
        #[arg(long)]
        epsilon: Option<Share>,
        /// Use the dense decision table
        #[arg(long)]
        dense: bool,
    },
    /// Run a grid of experiments on generated task sets
    Sweep {
        /// JSON sweep configuration; built-in defaults if absent
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of worker threads
        #[arg(long)]
        threads: Option<usize>,
    },
}

/// Result encoding used in sweep output.
fn sentinel(outcome: &Outcome) -> Share {
    match outcome {
        Outcome::Success(x) => *x,
        Outcome::InfeasibleBandwidth { .. } | Outcome::UndeterminedPattern(_) => -1.0,
        Outcome::RateUnsuitable => -2.0,
        Outcome::PrecisionExhausted => -3.0,
    }
}

/// Command-line switches of `analyze`; they override the `[options]`
/// table of the input file.
struct Overrides {
    debug: bool,
    verbose: bool,
    epsilon: Option<Share>,
    dense: bool,
}

impl Overrides {
    fn apply(&self, mut options: Options) -> Options {
        options.debug |= self.debug;
        options.verbose |= self.verbose;
        if let Some(epsilon) = self.epsilon {
            options.epsilon = epsilon;
        }
        if self.dense {
            options.decision_table = DecisionTable::Dense;
        }
        options
    }
}

fn analyze(file: PathBuf, overrides: Overrides) -> Result<()> {
    let input = AnalysisFile::load(&file)?;
    let options = overrides.apply(input.options.clone());

    let (tasks, platform) = input
        .build()
        .with_context(|| format!("invalid input {}", file.display()))?;
    info!(tasks = tasks.len(), "analyzing {}", file.display());
    let analysis = scaling::solve(tasks, &platform, &options)?;

    println!("{}", analysis.outcome);
    println!("iterations: {}", analysis.iterations);
    if options.debug {
        println!("{}", serde_json::to_string_pretty(&analysis.trace)?);
    }
    Ok(())
}

/// One point of the sweep grid.
#[derive(Debug, Clone)]
struct Trial {
    total_utilization: Share,
    iteration: usize,
    crit_prob: Share,
    wcet_ratio: Share,
    deadline_ratio: Share,
    theta_ratio: Share,
    budget_util: Share,
    resource_period: Duration,
    rate: Share,
}

impl Trial {
    fn platform(&self) -> Result<Platform> {
        let period = self.resource_period;
        let nominal = ((self.budget_util * period as Share).floor() as Duration).clamp(1, period);
        let critical =
            ((self.theta_ratio * nominal as Share).floor() as Duration).clamp(1, period);
        Ok(Platform::new(period, nominal, critical)?)
    }

    fn run(&self, config: &SweepConfig, seed: u64) -> Result<String> {
        let strategy = GenerationStrategy::UUniFast(UUniFastParams {
            num_tasks: config.num_tasks,
            total_utilization: self.total_utilization,
            crit_prob: self.crit_prob,
            wcet_ratio: self.wcet_ratio,
            deadline_ratio: self.deadline_ratio,
            rate: self.rate,
            periods: config.periods.clone(),
        });
        let tasks = strategy.generate(&mut StdRng::seed_from_u64(seed))?;
        let platform = self.platform()?;
        let analysis = scaling::solve(tasks, &platform, &config.options)?;
        Ok(format!(
            "{:.3}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{:.2}\t{}\t{:.2}\t{}\t{}\t{:.3}",
            self.total_utilization,
            self.iteration,
            self.crit_prob,
            self.wcet_ratio,
            self.deadline_ratio,
            self.theta_ratio,
            self.budget_util,
            self.resource_period,
            self.rate,
            platform.nominal().budget(),
            platform.critical().budget(),
            sentinel(&analysis.outcome),
        ))
    }
}

fn sweep(config: SweepConfig, seed: u64, threads: usize) -> Result<()> {
    let trials: Vec<Trial> = iproduct!(
        config.total_utilizations.iter().copied(),
        0..config.iterations,
        config.crit_probs.iter().copied(),
        config.wcet_ratios.iter().copied(),
        config.deadline_ratios.iter().copied(),
        config.theta_ratios.iter().copied(),
        config.budget_utils.iter().copied(),
        config.resource_periods.iter().copied(),
        config.rates.iter().copied()
    )
    .map(
        |(u, iteration, crit_prob, wcet_ratio, deadline_ratio, theta_ratio, budget_util, period, rate)| {
            Trial {
                total_utilization: u,
                iteration,
                crit_prob,
                wcet_ratio,
                deadline_ratio,
                theta_ratio,
                budget_util,
                resource_period: period,
                rate,
            }
        },
    )
    .collect();
    info!(trials = trials.len(), threads, "starting sweep");

    let chunk_size = trials.len().div_ceil(threads.max(1)).max(1);
    let lines = thread::scope(|s| {
        let config = &config;
        let workers: Vec<_> = trials
            .chunks(chunk_size)
            .enumerate()
            .map(|(chunk, trials)| {
                s.spawn(move || {
                    trials
                        .iter()
                        .enumerate()
                        .map(|(i, trial)| {
                            // one seed per trial, independent of the thread count
                            let index = (chunk * chunk_size + i) as u64;
                            trial.run(config, seed.wrapping_add(index))
                        })
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().map_err(|_| anyhow!("sweep worker panicked"))?)
            .collect::<Result<Vec<_>>>()
    })?;

    println!("U\titer\tP\tR\tD\tTm\tBm\tPi\trate\tthetaN\tthetaC\tx");
    for line in lines.into_iter().flatten() {
        println!("{}", line);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Analyze {
            file,
            debug,
            verbose,
            epsilon,
            dense,
        } => {
            let overrides = Overrides {
                debug,
                verbose,
                epsilon,
                dense,
            };
            analyze(file, overrides)
        }
        Command::Sweep {
            config,
            seed,
            threads,
        } => {
            let config = match config {
                Some(path) => SweepConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SweepConfig::default(),
            };
            let threads = threads.unwrap_or_else(|| {
                thread::available_parallelism()
                    .map(NonZeroUsize::get)
                    .unwrap_or(1)
            });
            sweep(config, seed, threads)
        }
    }
}
