/*! Analysis options and input files

Analysis inputs are read from TOML files describing the platform, the
tasks, and optionally the analysis options. Sweep configurations, which
describe a whole grid of synthetic experiments, are read from JSON. */

use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scaling::DecisionTable;
use crate::supply::{Platform, SupplyError};
use crate::task::{Task, TaskError, TaskSet, TaskSpec};
use crate::time::{Duration, Service, Share};

/// Error type returned when an input file cannot be turned into an analysis.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("task {index}: {source}")]
    Task {
        index: usize,
        #[source]
        source: TaskError,
    },
    #[error("platform: {0}")]
    Supply(#[from] SupplyError),
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn default_epsilon() -> Share {
    1e-2
}

fn default_qpa_iteration_limit() -> usize {
    1_000_000
}

/// Knobs of the deadline-scaling search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Record the windows examined by every QPA run.
    #[serde(default)]
    pub debug: bool,

    /// Report progress at `info` level rather than `debug`.
    #[serde(default)]
    pub verbose: bool,

    /// The bisection stops once its step falls below this value.
    #[serde(default = "default_epsilon")]
    pub epsilon: Share,

    #[serde(default)]
    pub decision_table: DecisionTable,

    #[serde(default = "default_qpa_iteration_limit")]
    pub qpa_iteration_limit: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            debug: false,
            verbose: false,
            epsilon: default_epsilon(),
            decision_table: DecisionTable::default(),
            qpa_iteration_limit: default_qpa_iteration_limit(),
        }
    }
}

/// The `[platform]` table of an analysis file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSpec {
    pub period: Duration,
    pub nominal_budget: Service,
    pub critical_budget: Service,
}

impl TryFrom<PlatformSpec> for Platform {
    type Error = SupplyError;

    fn try_from(spec: PlatformSpec) -> Result<Self, Self::Error> {
        Platform::new(spec.period, spec.nominal_budget, spec.critical_budget)
    }
}

/// A complete analysis problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFile {
    pub platform: PlatformSpec,

    #[serde(default)]
    pub options: Options,

    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

impl AnalysisFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::parse(&read(path.as_ref())?)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Validate the platform and all tasks. Tasks are numbered from 1
    /// in error messages, in file order.
    pub fn build(&self) -> Result<(TaskSet, Platform), ConfigError> {
        let platform = Platform::try_from(self.platform)?;
        let mut tasks = TaskSet::new();
        for (i, spec) in self.tasks.iter().enumerate() {
            let task = Task::try_from(spec.clone()).map_err(|source| ConfigError::Task {
                index: i + 1,
                source,
            })?;
            tasks.add(task);
        }
        Ok((tasks, platform))
    }
}

fn default_total_utilizations() -> Vec<Share> {
    vec![0.1, 0.3, 0.5, 0.7]
}

fn default_iterations() -> usize {
    10
}

fn default_num_tasks() -> usize {
    10
}

fn default_crit_probs() -> Vec<Share> {
    vec![0.5]
}

fn default_wcet_ratios() -> Vec<Share> {
    vec![2.0, 3.0]
}

fn default_deadline_ratios() -> Vec<Share> {
    vec![0.7, 0.8]
}

fn default_ratios_of_one() -> Vec<Share> {
    vec![1.0]
}

fn default_resource_periods() -> Vec<Duration> {
    vec![100]
}

fn default_rates() -> Vec<Share> {
    vec![0.1]
}

fn default_periods() -> RangeInclusive<Duration> {
    10..=100
}

/// The grid of synthetic experiments run by a sweep.
///
/// One task set is generated for every point of the Cartesian product
/// of all lists, times `iterations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_total_utilizations")]
    pub total_utilizations: Vec<Share>,

    #[serde(default = "default_iterations")]
    pub iterations: usize,

    #[serde(default = "default_num_tasks")]
    pub num_tasks: usize,

    /// Probability that a generated task is HI.
    #[serde(default = "default_crit_probs")]
    pub crit_probs: Vec<Share>,

    #[serde(default = "default_wcet_ratios")]
    pub wcet_ratios: Vec<Share>,

    #[serde(default = "default_deadline_ratios")]
    pub deadline_ratios: Vec<Share>,

    /// Critical budget as a multiple of the nominal budget.
    #[serde(default = "default_ratios_of_one")]
    pub theta_ratios: Vec<Share>,

    /// Nominal budget as a fraction of the resource period.
    #[serde(default = "default_ratios_of_one")]
    pub budget_utils: Vec<Share>,

    #[serde(default = "default_resource_periods")]
    pub resource_periods: Vec<Duration>,

    #[serde(default = "default_rates")]
    pub rates: Vec<Share>,

    /// Range task periods are drawn from.
    #[serde(default = "default_periods")]
    pub periods: RangeInclusive<Duration>,

    #[serde(default)]
    pub options: Options,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            total_utilizations: default_total_utilizations(),
            iterations: default_iterations(),
            num_tasks: default_num_tasks(),
            crit_probs: default_crit_probs(),
            wcet_ratios: default_wcet_ratios(),
            deadline_ratios: default_deadline_ratios(),
            theta_ratios: default_ratios_of_one(),
            budget_utils: default_ratios_of_one(),
            resource_periods: default_resource_periods(),
            rates: default_rates(),
            periods: default_periods(),
            options: Options::default(),
        }
    }
}

impl SweepConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::parse(&read(path.as_ref())?)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }
}
