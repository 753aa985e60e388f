use derive_more::Display;

use super::{Criticality, Task};
use crate::time::{Duration, Share};

/// Identifier of a task within the [TaskSet] it was added to.
///
/// Identifiers are handed out sequentially, starting at 1, in the
/// order in which tasks are added. They carry no meaning for the
/// analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display(fmt = "#{}", _0)]
pub struct TaskId(usize);

impl TaskId {
    pub fn get(self) -> usize {
        self.0
    }
}

/// An ordered collection of tasks together with running utilization sums.
///
/// The sums are updated as tasks are added and never recomputed.
#[derive(Debug, Clone, Default)]
pub struct TaskSet {
    tasks: Vec<Task>,
    utilization_lo_lo: Share,
    utilization_hi_lo: Share,
    utilization_lo_hi: Share,
    utilization_hi_hi: Share,
    rate_utilization_lo: Share,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task and return the identifier assigned to it.
    pub fn add(&mut self, task: Task) -> TaskId {
        match task.criticality() {
            Criticality::Lo => {
                self.utilization_lo_lo += task.utilization_lo();
                self.utilization_hi_lo += task.utilization_hi();
                self.rate_utilization_lo += task.rate_utilization();
            }
            Criticality::Hi => {
                self.utilization_lo_hi += task.utilization_lo();
                self.utilization_hi_hi += task.utilization_hi();
            }
        }
        self.tasks.push(task);
        TaskId(self.tasks.len())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        id.0.checked_sub(1).and_then(|i| self.tasks.get(i))
    }

    /// Iterate over all tasks together with their identifiers, in
    /// insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> + '_ {
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (TaskId(i + 1), task))
    }

    pub fn tasks(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn lo_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(|t| !t.is_hi())
    }

    pub fn hi_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(|t| t.is_hi())
    }

    /// LO-mode utilization of the LO tasks.
    pub fn utilization_lo_lo(&self) -> Share {
        self.utilization_lo_lo
    }

    /// HI-mode utilization of the LO tasks.
    pub fn utilization_hi_lo(&self) -> Share {
        self.utilization_hi_lo
    }

    /// LO-mode utilization of the HI tasks.
    pub fn utilization_lo_hi(&self) -> Share {
        self.utilization_lo_hi
    }

    /// HI-mode utilization of the HI tasks.
    pub fn utilization_hi_hi(&self) -> Share {
        self.utilization_hi_hi
    }

    /// LO-mode utilization of the LO tasks, weighted by their rates.
    pub fn rate_utilization_lo(&self) -> Share {
        self.rate_utilization_lo
    }

    /// Worst-case utilization: every task at its HI-mode budget.
    pub fn total_utilization(&self) -> Share {
        self.utilization_hi_lo + self.utilization_hi_hi
    }

    pub fn min_deadline(&self) -> Option<Duration> {
        self.tasks.iter().map(Task::deadline).min()
    }

    /// Set the virtual deadline of every HI task to `x` times its
    /// nominal deadline.
    pub fn assign_virtual_deadlines(&mut self, x: Share) {
        for task in self.tasks.iter_mut() {
            task.scale_deadline(x);
        }
    }
}

impl FromIterator<Task> for TaskSet {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        let mut set = TaskSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Task> for TaskSet {
    fn extend<I: IntoIterator<Item = Task>>(&mut self, iter: I) {
        for task in iter {
            self.add(task);
        }
    }
}
