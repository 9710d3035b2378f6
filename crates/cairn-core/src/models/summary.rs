//! Aggregate statistics over stored flows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Flow, TaskStatus};

/// Counts across every stored flow, archived ones included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    /// Number of flows
    pub flows: usize,
    /// Number of plans across all flows
    pub plans: usize,
    /// Number of tasks across all plans
    pub tasks: usize,
    /// Number of tasks in `completed`
    pub completed_tasks: usize,
    /// `completed_tasks / tasks`, or 0.0 with no tasks
    pub completion_rate: f64,
    /// Task counts per status
    pub tasks_by_status: BTreeMap<TaskStatus, usize>,
}

impl Statistics {
    /// Accumulate the counts of `flows`.
    pub fn from_flows<'a>(flows: impl IntoIterator<Item = &'a Flow>) -> Self {
        let mut stats = Statistics::default();
        for flow in flows {
            stats.flows += 1;
            stats.plans += flow.plans.len();
            for task in flow.plans.values().flat_map(|p| p.tasks.values()) {
                stats.tasks += 1;
                *stats.tasks_by_status.entry(task.status).or_insert(0) += 1;
            }
        }
        stats.completed_tasks = stats
            .tasks_by_status
            .get(&TaskStatus::Completed)
            .copied()
            .unwrap_or(0);
        if stats.tasks > 0 {
            stats.completion_rate = stats.completed_tasks as f64 / stats.tasks as f64;
        }
        stats
    }
}
