//! Plan model definition and related functionality.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{new_id, CascadeRule, EntityKind, Task};
use crate::error::{FlowError, Result};

/// Outcome of reconciling a plan's completed flag with its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The plan newly qualifies and was marked completed
    Completed,
    /// The plan no longer qualifies and was marked not completed
    Reopened,
}

/// A grouping of related tasks within a flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Unique identifier for the plan
    pub id: String,

    /// Name of the plan
    pub name: String,

    /// Derived from the tasks; see [`Plan::reconcile`]
    #[serde(default)]
    pub completed: bool,

    /// Set only when `completed` flips to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,

    /// Timestamp when the plan was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the plan was last modified (UTC)
    pub updated_at: Timestamp,

    /// Tasks keyed by id
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,

    /// Free-form metadata values
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Plan {
    /// Creates an empty, not completed plan with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: new_id(EntityKind::Plan),
            name: name.into(),
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
            tasks: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Advances `updated_at` to `now` without ever moving it backward.
    pub fn touch(&mut self, now: Timestamp) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Sets `updated_at`, refusing values older than the current one.
    pub fn set_updated_at(&mut self, at: Timestamp) -> Result<()> {
        if at < self.updated_at {
            return Err(FlowError::invalid_input("updated_at")
                .with_reason(format!("{at} is earlier than {}", self.updated_at)));
        }
        self.updated_at = at;
        Ok(())
    }

    /// Whether the plan has at least one task and every task qualifies under
    /// `rule`.
    pub fn qualifies(&self, rule: CascadeRule) -> bool {
        !self.tasks.is_empty() && self.tasks.values().all(|t| rule.qualifies(t.status))
    }

    /// Number of tasks that count as done under `rule`.
    pub fn qualifying_tasks(&self, rule: CascadeRule) -> usize {
        self.tasks
            .values()
            .filter(|t| rule.qualifies(t.status))
            .count()
    }

    /// Brings `completed` in line with the current tasks.
    ///
    /// Returns `None` when nothing changed, so calling this after every task
    /// mutation never produces duplicate completions or timestamp churn.
    pub fn reconcile(&mut self, rule: CascadeRule, now: Timestamp) -> Option<Completion> {
        match (self.completed, self.qualifies(rule)) {
            (false, true) => {
                self.mark_completed(now);
                Some(Completion::Completed)
            }
            (true, false) => {
                self.completed = false;
                self.completed_at = None;
                self.touch(now);
                Some(Completion::Reopened)
            }
            _ => None,
        }
    }

    /// Flips `completed` to true and stamps `completed_at`.
    pub(crate) fn mark_completed(&mut self, now: Timestamp) {
        self.completed = true;
        self.completed_at = Some(now);
        self.touch(now);
    }

    /// Looks up a task by id.
    pub fn task(&self, task_id: &str) -> Result<&Task> {
        self.tasks
            .get(task_id)
            .ok_or_else(|| FlowError::unknown(EntityKind::Task, task_id))
    }

    /// Looks up a task by id for mutation.
    pub fn task_mut(&mut self, task_id: &str) -> Result<&mut Task> {
        self.tasks
            .get_mut(task_id)
            .ok_or_else(|| FlowError::unknown(EntityKind::Task, task_id))
    }
}
