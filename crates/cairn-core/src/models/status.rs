//! Task status enumeration, the status state machine and the cascade rule.

use std::str::FromStr;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

/// Type-safe enumeration of task statuses.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has not been started
    #[default]
    Todo,

    /// Task is being broken down before work starts
    Planning,

    /// Task is being worked on
    InProgress,

    /// Work is done and awaiting review
    Reviewing,

    /// Task has been completed
    Completed,

    /// Task was deliberately skipped
    Skip,

    /// Task failed; recoverable back to todo or in_progress
    Error,
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "planning" => Ok(TaskStatus::Planning),
            "in_progress" | "inprogress" | "in-progress" => Ok(TaskStatus::InProgress),
            "reviewing" => Ok(TaskStatus::Reviewing),
            "completed" => Ok(TaskStatus::Completed),
            "skip" => Ok(TaskStatus::Skip),
            "error" => Ok(TaskStatus::Error),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

impl TaskStatus {
    /// Every status, in state machine order.
    pub const ALL: [TaskStatus; 7] = [
        TaskStatus::Todo,
        TaskStatus::Planning,
        TaskStatus::InProgress,
        TaskStatus::Reviewing,
        TaskStatus::Completed,
        TaskStatus::Skip,
        TaskStatus::Error,
    ];

    /// Stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Planning => "planning",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Reviewing => "reviewing",
            TaskStatus::Completed => "completed",
            TaskStatus::Skip => "skip",
            TaskStatus::Error => "error",
        }
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// ```rust
    /// use cairn_core::models::TaskStatus;
    ///
    /// assert_eq!(TaskStatus::Completed.with_icon(), "✓ Completed");
    /// assert_eq!(TaskStatus::InProgress.with_icon(), "➤ In Progress");
    /// assert_eq!(TaskStatus::Todo.with_icon(), "○ Todo");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "○ Todo",
            TaskStatus::Planning => "✎ Planning",
            TaskStatus::InProgress => "➤ In Progress",
            TaskStatus::Reviewing => "◎ Reviewing",
            TaskStatus::Completed => "✓ Completed",
            TaskStatus::Skip => "↷ Skip",
            TaskStatus::Error => "✗ Error",
        }
    }

    /// Statuses reachable from `self` by an ordinary status update.
    ///
    /// `completed` and `skip` have no outgoing edges; they only leave through
    /// an explicit reopen.
    pub fn allowed_transitions(&self) -> &'static [TaskStatus] {
        use TaskStatus::*;
        match self {
            Todo => &[Planning, InProgress, Skip, Error],
            Planning => &[InProgress, Todo, Error],
            InProgress => &[Reviewing, Completed, Error, Todo],
            Reviewing => &[Completed, InProgress],
            Error => &[Todo, InProgress],
            Completed | Skip => &[],
        }
    }

    /// Whether `self -> to` is an edge of the state machine.
    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Whether the task can be reopened back to `todo`.
    pub fn is_reopenable(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Skip)
    }
}

/// Resolves a requested status change against the state machine.
///
/// Returns the new status, or `InvalidTransition` naming the rejected pair.
/// Requesting the current status is not an edge; callers treat that case as a
/// no-op before consulting this function.
pub fn transition(current: TaskStatus, requested: TaskStatus) -> Result<TaskStatus> {
    if current.can_transition_to(requested) {
        Ok(requested)
    } else {
        Err(FlowError::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

/// Which task statuses count toward automatic plan completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CascadeRule {
    /// Only `completed` qualifies
    #[default]
    CompletedOnly,

    /// `completed` and `reviewing` both qualify
    CompletedOrReviewing,
}

impl CascadeRule {
    /// Whether a task in `status` counts as done for its plan.
    pub fn qualifies(&self, status: TaskStatus) -> bool {
        match self {
            CascadeRule::CompletedOnly => status == TaskStatus::Completed,
            CascadeRule::CompletedOrReviewing => {
                matches!(status, TaskStatus::Completed | TaskStatus::Reviewing)
            }
        }
    }
}
