//! Parameter structures for flow store commands.
//!
//! Plain request structures shared by every front end. They carry no
//! framework-specific behaviour; interface layers wrap them with their own
//! derives and convert into these types. JSON schemas are available behind
//! the `schema` feature.

use std::str::FromStr;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{FlowError, Result},
    models::{FlowFilter, TaskStatus},
};

/// Identifies a flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct FlowRef {
    /// The ID of the flow to operate on
    pub flow_id: String,
}

/// Identifies a plan within a flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct PlanRef {
    pub flow_id: String,
    pub plan_id: String,
}

/// Identifies a task within a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct TaskRef {
    pub flow_id: String,
    pub plan_id: String,
    pub task_id: String,
}

/// Parameters for creating a new flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CreateFlow {
    /// Name of the flow (required)
    pub name: String,
    /// Optional project tag
    pub project: Option<String>,
}

/// Parameters for listing flows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListFlows {
    /// Case-insensitive substring of the flow name
    pub name_contains: Option<String>,
    /// Exact project tag
    pub project: Option<String>,
    /// Include archived flows alongside active ones
    #[serde(default)]
    pub include_archived: bool,
    /// Show only archived flows
    #[serde(default)]
    pub archived_only: bool,
}

impl From<&ListFlows> for FlowFilter {
    /// ```rust
    /// use cairn_core::{models::FlowFilter, params::ListFlows};
    ///
    /// let params = ListFlows { archived_only: true, ..Default::default() };
    /// let filter: FlowFilter = (&params).into();
    /// assert!(filter.archived_only);
    /// assert!(filter.include_archived);
    /// ```
    fn from(params: &ListFlows) -> Self {
        Self {
            name_contains: params.name_contains.clone(),
            project: params.project.clone(),
            include_archived: params.include_archived || params.archived_only,
            archived_only: params.archived_only,
        }
    }
}

/// Parameters for creating a new plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CreatePlan {
    /// ID of the flow to add the plan to
    pub flow_id: String,
    /// Name of the plan (required)
    pub name: String,
}

/// Parameters for creating a new task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CreateTask {
    pub flow_id: String,
    /// ID of the plan to add the task to
    pub plan_id: String,
    /// Name of the task (required)
    pub name: String,
}

/// Parameters for changing a task's status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct UpdateTaskStatus {
    #[serde(flatten)]
    pub task: TaskRef,
    /// New status: todo, planning, in_progress, reviewing, completed, skip or
    /// error
    pub status: String,
}

impl UpdateTaskStatus {
    /// Parses the requested status.
    ///
    /// # Errors
    ///
    /// * `FlowError::InvalidInput` - When the status string is not a known
    ///   status
    pub fn parsed_status(&self) -> Result<TaskStatus> {
        TaskStatus::from_str(&self.status).map_err(|_| {
            FlowError::invalid_input("status").with_reason(format!(
                "Invalid status: {}. Must be one of {}",
                self.status,
                TaskStatus::ALL
                    .iter()
                    .map(TaskStatus::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
    }
}

/// Parameters for moving a task between plans of one flow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct MoveTask {
    #[serde(flatten)]
    pub task: TaskRef,
    /// Plan receiving the task
    pub to_plan_id: String,
}

/// Parameters for appending a note to a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct AddNote {
    #[serde(flatten)]
    pub task: TaskRef,
    /// Note text (required)
    pub text: String,
}
