//! Data models for flows, plans and tasks.
//!
//! A [`Flow`] exclusively owns its [`Plan`]s and a plan exclusively owns its
//! [`Task`]s, so a whole tree is one value and one stored document. The models
//! carry no I/O: constructors mint ids and timestamps, mutators keep
//! `updated_at` monotonic, and [`status::transition`] is the pure task state
//! machine. Mutation is serialized by [`crate::service::FlowService`].
//!
//! Display implementations live in [`crate::display::models`].
//!
//! # Examples
//!
//! ```rust
//! use cairn_core::models::{CascadeRule, Flow, Plan, Task, TaskStatus};
//! use jiff::Timestamp;
//!
//! let mut flow = Flow::new("Release", Some("website".to_string()));
//! let mut plan = Plan::new("Ship it");
//! let task = Task::new("Write changelog");
//! let task_id = task.id.clone();
//! plan.tasks.insert(task_id.clone(), task);
//!
//! let now = Timestamp::now();
//! let task = plan.tasks.get_mut(&task_id).unwrap();
//! task.apply_status(TaskStatus::InProgress, now).unwrap();
//! task.apply_status(TaskStatus::Completed, now).unwrap();
//!
//! assert!(plan.reconcile(CascadeRule::CompletedOnly, now).is_some());
//! assert!(plan.completed);
//! flow.plans.insert(plan.id.clone(), plan);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod filters;
pub mod flow;
pub mod plan;
pub mod status;
pub mod summary;
pub mod task;

#[cfg(test)]
mod tests;

pub use filters::FlowFilter;
pub use flow::Flow;
pub use plan::{Completion, Plan};
pub use status::{transition, CascadeRule, TaskStatus};
pub use summary::Statistics;
pub use task::{Note, NoteKind, Task};

/// The kind of entity an id or event refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Flow,
    Plan,
    Task,
}

impl EntityKind {
    /// Prefix used for ids of this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EntityKind::Flow => "flow",
            EntityKind::Plan => "plan",
            EntityKind::Task => "task",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Flow => f.write_str("Flow"),
            EntityKind::Plan => f.write_str("Plan"),
            EntityKind::Task => f.write_str("Task"),
        }
    }
}

/// Mints a fresh, globally unique id such as `task-1f0c…`.
pub fn new_id(kind: EntityKind) -> String {
    format!("{}-{}", kind.id_prefix(), Uuid::new_v4().simple())
}
