//! Command handlers: the external surface of the flow store.
//!
//! Each handler takes a [`FlowService`] and a request structure from
//! [`crate::params`], runs the operation and wraps the outcome in an
//! [`Envelope`]. Handlers never return `Err`; failures become
//! `{ok: false, error, kind}` so a dispatcher can print or forward them
//! without inspecting error types.
//!
//! ```text
//! Dispatcher → handle_* → FlowService → FlowRepository
//!                 │
//!                 └──▶ Envelope { ok, data | error + kind }
//! ```
//!
//! ```rust
//! use cairn_core::{commands, params::CreateFlow, FlowServiceBuilder};
//! # let dir = tempfile::tempdir().unwrap();
//! let service = FlowServiceBuilder::new()
//!     .with_storage_root(Some(dir.path()))
//!     .build()?;
//!
//! let created = commands::handle_create_flow(&service, &CreateFlow {
//!     name: "Release".to_string(),
//!     project: None,
//! });
//! assert!(created.ok);
//!
//! let missing = commands::handle_get_flow(&service, &cairn_core::params::FlowRef {
//!     flow_id: "flow-missing".to_string(),
//! });
//! assert_eq!(serde_json::to_value(&missing)?["kind"], "not_found");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use log::debug;
use serde::Serialize;

use crate::{
    error::{ErrorKind, FlowError, Result},
    models::{EntityKind, Flow, FlowFilter, Plan, Statistics, Task},
    params::{
        AddNote, CreateFlow, CreatePlan, CreateTask, FlowRef, ListFlows, MoveTask, PlanRef,
        TaskRef, UpdateTaskStatus,
    },
    service::FlowService,
};

/// Uniform result of every command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    pub fn failure(error: &FlowError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.to_string()),
            kind: Some(error.kind()),
        }
    }

    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(format!("{kind} with ID {id} not found")),
            kind: Some(ErrorKind::NotFound),
        }
    }

    /// Converts back into a `Result`, yielding the failure message on error.
    pub fn into_result(self) -> std::result::Result<Option<T>, String> {
        if self.ok {
            Ok(self.data)
        } else {
            Err(self.error.unwrap_or_default())
        }
    }
}

impl<T> From<Result<T>> for Envelope<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Envelope::success(data),
            Err(e) => {
                debug!("Command failed ({}): {e}", e.kind());
                Envelope::failure(&e)
            }
        }
    }
}

pub fn handle_create_flow(service: &FlowService, params: &CreateFlow) -> Envelope<Flow> {
    service
        .create_flow(&params.name, params.project.as_deref())
        .into()
}

/// Retrieves a flow; a missing flow is reported with kind `not_found`.
pub fn handle_get_flow(service: &FlowService, params: &FlowRef) -> Envelope<Flow> {
    match service.get_flow(&params.flow_id) {
        Ok(Some(flow)) => Envelope::success(flow),
        Ok(None) => Envelope::not_found(EntityKind::Flow, &params.flow_id),
        Err(e) => Envelope::failure(&e),
    }
}

pub fn handle_list_flows(service: &FlowService, params: &ListFlows) -> Envelope<Vec<Flow>> {
    let filter = FlowFilter::from(params);
    service.list_flows(Some(&filter)).into()
}

pub fn handle_delete_flow(service: &FlowService, params: &FlowRef) -> Envelope<()> {
    service.delete_flow(&params.flow_id).into()
}

/// Archives a flow. The data is `false` if it was already archived.
pub fn handle_archive_flow(service: &FlowService, params: &FlowRef) -> Envelope<bool> {
    service.archive_flow(&params.flow_id).into()
}

pub fn handle_unarchive_flow(service: &FlowService, params: &FlowRef) -> Envelope<bool> {
    service.unarchive_flow(&params.flow_id).into()
}

pub fn handle_create_plan(service: &FlowService, params: &CreatePlan) -> Envelope<Plan> {
    service.create_plan(&params.flow_id, &params.name).into()
}

pub fn handle_list_plans(service: &FlowService, params: &FlowRef) -> Envelope<Vec<Plan>> {
    service.list_plans(&params.flow_id).into()
}

/// Explicitly completes a plan. The data is `false` if it was already
/// completed.
pub fn handle_complete_plan(service: &FlowService, params: &PlanRef) -> Envelope<bool> {
    service
        .complete_plan(&params.flow_id, &params.plan_id)
        .into()
}

pub fn handle_create_task(service: &FlowService, params: &CreateTask) -> Envelope<Task> {
    service
        .create_task(&params.flow_id, &params.plan_id, &params.name)
        .into()
}

pub fn handle_list_tasks(service: &FlowService, params: &PlanRef) -> Envelope<Vec<Task>> {
    service.list_tasks(&params.flow_id, &params.plan_id).into()
}

/// Applies a status change given as text.
///
/// The data is `false` when the task already had the requested status and
/// nothing was written.
pub fn handle_update_task_status(
    service: &FlowService,
    params: &UpdateTaskStatus,
) -> Envelope<bool> {
    let result = params.parsed_status().and_then(|status| {
        service.update_task_status(
            &params.task.flow_id,
            &params.task.plan_id,
            &params.task.task_id,
            status,
        )
    });
    result.into()
}

pub fn handle_reopen_task(service: &FlowService, params: &TaskRef) -> Envelope<Task> {
    service
        .reopen_task(&params.flow_id, &params.plan_id, &params.task_id)
        .into()
}

pub fn handle_move_task(service: &FlowService, params: &MoveTask) -> Envelope<Task> {
    service
        .move_task(
            &params.task.flow_id,
            &params.task.plan_id,
            &params.task.task_id,
            &params.to_plan_id,
        )
        .into()
}

pub fn handle_add_note(service: &FlowService, params: &AddNote) -> Envelope<Task> {
    service
        .add_task_note(
            &params.task.flow_id,
            &params.task.plan_id,
            &params.task.task_id,
            &params.text,
        )
        .into()
}

pub fn handle_get_statistics(service: &FlowService) -> Envelope<Statistics> {
    service.statistics().into()
}
