//! Plan completion derived from task statuses.
//!
//! After any change to a plan's tasks the plan is reconciled with the
//! service's [`CascadeRule`]: it becomes completed when it has at least one
//! task and every task qualifies, and stops being completed as soon as one
//! does not. Reconciling an already consistent plan does nothing, so the
//! check runs after every change rather than only after the "last" one.

use jiff::Timestamp;
use log::info;
use serde_json::json;

use super::Pending;
use crate::{
    events::ActionType,
    models::{CascadeRule, Completion, EntityKind, Flow, Plan},
};

/// Reconciles every plan of a flow read from storage.
///
/// Documents written by older releases or under another rule can disagree
/// with their tasks. They are corrected in memory, stamped with the flow's
/// `updated_at`, and no notification is sent. Returns the ids of the plans
/// that changed.
pub(crate) fn repair(flow: &mut Flow, rule: CascadeRule) -> Vec<String> {
    let now = flow.updated_at;
    let repaired: Vec<String> = flow
        .plans
        .values_mut()
        .filter_map(|plan| plan.reconcile(rule, now).map(|_| plan.id.clone()))
        .collect();
    if !repaired.is_empty() {
        info!(
            "Reconciled {} plan(s) of flow '{}' on load",
            repaired.len(),
            flow.id
        );
    }
    repaired
}

/// Reconciles `plan` and queues the matching notification.
///
/// A cascade completion is reported as `auto_completed`, distinct from the
/// `completed` action of an explicit request.
pub(crate) fn reconcile(
    plan: &mut Plan,
    rule: CascadeRule,
    flow_id: &str,
    now: Timestamp,
    pending: &mut Pending,
) -> Option<Completion> {
    let outcome = plan.reconcile(rule, now)?;
    match outcome {
        Completion::Completed => {
            info!("Plan '{}' auto-completed in flow '{flow_id}'", plan.id);
            pending.push(
                EntityKind::Plan,
                &plan.id,
                ActionType::AutoCompleted,
                json!({
                    "flow_id": flow_id,
                    "tasks": plan.tasks.len(),
                    "completed_at": plan.completed_at,
                }),
            );
        }
        Completion::Reopened => {
            info!("Plan '{}' no longer complete in flow '{flow_id}'", plan.id);
            pending.push(
                EntityKind::Plan,
                &plan.id,
                ActionType::Reopened,
                json!({
                    "flow_id": flow_id,
                    "qualifying": plan.qualifying_tasks(rule),
                    "tasks": plan.tasks.len(),
                }),
            );
        }
    }
    Some(outcome)
}
