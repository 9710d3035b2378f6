//! Plan operations for the FlowService.

use jiff::Timestamp;
use serde_json::{json, Value};

use super::{required, FlowService, Pending};
use crate::{
    error::{FlowError, Result},
    events::ActionType,
    models::{EntityKind, Plan},
};

impl FlowService {
    /// Adds a new, empty plan to a flow.
    pub fn create_plan(&self, flow_id: &str, name: &str) -> Result<Plan> {
        let name = required("name", name)?;

        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let plan = Plan::new(name);
        flow.plans.insert(plan.id.clone(), plan.clone());
        flow.touch(plan.created_at);
        self.persist(&flow, "create_plan")?;

        let mut pending = Pending::default();
        pending.push(
            EntityKind::Plan,
            &plan.id,
            ActionType::Created,
            json!({ "flow_id": flow_id, "name": plan.name }),
        );
        self.emit(pending);
        Ok(plan)
    }

    /// Retrieves a plan, or `None` if the flow or plan does not exist.
    pub fn get_plan(&self, flow_id: &str, plan_id: &str) -> Result<Option<Plan>> {
        Ok(self
            .read_flow(flow_id)?
            .and_then(|mut flow| flow.plans.remove(plan_id)))
    }

    /// Lists the plans of a flow, oldest first.
    pub fn list_plans(&self, flow_id: &str) -> Result<Vec<Plan>> {
        let flow = self
            .read_flow(flow_id)?
            .ok_or_else(|| FlowError::unknown(EntityKind::Flow, flow_id))?;
        let mut plans: Vec<Plan> = flow.plans.into_values().collect();
        plans.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(plans)
    }

    /// Removes a plan and all of its tasks.
    pub fn delete_plan(&self, flow_id: &str, plan_id: &str) -> Result<()> {
        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let plan = flow
            .plans
            .remove(plan_id)
            .ok_or_else(|| FlowError::unknown(EntityKind::Plan, plan_id))?;
        flow.touch(Timestamp::now());
        self.persist(&flow, "delete_plan")?;

        let mut pending = Pending::default();
        pending.push(
            EntityKind::Plan,
            plan_id,
            ActionType::Deleted,
            json!({ "flow_id": flow_id, "tasks": plan.tasks.len() }),
        );
        self.emit(pending);
        Ok(())
    }

    /// Sets one free-form metadata value on a plan.
    pub fn set_plan_metadata(
        &self,
        flow_id: &str,
        plan_id: &str,
        key: &str,
        value: Value,
    ) -> Result<Plan> {
        let key = required("key", key)?;

        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let now = Timestamp::now();
        let plan = flow.plan_mut(plan_id)?;
        plan.metadata.insert(key.to_string(), value);
        plan.touch(now);
        let plan = plan.clone();
        flow.touch(now);
        self.persist(&flow, "set_plan_metadata")?;

        let mut pending = Pending::default();
        pending.push(
            EntityKind::Plan,
            plan_id,
            ActionType::MetadataUpdated,
            json!({ "flow_id": flow_id, "key": key }),
        );
        self.emit(pending);
        Ok(plan)
    }

    /// Explicitly completes a plan whose tasks all qualify.
    ///
    /// The cascade normally completes such a plan on its own, so this only
    /// writes when the stored document still records the plan as open. It
    /// returns `false` if the document already had it completed. Unlike the
    /// cascade, this reports a `completed` action.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidInput` if the plan has no tasks or a task
    /// does not qualify under the cascade rule.
    pub fn complete_plan(&self, flow_id: &str, plan_id: &str) -> Result<bool> {
        let _guard = self.lock_writes();
        let (mut flow, repaired) = self.load_repaired(flow_id)?;
        let now = Timestamp::now();
        let rule = self.cascade_rule;
        let plan = flow.plan_mut(plan_id)?;
        // Loaded plans are reconciled: completed iff every task qualifies.
        if !plan.completed {
            let blocking = plan.tasks.len() - plan.qualifying_tasks(rule);
            return Err(FlowError::invalid_input("plan_id").with_reason(if plan.tasks.is_empty() {
                format!("plan {plan_id} has no tasks")
            } else {
                format!("plan {plan_id} has {blocking} unfinished task(s)")
            }));
        }
        if !repaired.iter().any(|id| id == plan_id) {
            return Ok(false);
        }
        let completed_at = plan.completed_at;
        flow.touch(now);
        self.persist(&flow, "complete_plan")?;

        let mut pending = Pending::default();
        pending.push(
            EntityKind::Plan,
            plan_id,
            ActionType::Completed,
            json!({ "flow_id": flow_id, "completed_at": completed_at }),
        );
        self.emit(pending);
        Ok(true)
    }
}
