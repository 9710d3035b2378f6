//! Task operations for the FlowService.

use jiff::Timestamp;
use log::debug;
use serde_json::{json, Value};

use super::{cascade, required, FlowService, Pending};
use crate::{
    error::{FlowError, Result},
    events::ActionType,
    models::{EntityKind, Task, TaskStatus},
};

impl FlowService {
    /// Adds a new `todo` task to a plan.
    ///
    /// A completed plan stops being completed once it gains an unfinished
    /// task.
    pub fn create_task(&self, flow_id: &str, plan_id: &str, name: &str) -> Result<Task> {
        let name = required("name", name)?;

        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let task = Task::new(name);
        let now = task.created_at;
        let mut pending = Pending::default();

        let plan = flow.plan_mut(plan_id)?;
        plan.tasks.insert(task.id.clone(), task.clone());
        plan.touch(now);
        cascade::reconcile(plan, self.cascade_rule, flow_id, now, &mut pending);
        flow.touch(now);
        self.persist(&flow, "create_task")?;

        let mut created = Pending::default();
        created.push(
            EntityKind::Task,
            &task.id,
            ActionType::Created,
            json!({ "flow_id": flow_id, "plan_id": plan_id, "name": task.name }),
        );
        self.emit(created);
        self.emit(pending);
        Ok(task)
    }

    /// Retrieves a task, or `None` if the flow, plan or task does not exist.
    pub fn get_task(&self, flow_id: &str, plan_id: &str, task_id: &str) -> Result<Option<Task>> {
        Ok(self
            .read_flow(flow_id)?
            .and_then(|mut flow| flow.plans.remove(plan_id))
            .and_then(|mut plan| plan.tasks.remove(task_id)))
    }

    /// Lists the tasks of a plan, oldest first.
    pub fn list_tasks(&self, flow_id: &str, plan_id: &str) -> Result<Vec<Task>> {
        let mut flow = self
            .read_flow(flow_id)?
            .ok_or_else(|| FlowError::unknown(EntityKind::Flow, flow_id))?;
        let plan = flow
            .plans
            .remove(plan_id)
            .ok_or_else(|| FlowError::unknown(EntityKind::Plan, plan_id))?;
        let mut tasks: Vec<Task> = plan.tasks.into_values().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    /// Moves a task along the status state machine and reconciles its plan.
    ///
    /// Returns `false` without writing anything when the task already has
    /// `status`. The status change and any resulting plan completion are
    /// committed in one write.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidTransition` naming the rejected pair
    /// Returns `FlowError::UnknownEntity` for an unknown flow, plan or task
    pub fn update_task_status(
        &self,
        flow_id: &str,
        plan_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<bool> {
        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let now = Timestamp::now();
        let mut pending = Pending::default();

        let plan = flow.plan_mut(plan_id)?;
        let task = plan.task_mut(task_id)?;
        let from = task.status;
        if !task.apply_status(status, now)? {
            debug!("Task '{task_id}' already {status}; nothing to write");
            return Ok(false);
        }
        pending.push(
            EntityKind::Task,
            task_id,
            ActionType::StatusChanged,
            json!({ "flow_id": flow_id, "plan_id": plan_id, "from": from, "to": status }),
        );
        plan.touch(now);
        cascade::reconcile(plan, self.cascade_rule, flow_id, now, &mut pending);
        flow.touch(now);
        self.persist(&flow, "update_task_status")?;

        self.emit(pending);
        Ok(true)
    }

    /// Resets a `completed` or `skip` task to `todo`, clearing its start and
    /// completion times.
    pub fn reopen_task(&self, flow_id: &str, plan_id: &str, task_id: &str) -> Result<Task> {
        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let now = Timestamp::now();
        let mut pending = Pending::default();

        let plan = flow.plan_mut(plan_id)?;
        let task = plan.task_mut(task_id)?;
        let from = task.status;
        task.reopen(now)?;
        let task = task.clone();
        pending.push(
            EntityKind::Task,
            task_id,
            ActionType::Reopened,
            json!({ "flow_id": flow_id, "plan_id": plan_id, "from": from }),
        );
        plan.touch(now);
        cascade::reconcile(plan, self.cascade_rule, flow_id, now, &mut pending);
        flow.touch(now);
        self.persist(&flow, "reopen_task")?;

        self.emit(pending);
        Ok(task)
    }

    /// Removes a task from its plan.
    pub fn delete_task(&self, flow_id: &str, plan_id: &str, task_id: &str) -> Result<()> {
        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let now = Timestamp::now();
        let mut pending = Pending::default();

        let plan = flow.plan_mut(plan_id)?;
        plan.tasks
            .remove(task_id)
            .ok_or_else(|| FlowError::unknown(EntityKind::Task, task_id))?;
        pending.push(
            EntityKind::Task,
            task_id,
            ActionType::Deleted,
            json!({ "flow_id": flow_id, "plan_id": plan_id }),
        );
        plan.touch(now);
        cascade::reconcile(plan, self.cascade_rule, flow_id, now, &mut pending);
        flow.touch(now);
        self.persist(&flow, "delete_task")?;

        self.emit(pending);
        Ok(())
    }

    /// Moves a task to another plan of the same flow.
    ///
    /// Both plans are reconciled and the move is committed in one write.
    pub fn move_task(
        &self,
        flow_id: &str,
        from_plan_id: &str,
        task_id: &str,
        to_plan_id: &str,
    ) -> Result<Task> {
        if from_plan_id == to_plan_id {
            return Err(FlowError::invalid_input("to_plan_id")
                .with_reason("task is already in this plan"));
        }

        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let now = Timestamp::now();
        let rule = self.cascade_rule;
        let mut pending = Pending::default();

        // Check the destination before detaching anything.
        flow.plan(to_plan_id)?;
        let source = flow.plan_mut(from_plan_id)?;
        let mut task = source
            .tasks
            .remove(task_id)
            .ok_or_else(|| FlowError::unknown(EntityKind::Task, task_id))?;
        source.touch(now);
        cascade::reconcile(source, rule, flow_id, now, &mut pending);

        task.touch(now);
        let target = flow.plan_mut(to_plan_id)?;
        target.tasks.insert(task.id.clone(), task.clone());
        target.touch(now);
        pending.push(
            EntityKind::Task,
            task_id,
            ActionType::Moved,
            json!({ "flow_id": flow_id, "from_plan_id": from_plan_id, "to_plan_id": to_plan_id }),
        );
        cascade::reconcile(target, rule, flow_id, now, &mut pending);
        flow.touch(now);
        self.persist(&flow, "move_task")?;

        self.emit(pending);
        Ok(task)
    }

    /// Appends a note to a task's log.
    pub fn add_task_note(
        &self,
        flow_id: &str,
        plan_id: &str,
        task_id: &str,
        text: &str,
    ) -> Result<Task> {
        let text = required("text", text)?;
        self.edit_task(flow_id, plan_id, task_id, "add_task_note", |task, now| {
            task.add_note(text, now);
            (ActionType::NoteAdded, json!({ "text": text }))
        })
    }

    /// Sets one free-form context value on a task.
    pub fn set_task_context(
        &self,
        flow_id: &str,
        plan_id: &str,
        task_id: &str,
        key: &str,
        value: Value,
    ) -> Result<Task> {
        let key = required("key", key)?;
        self.edit_task(flow_id, plan_id, task_id, "set_task_context", |task, now| {
            task.context.insert(key.to_string(), value);
            task.touch(now);
            (ActionType::ContextUpdated, json!({ "key": key }))
        })
    }

    /// Applies an edit that does not affect the task's status.
    fn edit_task<F>(
        &self,
        flow_id: &str,
        plan_id: &str,
        task_id: &str,
        operation: &str,
        edit: F,
    ) -> Result<Task>
    where
        F: FnOnce(&mut Task, Timestamp) -> (ActionType, Value),
    {
        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        let now = Timestamp::now();

        let plan = flow.plan_mut(plan_id)?;
        let task = plan.task_mut(task_id)?;
        let (action, mut details) = edit(task, now);
        let task = task.clone();
        plan.touch(now);
        flow.touch(now);
        self.persist(&flow, operation)?;

        if let Value::Object(map) = &mut details {
            map.insert("flow_id".to_string(), json!(flow_id));
            map.insert("plan_id".to_string(), json!(plan_id));
        }
        let mut pending = Pending::default();
        pending.push(EntityKind::Task, task_id, action, details);
        self.emit(pending);
        Ok(task)
    }
}
