#[cfg(test)]
mod model_tests {
    use std::str::FromStr;

    use jiff::{Timestamp, ToSpan};

    use crate::{
        error::FlowError,
        models::{
            new_id, transition, CascadeRule, Completion, EntityKind, Flow, FlowFilter, NoteKind,
            Plan, Statistics, Task, TaskStatus,
        },
    };

    fn ts(second: i64) -> Timestamp {
        Timestamp::from_second(second).unwrap()
    }

    fn create_test_task(status: TaskStatus) -> Task {
        let mut task = Task::new("Test Task");
        task.status = status;
        task.created_at = ts(1640995200); // 2022-01-01 00:00:00 UTC
        task.updated_at = ts(1640995200);
        task
    }

    fn plan_with(statuses: &[TaskStatus]) -> Plan {
        let mut plan = Plan::new("Test Plan");
        for status in statuses {
            let task = create_test_task(*status);
            plan.tasks.insert(task.id.clone(), task);
        }
        plan
    }

    #[test]
    fn test_ids_are_prefixed_and_unique() {
        let a = new_id(EntityKind::Flow);
        let b = new_id(EntityKind::Flow);
        assert!(a.starts_with("flow-"));
        assert_ne!(a, b);
        assert!(Task::new("x").id.starts_with("task-"));
        assert!(Plan::new("x").id.starts_with("plan-"));
    }

    #[test]
    fn test_new_entities_have_consistent_timestamps() {
        let flow = Flow::new("Flow", None);
        assert_eq!(flow.created_at, flow.updated_at);
        assert!(!flow.archived);
        assert!(flow.plans.is_empty());

        let task = Task::new("Task");
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_transition_table() {
        use TaskStatus::*;
        let valid = [
            (Todo, Planning),
            (Todo, InProgress),
            (Todo, Skip),
            (Todo, Error),
            (Planning, InProgress),
            (Planning, Todo),
            (Planning, Error),
            (InProgress, Reviewing),
            (InProgress, Completed),
            (InProgress, Error),
            (InProgress, Todo),
            (Reviewing, Completed),
            (Reviewing, InProgress),
            (Error, Todo),
            (Error, InProgress),
        ];
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                let expected = valid.contains(&(from, to));
                assert_eq!(
                    transition(from, to).is_ok(),
                    expected,
                    "{from} -> {to} should be {}",
                    if expected { "allowed" } else { "rejected" }
                );
            }
        }
    }

    #[test]
    fn test_completed_to_in_progress_is_rejected() {
        let err = transition(TaskStatus::Completed, TaskStatus::InProgress).unwrap_err();
        match err {
            FlowError::InvalidTransition { from, to } => {
                assert_eq!(from, TaskStatus::Completed);
                assert_eq!(to, TaskStatus::InProgress);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_apply_status_sets_timestamps_once() {
        let mut task = create_test_task(TaskStatus::Todo);
        let t1 = ts(1641000000);
        let t2 = ts(1641100000);
        let t3 = ts(1641200000);

        assert!(task.apply_status(TaskStatus::InProgress, t1).unwrap());
        assert_eq!(task.started_at, Some(t1));

        task.apply_status(TaskStatus::Todo, t2).unwrap();
        task.apply_status(TaskStatus::InProgress, t2).unwrap();
        assert_eq!(task.started_at, Some(t1), "started_at is set only once");

        task.apply_status(TaskStatus::Completed, t3).unwrap();
        assert_eq!(task.completed_at, Some(t3));
        assert_eq!(task.updated_at, t3);
        assert_eq!(task.notes.len(), 4);
        assert!(task.notes.iter().all(|n| n.kind == NoteKind::Action));
        assert_eq!(task.notes[3].text, "in_progress -> completed");
    }

    #[test]
    fn test_apply_same_status_is_noop() {
        let mut task = create_test_task(TaskStatus::Completed);
        let before = task.clone();
        assert!(!task.apply_status(TaskStatus::Completed, ts(1642000000)).unwrap());
        assert_eq!(task, before);
    }

    #[test]
    fn test_rejected_transition_leaves_task_unchanged() {
        let mut task = create_test_task(TaskStatus::Skip);
        let before = task.clone();
        assert!(task.apply_status(TaskStatus::InProgress, ts(1642000000)).is_err());
        assert_eq!(task, before);
    }

    #[test]
    fn test_reopen() {
        let mut task = create_test_task(TaskStatus::Todo);
        task.apply_status(TaskStatus::InProgress, ts(1641000000)).unwrap();
        task.apply_status(TaskStatus::Completed, ts(1641100000)).unwrap();

        task.reopen(ts(1641200000)).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.started_at.is_none());
        assert!(task.completed_at.is_none());

        assert!(task.reopen(ts(1641300000)).is_err(), "todo cannot be reopened");
    }

    #[test]
    fn test_updated_at_never_moves_backward() {
        let mut task = create_test_task(TaskStatus::Todo);
        task.touch(ts(1600000000));
        assert_eq!(task.updated_at, ts(1640995200));

        assert!(task.set_updated_at(ts(1600000000)).is_err());
        assert!(task.set_updated_at(ts(1641000000)).is_ok());

        let mut flow = Flow::new("Flow", None);
        let earlier = flow.updated_at.checked_sub(1.hour()).unwrap();
        assert!(flow.set_updated_at(earlier).is_err());
        let mut plan = Plan::new("Plan");
        plan.touch(earlier);
        assert!(plan.updated_at >= plan.created_at);
    }

    #[test]
    fn test_cascade_rules() {
        assert!(CascadeRule::CompletedOnly.qualifies(TaskStatus::Completed));
        assert!(!CascadeRule::CompletedOnly.qualifies(TaskStatus::Reviewing));
        assert!(CascadeRule::CompletedOrReviewing.qualifies(TaskStatus::Reviewing));
        for rule in [CascadeRule::CompletedOnly, CascadeRule::CompletedOrReviewing] {
            assert!(!rule.qualifies(TaskStatus::Skip));
            assert!(!rule.qualifies(TaskStatus::Todo));
            assert!(!rule.qualifies(TaskStatus::InProgress));
        }
    }

    #[test]
    fn test_empty_plan_never_qualifies() {
        let mut plan = plan_with(&[]);
        assert!(!plan.qualifies(CascadeRule::CompletedOnly));
        assert_eq!(plan.reconcile(CascadeRule::CompletedOnly, ts(1641000000)), None);
        assert!(!plan.completed);
    }

    #[test]
    fn test_reconcile_completes_and_reopens() {
        let now = ts(1641000000);
        let mut plan = plan_with(&[TaskStatus::Completed, TaskStatus::Reviewing]);

        assert_eq!(plan.reconcile(CascadeRule::CompletedOnly, now), None);
        assert_eq!(
            plan.reconcile(CascadeRule::CompletedOrReviewing, now),
            Some(Completion::Completed)
        );
        assert!(plan.completed);
        assert_eq!(plan.completed_at, Some(now));

        // Redundant reconcile does not churn completed_at
        let later = ts(1641500000);
        assert_eq!(plan.reconcile(CascadeRule::CompletedOrReviewing, later), None);
        assert_eq!(plan.completed_at, Some(now));

        let task = create_test_task(TaskStatus::Todo);
        plan.tasks.insert(task.id.clone(), task);
        assert_eq!(
            plan.reconcile(CascadeRule::CompletedOrReviewing, later),
            Some(Completion::Reopened)
        );
        assert!(!plan.completed);
        assert!(plan.completed_at.is_none());
    }

    #[test]
    fn test_lookup_unknown_ids() {
        let flow = Flow::new("Flow", None);
        assert!(matches!(
            flow.plan("plan-missing"),
            Err(FlowError::UnknownEntity {
                kind: EntityKind::Plan,
                ..
            })
        ));
        let plan = Plan::new("Plan");
        assert!(plan.task("task-missing").is_err());
    }

    #[test]
    fn test_task_status_from_str() {
        assert_eq!(TaskStatus::from_str("in_progress"), Ok(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_str("InProgress"), Ok(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_str("SKIP"), Ok(TaskStatus::Skip));
        assert!(TaskStatus::from_str("done").is_err());
    }

    #[test]
    fn test_task_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: TaskStatus = serde_json::from_str("\"reviewing\"").unwrap();
        assert_eq!(back, TaskStatus::Reviewing);
    }

    #[test]
    fn test_flow_serialization_shape() {
        let mut flow = Flow::new("Flow", Some("proj".to_string()));
        let mut plan = plan_with(&[TaskStatus::Todo]);
        plan.metadata
            .insert("owner".to_string(), serde_json::json!("alice"));
        flow.plans.insert(plan.id.clone(), plan.clone());

        let value = serde_json::to_value(&flow).unwrap();
        assert_eq!(value["project"], "proj");
        assert_eq!(value["archived"], false);
        let stored_plan = &value["plans"][&plan.id];
        assert_eq!(stored_plan["completed"], false);
        assert!(stored_plan.get("completed_at").is_none());
        assert_eq!(stored_plan["metadata"]["owner"], "alice");
        let task_id = plan.tasks.keys().next().unwrap();
        assert_eq!(stored_plan["tasks"][task_id]["status"], "todo");
        assert!(value["created_at"].as_str().unwrap().ends_with('Z'));

        let back: Flow = serde_json::from_value(value).unwrap();
        assert_eq!(back, flow);
    }

    #[test]
    fn test_flow_filter() {
        let mut active = Flow::new("Website Relaunch", Some("web".to_string()));
        let mut archived = Flow::new("Old Website", Some("web".to_string()));
        archived.archived = true;

        assert!(FlowFilter::default().matches(&active));
        assert!(!FlowFilter::default().matches(&archived));
        assert!(FlowFilter::archived().matches(&archived));
        assert!(!FlowFilter::archived().matches(&active));

        let filter = FlowFilter {
            name_contains: Some("relaunch".to_string()),
            include_archived: true,
            ..Default::default()
        };
        assert!(filter.matches(&active));
        assert!(!filter.matches(&archived));

        active.project = Some("mobile".to_string());
        assert!(!FlowFilter::for_project("web").matches(&active));
    }

    #[test]
    fn test_statistics() {
        let mut flow = Flow::new("Flow", None);
        let plan = plan_with(&[TaskStatus::Completed, TaskStatus::Todo, TaskStatus::Completed]);
        flow.plans.insert(plan.id.clone(), plan);
        let empty = Flow::new("Empty", None);

        let stats = Statistics::from_flows([&flow, &empty]);
        assert_eq!(stats.flows, 2);
        assert_eq!(stats.plans, 1);
        assert_eq!(stats.tasks, 3);
        assert_eq!(stats.completed_tasks, 2);
        assert!((stats.completion_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.tasks_by_status.get(&TaskStatus::Todo), Some(&1));

        let none = Statistics::from_flows(std::iter::empty());
        assert_eq!(none.completion_rate, 0.0);
    }
}
