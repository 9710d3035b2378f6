//! Mutation notifications.
//!
//! The service calls [`EventSink::notify`] after every successful mutation.
//! Sinks observe; they cannot veto or fail a mutation, and the default
//! [`NoopSink`] discards everything.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::EntityKind;

/// What happened to an entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Created,
    Deleted,
    Archived,
    Unarchived,
    StatusChanged,
    Reopened,
    Moved,
    NoteAdded,
    ContextUpdated,
    MetadataUpdated,
    /// A plan completed by an explicit request
    Completed,
    /// A plan completed by the cascade after a task status change
    AutoCompleted,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Created => "created",
            ActionType::Deleted => "deleted",
            ActionType::Archived => "archived",
            ActionType::Unarchived => "unarchived",
            ActionType::StatusChanged => "status_changed",
            ActionType::Reopened => "reopened",
            ActionType::Moved => "moved",
            ActionType::NoteAdded => "note_added",
            ActionType::ContextUpdated => "context_updated",
            ActionType::MetadataUpdated => "metadata_updated",
            ActionType::Completed => "completed",
            ActionType::AutoCompleted => "auto_completed",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of mutation notifications.
pub trait EventSink: Send + Sync {
    fn notify(&self, kind: EntityKind, entity_id: &str, action: ActionType, details: &Value);
}

/// Sink that discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn notify(&self, _kind: EntityKind, _entity_id: &str, _action: ActionType, _details: &Value) {}
}

impl<F> EventSink for F
where
    F: Fn(EntityKind, &str, ActionType, &Value) + Send + Sync,
{
    fn notify(&self, kind: EntityKind, entity_id: &str, action: ActionType, details: &Value) {
        self(kind, entity_id, action, details)
    }
}

/// A notification captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub kind: EntityKind,
    pub entity_id: String,
    pub action: ActionType,
    pub details: Value,
}

/// Sink that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events for one entity and action.
    pub fn matching(&self, entity_id: &str, action: ActionType) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.entity_id == entity_id && e.action == action)
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for MemorySink {
    fn notify(&self, kind: EntityKind, entity_id: &str, action: ActionType, details: &Value) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Event {
                kind,
                entity_id: entity_id.to_string(),
                action,
                details: details.clone(),
            });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.notify(EntityKind::Flow, "flow-1", ActionType::Created, &json!({}));
        sink.notify(
            EntityKind::Plan,
            "plan-1",
            ActionType::AutoCompleted,
            &json!({"flow_id": "flow-1"}),
        );

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].action.as_str(), "auto_completed");
        assert_eq!(sink.matching("plan-1", ActionType::AutoCompleted).len(), 1);
        assert!(sink.matching("plan-1", ActionType::Completed).is_empty());

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_closure_sink() {
        let count = AtomicUsize::new(0);
        let sink = |_: EntityKind, _: &str, _: ActionType, _: &Value| {
            count.fetch_add(1, Ordering::SeqCst);
        };
        sink.notify(EntityKind::Task, "task-1", ActionType::NoteAdded, &Value::Null);
        NoopSink.notify(EntityKind::Task, "task-1", ActionType::NoteAdded, &Value::Null);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
