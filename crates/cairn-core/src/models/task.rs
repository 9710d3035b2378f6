//! Task model definition and related functionality.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{new_id, status::transition, EntityKind, TaskStatus};
use crate::error::{FlowError, Result};

/// Kind of entry in a task's note log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// Free-form note written by the user
    Note,
    /// Entry recorded by the service for a status change
    Action,
}

/// An entry in the append-only note log of a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    /// When the entry was recorded (UTC)
    pub at: Timestamp,
    /// Whether the entry is a user note or a recorded action
    pub kind: NoteKind,
    /// Entry text
    pub text: String,
}

/// A single unit of trackable work within a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier for the task
    pub id: String,

    /// Name of the task
    pub name: String,

    /// Current status of the task
    pub status: TaskStatus,

    /// Timestamp when the task was created (UTC)
    pub created_at: Timestamp,

    /// Set on the first transition into `in_progress`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,

    /// Set on the transition into `completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,

    /// Timestamp when the task was last modified (UTC)
    pub updated_at: Timestamp,

    /// Free-form context values
    #[serde(default)]
    pub context: BTreeMap<String, Value>,

    /// Append-only action and note log
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Task {
    /// Creates a `todo` task with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: new_id(EntityKind::Task),
            name: name.into(),
            status: TaskStatus::Todo,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
            context: BTreeMap::new(),
            notes: Vec::new(),
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

    /// Applies a status change through the state machine.
    ///
    /// Returns `Ok(false)` when `requested` equals the current status. The
    /// first entry into `in_progress` sets `started_at`; entry into
    /// `completed` sets `completed_at`. Every applied change is appended to
    /// the note log.
    pub fn apply_status(&mut self, requested: TaskStatus, now: Timestamp) -> Result<bool> {
        if self.status == requested {
            return Ok(false);
        }
        let previous = self.status;
        self.status = transition(previous, requested)?;

        if self.status == TaskStatus::InProgress && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        if self.status == TaskStatus::Completed {
            self.completed_at = Some(now);
        }
        self.record(NoteKind::Action, format!("{previous} -> {}", self.status), now);
        Ok(true)
    }

    /// Resets a `completed` or `skip` task back to `todo`.
    pub fn reopen(&mut self, now: Timestamp) -> Result<()> {
        if !self.status.is_reopenable() {
            return Err(FlowError::InvalidTransition {
                from: self.status,
                to: TaskStatus::Todo,
            });
        }
        let previous = self.status;
        self.status = TaskStatus::Todo;
        self.started_at = None;
        self.completed_at = None;
        self.record(NoteKind::Action, format!("reopened from {previous}"), now);
        Ok(())
    }

    /// Appends a user note.
    pub fn add_note(&mut self, text: impl Into<String>, now: Timestamp) {
        self.record(NoteKind::Note, text.into(), now);
    }

    fn record(&mut self, kind: NoteKind, text: String, now: Timestamp) {
        self.notes.push(Note { at: now, kind, text });
        self.touch(now);
    }
}
