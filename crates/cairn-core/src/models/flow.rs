//! Flow model definition and related functionality.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{new_id, EntityKind, Plan};
use crate::error::{FlowError, Result};

/// Top-level container owning a set of plans; persisted as one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flow {
    /// Unique identifier for the flow, also the document file stem
    pub id: String,

    /// Name of the flow
    pub name: String,

    /// Optional project tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Timestamp when the flow was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the flow was last modified (UTC)
    pub updated_at: Timestamp,

    /// Archived flows are hidden from default listings
    #[serde(default)]
    pub archived: bool,

    /// Plans keyed by id
    #[serde(default)]
    pub plans: BTreeMap<String, Plan>,
}

impl Flow {
    /// Creates an empty, active flow with a fresh id.
    pub fn new(name: impl Into<String>, project: Option<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id: new_id(EntityKind::Flow),
            name: name.into(),
            project,
            created_at: now,
            updated_at: now,
            archived: false,
            plans: BTreeMap::new(),
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

    /// Looks up a plan by id.
    pub fn plan(&self, plan_id: &str) -> Result<&Plan> {
        self.plans
            .get(plan_id)
            .ok_or_else(|| FlowError::unknown(EntityKind::Plan, plan_id))
    }

    /// Looks up a plan by id for mutation.
    pub fn plan_mut(&mut self, plan_id: &str) -> Result<&mut Plan> {
        self.plans
            .get_mut(plan_id)
            .ok_or_else(|| FlowError::unknown(EntityKind::Plan, plan_id))
    }

    /// Total number of tasks across all plans.
    pub fn task_count(&self) -> usize {
        self.plans.values().map(|p| p.tasks.len()).sum()
    }
}
