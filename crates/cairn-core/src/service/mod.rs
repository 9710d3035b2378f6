//! The flow service: the only component that mutates flows.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │    Commands     │    │   FlowService   │    │  FlowRepository │
//! │  (envelopes)    │───▶│ (lock, cascade) │───▶│ (atomic files)  │
//! └─────────────────┘    └────────┬────────┘    └─────────────────┘
//!                                 │ reads
//!                                 ▼
//!                        ┌─────────────────┐
//!                        │   Cache<Flow>   │
//!                        │ (TTL+LRU+mtime) │
//!                        └─────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`builder`]: Factory for [`FlowService`] instances with configuration
//! - [`flow_ops`]: Flow creation, listing, archiving and deletion
//! - [`plan_ops`]: Plan creation, listing, metadata and manual completion
//! - [`task_ops`]: Task creation, status changes, reopen, move and notes
//! - [`cascade`]: Derivation of plan completion from task statuses
//!
//! ## Concurrency
//!
//! Every mutation holds one service-wide lock for its whole duration, reads
//! the flow from disk, mutates a private copy and commits it with a single
//! atomic write. A failed write therefore leaves both the document and the
//! cache as they were. Reads never take the lock: they are served from the
//! cache while the recorded mtime is current and otherwise re-read from disk.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use serde_json::Value;

use crate::{
    cache::{Cache, CacheStatistics},
    error::{FlowError, Result, ResultExt},
    events::{ActionType, EventSink},
    models::{CascadeRule, EntityKind, Flow},
    store::FlowRepository,
};

pub mod builder;
pub mod cascade;
pub mod flow_ops;
pub mod plan_ops;
pub mod task_ops;


pub use builder::FlowServiceBuilder;

/// Main service interface for managing flows, plans and tasks.
pub struct FlowService {
    pub(crate) repository: FlowRepository,
    pub(crate) cache: Cache<Flow>,
    pub(crate) cascade_rule: CascadeRule,
    pub(crate) sink: Arc<dyn EventSink>,
    write_lock: Mutex<()>,
}

/// Notifications collected during a mutation and sent once it is committed.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    events: Vec<(EntityKind, String, ActionType, Value)>,
}

impl Pending {
    pub(crate) fn push(
        &mut self,
        kind: EntityKind,
        id: impl Into<String>,
        action: ActionType,
        details: Value,
    ) {
        self.events.push((kind, id.into(), action, details));
    }
}

impl FlowService {
    pub(crate) fn new(
        repository: FlowRepository,
        cache: Cache<Flow>,
        cascade_rule: CascadeRule,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            repository,
            cache,
            cascade_rule,
            sink,
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &FlowRepository {
        &self.repository
    }

    /// The cascade rule plans are reconciled with.
    pub fn cascade_rule(&self) -> CascadeRule {
        self.cascade_rule
    }

    /// Hit, miss and eviction counters of the flow cache.
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    /// Serializes mutations. The guarded state lives on disk, so a poisoned
    /// lock is still usable.
    pub(crate) fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads a flow through the cache.
    ///
    /// The cached copy is used only while its recorded mtime is at least the
    /// document's current mtime; otherwise the document is re-read and the
    /// cache refilled.
    pub(crate) fn read_flow(&self, flow_id: &str) -> Result<Option<Flow>> {
        let generation = self.cache.generation();
        let Some(mtime) = self.repository.modified(flow_id)? else {
            self.cache.invalidate(flow_id);
            return Ok(None);
        };
        if let Some(flow) = self.cache.get_validated(flow_id, mtime) {
            debug!("Cache hit for flow '{flow_id}'");
            return Ok(Some(flow));
        }

        debug!("Cache miss for flow '{flow_id}'");
        match self.repository.load(flow_id)? {
            Some(mut flow) => {
                cascade::repair(&mut flow, self.cascade_rule);
                self.cache
                    .put_if_current(flow_id, flow.clone(), mtime, generation);
                Ok(Some(flow))
            }
            None => Ok(None),
        }
    }

    /// Reads every readable flow; unreadable documents are skipped.
    pub(crate) fn read_all(&self) -> Result<Vec<Flow>> {
        let mut flows = Vec::new();
        for id in self.repository.list_ids()? {
            match self.read_flow(&id) {
                Ok(Some(flow)) => flows.push(flow),
                Ok(None) => {}
                Err(e @ FlowError::Serialization { .. }) => {
                    warn!("Skipping unreadable flow document: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(flows)
    }

    /// Loads a flow for mutation, straight from disk, with its plans
    /// reconciled.
    ///
    /// Must be called with the write lock held.
    pub(crate) fn load_for_update(&self, flow_id: &str) -> Result<Flow> {
        Ok(self.load_repaired(flow_id)?.0)
    }

    /// Like [`Self::load_for_update`], also returning the ids of the plans
    /// whose completion disagreed with the document.
    pub(crate) fn load_repaired(&self, flow_id: &str) -> Result<(Flow, Vec<String>)> {
        let mut flow = self
            .repository
            .load(flow_id)?
            .ok_or_else(|| FlowError::unknown(EntityKind::Flow, flow_id))?;
        let repaired = cascade::repair(&mut flow, self.cascade_rule);
        Ok((flow, repaired))
    }

    /// Writes a mutated flow and drops its cache entry.
    pub(crate) fn persist(&self, flow: &Flow, operation: &str) -> Result<()> {
        self.repository
            .save(flow)
            .with_context(|| format!("{operation} on flow '{}'", flow.id))?;
        self.cache.invalidate(&flow.id);
        Ok(())
    }

    /// Sends collected notifications; only called after a successful commit.
    pub(crate) fn emit(&self, pending: Pending) {
        for (kind, id, action, details) in pending.events {
            self.sink.notify(kind, &id, action, &details);
        }
    }
}

/// Trims a required text field, rejecting blank values.
pub(crate) fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FlowError::invalid_input(field).with_reason("must not be empty"))
    } else {
        Ok(trimmed)
    }
}
