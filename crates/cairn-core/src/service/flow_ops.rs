//! Flow operations for the FlowService.

use jiff::Timestamp;
use log::{debug, info};
use serde_json::json;

use super::{cascade, required, FlowService, Pending};
use crate::{
    error::{Result, ResultExt},
    events::ActionType,
    models::{EntityKind, Flow, FlowFilter, Statistics},
};

/// Name given to the flow created on first access to an empty storage root.
pub const DEFAULT_FLOW_NAME: &str = "default";

impl FlowService {
    /// Creates, persists and caches a new flow.
    pub fn create_flow(&self, name: &str, project: Option<&str>) -> Result<Flow> {
        let name = required("name", name)?;
        let project = project.map(str::trim).filter(|p| !p.is_empty());

        let _guard = self.lock_writes();
        self.create_flow_locked(name, project)
    }

    /// Creates a flow; the caller holds the write lock.
    fn create_flow_locked(&self, name: &str, project: Option<&str>) -> Result<Flow> {
        let flow = Flow::new(name, project.map(str::to_string));
        self.persist(&flow, "create_flow")?;
        self.cache_committed(&flow);

        info!("Created flow '{}' ({})", flow.name, flow.id);
        let mut pending = Pending::default();
        pending.push(
            EntityKind::Flow,
            &flow.id,
            ActionType::Created,
            json!({ "name": flow.name, "project": flow.project }),
        );
        self.emit(pending);
        Ok(flow)
    }

    /// Caches a flow that was just written.
    ///
    /// The document is already committed, so a failed stat only skips the
    /// cache fill.
    pub(crate) fn cache_committed(&self, flow: &Flow) {
        match self.repository.modified(&flow.id) {
            Ok(Some(mtime)) => self.cache.put(&flow.id, flow.clone(), mtime),
            Ok(None) => debug!("Flow '{}' vanished before caching", flow.id),
            Err(e) => debug!("Not caching flow '{}': {e}", flow.id),
        }
    }

    /// Retrieves a flow by id, or `None` if it does not exist.
    pub fn get_flow(&self, flow_id: &str) -> Result<Option<Flow>> {
        self.read_flow(flow_id)
    }

    /// Lists the flows matching `filter`, oldest first.
    ///
    /// Documents that fail to parse are skipped with a warning.
    pub fn list_flows(&self, filter: Option<&FlowFilter>) -> Result<Vec<Flow>> {
        let default_filter = FlowFilter::default();
        let filter = filter.unwrap_or(&default_filter);
        let mut flows: Vec<Flow> = self
            .read_all()?
            .into_iter()
            .filter(|flow| filter.matches(flow))
            .collect();
        flows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(flows)
    }

    /// Archives a flow, hiding it from default listings.
    ///
    /// Returns `false` if the flow was already archived.
    pub fn archive_flow(&self, flow_id: &str) -> Result<bool> {
        self.set_archived(flow_id, true)
    }

    /// Restores an archived flow.
    ///
    /// Returns `false` if the flow was not archived.
    pub fn unarchive_flow(&self, flow_id: &str) -> Result<bool> {
        self.set_archived(flow_id, false)
    }

    fn set_archived(&self, flow_id: &str, archived: bool) -> Result<bool> {
        let _guard = self.lock_writes();
        let mut flow = self.load_for_update(flow_id)?;
        if flow.archived == archived {
            return Ok(false);
        }
        flow.archived = archived;
        flow.touch(Timestamp::now());
        let operation = if archived { "archive_flow" } else { "unarchive_flow" };
        self.persist(&flow, operation)?;

        let action = if archived {
            ActionType::Archived
        } else {
            ActionType::Unarchived
        };
        let mut pending = Pending::default();
        pending.push(EntityKind::Flow, flow_id, action, json!({}));
        self.emit(pending);
        Ok(true)
    }

    /// Deletes a flow document together with every plan and task in it.
    pub fn delete_flow(&self, flow_id: &str) -> Result<()> {
        let _guard = self.lock_writes();
        let flow = self.load_for_update(flow_id)?;
        self.repository
            .delete(flow_id)
            .with_context(|| format!("delete_flow on flow '{flow_id}'"))?;
        self.cache.invalidate(flow_id);

        info!("Deleted flow '{}' ({flow_id})", flow.name);
        let mut pending = Pending::default();
        pending.push(
            EntityKind::Flow,
            flow_id,
            ActionType::Deleted,
            json!({ "plans": flow.plans.len(), "tasks": flow.task_count() }),
        );
        self.emit(pending);
        Ok(())
    }

    /// Returns the most recently updated active flow, creating a flow named
    /// [`DEFAULT_FLOW_NAME`] when the storage root holds none.
    pub fn open_default_flow(&self) -> Result<Flow> {
        let _guard = self.lock_writes();
        let latest = self
            .list_flows(None)?
            .into_iter()
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at));
        match latest {
            Some(flow) => Ok(flow),
            None => self.create_flow_locked(DEFAULT_FLOW_NAME, None),
        }
    }

    /// Aggregate counts over every stored flow, archived ones included.
    pub fn statistics(&self) -> Result<Statistics> {
        let flows = self.read_all()?;
        Ok(Statistics::from_flows(&flows))
    }

    /// Rewrites every readable document in the current format, with plan
    /// completion reconciled.
    ///
    /// Returns the number of documents written.
    pub fn upgrade_storage(&self) -> Result<usize> {
        let _guard = self.lock_writes();
        let mut flows = self.repository.load_all()?;
        for flow in flows.values_mut() {
            cascade::repair(flow, self.cascade_rule);
        }
        self.repository
            .save_all(&flows)
            .context("upgrade_storage")?;
        self.cache.invalidate_all();
        info!("Rewrote {} flow documents", flows.len());
        Ok(flows.len())
    }
}
