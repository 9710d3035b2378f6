//! One-shot upgrade of older on-disk document shapes.
//!
//! Documents written by earlier releases stored plans and tasks as arrays,
//! used `title` instead of `name`, spelled statuses differently and omitted
//! fields that are now required. [`upgrade`] rewrites such a raw JSON value
//! into the current shape before it is deserialized, so the typed models
//! never see a legacy variant.

use serde_json::{Map, Value};

/// Upgrades a raw flow document in place.
///
/// `file_id` is the id taken from the file name and is used when the
/// document has none. Returns whether anything was changed.
pub fn upgrade(doc: &mut Value, file_id: &str) -> bool {
    let Some(flow) = doc.as_object_mut() else {
        return false;
    };
    let mut changed = false;

    if !flow.contains_key("id") {
        flow.insert("id".to_string(), Value::String(file_id.to_string()));
        changed = true;
    }
    changed |= upgrade_entity(flow);
    changed |= default_field(flow, "archived", Value::Bool(false));
    changed |= keyed_by_id(flow, "plans");

    if let Some(Value::Object(plans)) = flow.get_mut("plans") {
        for plan in plans.values_mut().filter_map(Value::as_object_mut) {
            changed |= upgrade_plan(plan);
        }
    }
    changed
}

fn upgrade_plan(plan: &mut Map<String, Value>) -> bool {
    let mut changed = upgrade_entity(plan);
    changed |= default_field(plan, "completed", Value::Bool(false));
    changed |= default_field(plan, "metadata", Value::Object(Map::new()));
    changed |= keyed_by_id(plan, "tasks");

    if let Some(Value::Object(tasks)) = plan.get_mut("tasks") {
        for task in tasks.values_mut().filter_map(Value::as_object_mut) {
            changed |= upgrade_task(task);
        }
    }
    changed
}

fn upgrade_task(task: &mut Map<String, Value>) -> bool {
    let mut changed = upgrade_entity(task);
    changed |= default_field(task, "status", Value::String("todo".to_string()));
    changed |= default_field(task, "context", Value::Object(Map::new()));
    changed |= default_field(task, "notes", Value::Array(Vec::new()));

    if let Some(Value::String(status)) = task.get_mut("status") {
        if let Some(current) = legacy_status(status) {
            *status = current.to_string();
            changed = true;
        }
    }

    let fallback_at = task.get("updated_at").cloned();
    if let Some(Value::Array(notes)) = task.get_mut("notes") {
        for note in notes.iter_mut() {
            if let Value::String(text) = note {
                let mut entry = Map::new();
                entry.insert("at".to_string(), fallback_at.clone().unwrap_or(Value::Null));
                entry.insert("kind".to_string(), Value::String("note".to_string()));
                entry.insert("text".to_string(), Value::String(std::mem::take(text)));
                *note = Value::Object(entry);
                changed = true;
            }
        }
    }
    changed
}

/// Fields shared by every entity: `title` becomes `name`, and a missing
/// `updated_at` is taken from `created_at`.
fn upgrade_entity(entity: &mut Map<String, Value>) -> bool {
    let mut changed = false;
    if !entity.contains_key("name") {
        if let Some(title) = entity.remove("title") {
            entity.insert("name".to_string(), title);
            changed = true;
        }
    }
    if !entity.contains_key("updated_at") {
        if let Some(created) = entity.get("created_at").cloned() {
            entity.insert("updated_at".to_string(), created);
            changed = true;
        }
    }
    changed
}

fn default_field(entity: &mut Map<String, Value>, key: &str, value: Value) -> bool {
    if matches!(entity.get(key), None | Some(Value::Null)) {
        entity.insert(key.to_string(), value);
        true
    } else {
        false
    }
}

/// Converts an array of `{id, ..}` records into an object keyed by id.
fn keyed_by_id(entity: &mut Map<String, Value>, key: &str) -> bool {
    match entity.get_mut(key) {
        Some(Value::Array(items)) => {
            let mut keyed = Map::new();
            for item in items.drain(..) {
                let id = item.get("id").and_then(Value::as_str).map(str::to_string);
                if let Some(id) = id {
                    keyed.insert(id, item);
                }
            }
            entity.insert(key.to_string(), Value::Object(keyed));
            true
        }
        None | Some(Value::Null) => {
            entity.insert(key.to_string(), Value::Object(Map::new()));
            true
        }
        _ => false,
    }
}

fn legacy_status(status: &str) -> Option<&'static str> {
    match status {
        "pending" => Some("todo"),
        "inprogress" | "in-progress" | "active" => Some("in_progress"),
        "review" => Some("reviewing"),
        "done" | "complete" => Some("completed"),
        "skipped" => Some("skip"),
        "failed" => Some("error"),
        _ => None,
    }
}
