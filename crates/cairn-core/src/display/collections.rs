//! Collection wrapper types for displaying groups of flows.

use std::fmt;

use super::datetime::Stamp;
use crate::models::{Flow, TaskStatus};

/// Newtype wrapper for displaying a flow listing as compact summaries.
pub struct FlowSummaries(pub Vec<Flow>);

impl FlowSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FlowSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No flows found.");
        }

        for flow in &self.0 {
            let tasks = flow.task_count();
            let done = flow
                .plans
                .values()
                .flat_map(|p| p.tasks.values())
                .filter(|t| t.status == TaskStatus::Completed)
                .count();
            let progress = if tasks > 0 {
                format!(" ({done}/{tasks})")
            } else {
                String::new()
            };
            let archived = if flow.archived { " [archived]" } else { "" };

            writeln!(f, "## {} (ID: {}){progress}{archived}", flow.name, flow.id)?;
            writeln!(f)?;
            if let Some(project) = &flow.project {
                writeln!(f, "- **Project**: {project}")?;
            }
            writeln!(f, "- **Plans**: {}", flow.plans.len())?;
            writeln!(f, "- **Updated**: {}", Stamp::day(&flow.updated_at))?;
            writeln!(f)?;
        }
        Ok(())
    }
}
