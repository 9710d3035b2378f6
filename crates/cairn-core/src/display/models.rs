//! Display implementations for domain models.
//!
//! Kept apart from the model definitions. Everything renders markdown with
//! status icons on tasks.

use std::fmt;

use super::datetime::Stamp;
use crate::models::{CascadeRule, Flow, Note, NoteKind, Plan, Statistics, Task, TaskStatus};

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CascadeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CascadeRule::CompletedOnly => "completed",
            CascadeRule::CompletedOrReviewing => "completed or reviewing",
        })
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {} ({})", self.name, self.id)?;
        writeln!(f)?;

        if let Some(project) = &self.project {
            writeln!(f, "- Project: {project}")?;
        }
        if self.archived {
            writeln!(f, "- Archived")?;
        }
        writeln!(f, "- Created: {}", Stamp::new(&self.created_at))?;
        writeln!(f, "- Updated: {}", Stamp::new(&self.updated_at))?;

        if self.plans.is_empty() {
            return writeln!(f, "\nNo plans in this flow.");
        }

        let mut plans: Vec<&Plan> = self.plans.values().collect();
        plans.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        for plan in plans {
            writeln!(f)?;
            plan.fmt_plan(f, "##")?;
        }
        Ok(())
    }
}

impl Plan {
    /// Renders the plan with `heading` as its markdown level; tasks go one
    /// level deeper.
    fn fmt_plan(&self, f: &mut fmt::Formatter<'_>, heading: &str) -> fmt::Result {
        let done = self
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let marker = if self.completed { " ✓" } else { "" };
        writeln!(
            f,
            "{heading} {} ({}/{}){marker}",
            self.name,
            done,
            self.tasks.len()
        )?;
        writeln!(f)?;
        writeln!(f, "- ID: {}", self.id)?;
        if let Some(at) = &self.completed_at {
            writeln!(f, "- Completed: {}", Stamp::new(at))?;
        }
        for (key, value) in &self.metadata {
            writeln!(f, "- {key}: {value}")?;
        }

        if self.tasks.is_empty() {
            return writeln!(f, "\nNo tasks in this plan.");
        }
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let task_heading = format!("{heading}#");
        for task in tasks {
            writeln!(f)?;
            task.fmt_task(f, &task_heading)?;
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_plan(f, "#")
    }
}

impl Task {
    fn fmt_task(&self, f: &mut fmt::Formatter<'_>, heading: &str) -> fmt::Result {
        writeln!(f, "{heading} {} ({})", self.name, self.status.with_icon())?;
        writeln!(f)?;
        writeln!(f, "- ID: {}", self.id)?;
        if let Some(at) = &self.started_at {
            writeln!(f, "- Started: {}", Stamp::new(at))?;
        }
        if let Some(at) = &self.completed_at {
            writeln!(f, "- Completed: {}", Stamp::new(at))?;
        }
        for (key, value) in &self.context {
            writeln!(f, "- {key}: {value}")?;
        }

        let notes: Vec<&Note> = self
            .notes
            .iter()
            .filter(|n| n.kind == NoteKind::Note)
            .collect();
        if !notes.is_empty() {
            writeln!(f)?;
            for note in notes {
                writeln!(f, "> {note}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_task(f, "###")
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", Stamp::minute(&self.at), self.text)
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- **Flows**: {}", self.flows)?;
        writeln!(f, "- **Plans**: {}", self.plans)?;
        writeln!(
            f,
            "- **Tasks**: {} ({} completed, {:.0}%)",
            self.tasks,
            self.completed_tasks,
            self.completion_rate * 100.0
        )?;
        for (status, count) in &self.tasks_by_status {
            writeln!(f, "  - {}: {count}", status.with_icon())?;
        }
        Ok(())
    }
}
