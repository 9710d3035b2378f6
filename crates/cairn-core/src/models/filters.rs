//! Filter types for querying flows.

use super::Flow;

/// Filter options for listing flows.
///
/// The default filter lists every active flow.
#[derive(Debug, Clone, Default)]
pub struct FlowFilter {
    /// Filter by flow name (case-insensitive partial match)
    pub name_contains: Option<String>,

    /// Filter by project tag (exact match)
    pub project: Option<String>,

    /// Include archived flows alongside active ones
    pub include_archived: bool,

    /// Show only archived flows; implies `include_archived`
    pub archived_only: bool,
}

impl FlowFilter {
    /// Filter for the active flows of one project.
    ///
    /// ```rust
    /// use cairn_core::models::FlowFilter;
    ///
    /// let filter = FlowFilter::for_project("website");
    /// assert_eq!(filter.project.as_deref(), Some("website"));
    /// assert!(!filter.include_archived);
    /// ```
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: Some(project.into()),
            ..Default::default()
        }
    }

    /// Filter for archived flows only.
    pub fn archived() -> Self {
        Self {
            include_archived: true,
            archived_only: true,
            ..Default::default()
        }
    }

    /// Whether `flow` passes every criterion of the filter.
    pub fn matches(&self, flow: &Flow) -> bool {
        if self.archived_only && !flow.archived {
            return false;
        }
        if flow.archived && !(self.include_archived || self.archived_only) {
            return false;
        }
        if let Some(project) = &self.project {
            if flow.project.as_deref() != Some(project.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            if !flow.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}
