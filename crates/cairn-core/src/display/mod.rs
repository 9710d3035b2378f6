//! Display formatting for domain models.
//!
//! Models implement [`std::fmt::Display`] directly and render markdown, so the
//! same text works in a terminal and in a tool response. Collections are
//! wrapped in newtypes that handle the empty case.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Display impls & │    │    Markdown     │
//! │ (Flow, Plan...) │───▶│    wrappers     │───▶│     output      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: Collection wrapper types ([`FlowSummaries`])
//! - [`datetime`]: Date/time formatting utilities
//! - [`models`]: Display implementations for domain models
//!
//! ```rust
//! use cairn_core::{display::FlowSummaries, models::Flow};
//!
//! let flows = FlowSummaries(vec![Flow::new("Release", Some("web".to_string()))]);
//! let output = flows.to_string();
//! assert!(output.contains("## Release"));
//! assert!(output.contains("- **Project**: web"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;

pub use collections::FlowSummaries;
pub use datetime::{Precision, Stamp};
