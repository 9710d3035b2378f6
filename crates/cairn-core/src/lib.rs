//! Core library for the Cairn flow store.
//!
//! A flow groups plans, and a plan groups tasks. Every flow is one JSON
//! document under a storage root, written atomically with a `.backup` copy of
//! the previous version. Reads go through an in-process cache that checks the
//! document's modification time, so edits made by another process are picked
//! up on the next read.
//!
//! # Layers
//!
//! - **Models** ([`models`]): flows, plans, tasks, the task state machine and
//!   the plan completion rule
//! - **Storage** ([`store`]): the file-per-flow repository
//! - **Cache** ([`cache`]): TTL and LRU bounded, validated against file mtimes
//! - **Service** ([`service`]): the only mutator; serializes writes and
//!   derives plan completion
//! - **Commands** ([`commands`]): uniform result envelopes for a dispatcher
//!
//! # Quick Start
//!
//! ```rust
//! use cairn_core::{FlowServiceBuilder, models::TaskStatus};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::tempdir()?;
//! let service = FlowServiceBuilder::new()
//!     .with_storage_root(Some(dir.path()))
//!     .build()?;
//!
//! let flow = service.create_flow("Release", Some("website"))?;
//! let plan = service.create_plan(&flow.id, "Ship it")?;
//! let task = service.create_task(&flow.id, &plan.id, "Write changelog")?;
//!
//! service.update_task_status(&flow.id, &plan.id, &task.id, TaskStatus::InProgress)?;
//! service.update_task_status(&flow.id, &plan.id, &task.id, TaskStatus::Completed)?;
//!
//! // The only task is done, so the plan completed itself.
//! let plan = service.get_plan(&flow.id, &plan.id)?.unwrap();
//! assert!(plan.completed);
//! println!("{plan}");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod cache;
pub mod commands;
pub mod display;
pub mod error;
pub mod events;
pub mod models;
pub mod params;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use cache::{Cache, CacheStatistics};
pub use commands::Envelope;
pub use display::{FlowSummaries, Stamp};
pub use error::{ErrorKind, FlowError, Result, ResultExt};
pub use events::{ActionType, Event, EventSink, MemorySink, NoopSink};
pub use models::{
    CascadeRule, EntityKind, Flow, FlowFilter, Note, NoteKind, Plan, Statistics, Task, TaskStatus,
};
pub use service::{FlowService, FlowServiceBuilder};
pub use store::FlowRepository;
