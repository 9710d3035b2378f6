//! Error types for the flow storage engine.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{EntityKind, TaskStatus};

/// Comprehensive error type for all flow store operations.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Requested task status change is not an edge of the state machine
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    /// A referenced flow, plan or task does not exist
    #[error("{kind} with ID {id} not found")]
    UnknownEntity { kind: EntityKind, id: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Serialization/deserialization errors for a stored document
    #[error("Serialization error at path '{path}': {source}")]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// Reserved for a bounded-wait mutation lock; the default lock never raises it
    #[error("Concurrency error: {message}")]
    Concurrency { message: String },
    /// An error annotated with the operation that produced it
    #[error("{operation}: {source}")]
    Context {
        operation: String,
        #[source]
        source: Box<FlowError>,
    },
}

/// Taxonomy tag attached to every failure that crosses the command boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller input was wrong: unknown id, empty field, rejected transition
    Validation,
    /// The requested entity does not exist
    NotFound,
    /// Disk or serialization failure
    Storage,
    /// Lock acquisition failure
    Concurrency,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
            ErrorKind::Concurrency => "concurrency",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> FlowError {
        FlowError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl FlowError {
    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates an unknown-entity error.
    pub fn unknown(kind: EntityKind, id: impl Into<String>) -> Self {
        FlowError::UnknownEntity {
            kind,
            id: id.into(),
        }
    }

    /// Creates a file system error for `path`.
    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FlowError::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Maps the error onto its taxonomy tag, looking through context wrappers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::InvalidInput { .. }
            | FlowError::InvalidTransition { .. }
            | FlowError::UnknownEntity { .. } => ErrorKind::Validation,
            FlowError::FileSystem { .. }
            | FlowError::Serialization { .. }
            | FlowError::XdgDirectory(_)
            | FlowError::Configuration { .. } => ErrorKind::Storage,
            FlowError::Concurrency { .. } => ErrorKind::Concurrency,
            FlowError::Context { source, .. } => source.kind(),
        }
    }

    /// Returns the innermost error, skipping operation context.
    pub fn root(&self) -> &FlowError {
        match self {
            FlowError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Extension trait for attaching operation context to a failed call.
pub trait ResultExt<T> {
    /// Wrap the error with the name of the operation that failed.
    fn context<C>(self, operation: C) -> Result<T>
    where
        C: fmt::Display;

    /// Lazily wrap the error with the name of the operation that failed.
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<C>(self, operation: C) -> Result<T>
    where
        C: fmt::Display,
    {
        self.map_err(|e| FlowError::Context {
            operation: operation.to_string(),
            source: Box::new(e),
        })
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| FlowError::Context {
            operation: f().to_string(),
            source: Box::new(e),
        })
    }
}

/// Result type alias for flow store operations
pub type Result<T> = std::result::Result<T, FlowError>;
