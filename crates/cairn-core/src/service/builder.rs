//! Builder for creating and configuring FlowService instances.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::info;

use super::FlowService;
use crate::{
    cache::{Cache, DEFAULT_CAPACITY, DEFAULT_TTL},
    error::{FlowError, Result},
    events::{EventSink, NoopSink},
    models::CascadeRule,
    store::FlowRepository,
};

/// Builder for creating and configuring FlowService instances.
#[derive(Clone)]
pub struct FlowServiceBuilder {
    storage_root: Option<PathBuf>,
    cache_capacity: usize,
    cache_ttl: Duration,
    cascade_rule: CascadeRule,
    sink: Option<Arc<dyn EventSink>>,
}

impl FlowServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            storage_root: None,
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl: DEFAULT_TTL,
            cascade_rule: CascadeRule::default(),
            sink: None,
        }
    }

    /// Sets a custom storage root directory.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/cairn/flows` or `~/.local/share/cairn/flows`
    pub fn with_storage_root<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.storage_root = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Maximum number of flows kept in the cache.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// How long a cached flow survives without being read.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Which task statuses count toward automatic plan completion.
    pub fn with_cascade_rule(mut self, rule: CascadeRule) -> Self {
        self.cascade_rule = rule;
        self
    }

    /// Receiver of mutation notifications; defaults to a no-op sink.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the configured service.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::Configuration` for a zero cache capacity or TTL
    /// Returns `FlowError::XdgDirectory` if the default root cannot be placed
    /// Returns `FlowError::FileSystem` if the storage root cannot be created
    pub fn build(self) -> Result<FlowService> {
        if self.cache_capacity == 0 {
            return Err(FlowError::Configuration {
                message: "cache capacity must be at least 1".to_string(),
            });
        }
        if self.cache_ttl.is_zero() {
            return Err(FlowError::Configuration {
                message: "cache TTL must be positive".to_string(),
            });
        }

        let root = match self.storage_root {
            Some(path) => path,
            None => Self::default_storage_root()?,
        };
        let repository = FlowRepository::new(&root)?;
        info!(
            "Opened flow storage at '{}' (cache {} entries, ttl {:?}, cascade on {})",
            root.display(),
            self.cache_capacity,
            self.cache_ttl,
            self.cascade_rule
        );

        Ok(FlowService::new(
            repository,
            Cache::new(self.cache_capacity, self.cache_ttl),
            self.cascade_rule,
            self.sink.unwrap_or_else(|| Arc::new(NoopSink)),
        ))
    }

    /// Returns the default storage root following XDG Base Directory
    /// specification.
    fn default_storage_root() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("cairn")
            .place_data_file("flows")
            .map_err(|e| FlowError::XdgDirectory(e.to_string()))
    }
}

impl Default for FlowServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FlowServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowServiceBuilder")
            .field("storage_root", &self.storage_root)
            .field("cache_capacity", &self.cache_capacity)
            .field("cache_ttl", &self.cache_ttl)
            .field("cascade_rule", &self.cascade_rule)
            .field("sink", &self.sink.as_ref().map(|_| "EventSink"))
            .finish()
    }
}
