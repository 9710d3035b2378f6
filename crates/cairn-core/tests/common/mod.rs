use std::sync::Arc;

use cairn_core::{FlowService, FlowServiceBuilder, MemorySink};
use tempfile::TempDir;

/// Helper function to create a test service recording its events
pub fn create_test_service() -> (TempDir, FlowService, Arc<MemorySink>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let sink = Arc::new(MemorySink::new());
    let service = FlowServiceBuilder::new()
        .with_storage_root(Some(temp_dir.path()))
        .with_event_sink(sink.clone())
        .build()
        .expect("Failed to create service");
    (temp_dir, service, sink)
}
