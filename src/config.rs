//! Coordinator configuration

use std::time::Duration;

/// Configuration options for the coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long a viewer waits for a broadcaster before `StreamNotFound`
    pub join_timeout: Duration,

    /// How far past the next expected index the chunk sequencer buffers
    pub reorder_window: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(10),
            reorder_window: 16,
        }
    }
}

impl CoordinatorConfig {
    /// Set the viewer join timeout
    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Set the chunk reorder window
    pub fn reorder_window(mut self, window: u64) -> Self {
        self.reorder_window = window;
        self
    }
}
